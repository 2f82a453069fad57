pub mod build_info;
pub mod paths;

use std::sync::Once;

use tracing_subscriber::filter::Directive;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "pepac_core=info";

/// Installs the global fmt subscriber once. `RUST_LOG` adds to the crate default.
/// Returns `true` only for the call that performed the installation.
pub fn init_tracing() -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = DEFAULT_DIRECTIVE.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        // Another subscriber may already be installed by an embedding binary or test harness.
        let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
        installed = true;
    });
    installed
}
