//! External producers: document fetching, PDF text extraction and the web source catalogue.
//!
//! Both capabilities are optional at build time. Callers ask `is_available` first and get
//! [`PaymentsError::Unavailable`] instead of a late failure.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PaymentsError, Result};

pub const FEGA_NEWS_URL: &str = "https://www.fega.gob.es/es/noticias";
const FEGA_DOCUMENTS: &str = "https://www.fega.gob.es/sites/default/files/files/document";

pub trait DocumentFetcher: Send + Sync {
    fn is_available(&self) -> bool;
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub trait PdfTextExtractor: Send + Sync {
    fn is_available(&self) -> bool;
    fn extract_text(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebSourceKind {
    /// Payment note announcing the advance window.
    AnticipoNote,
    /// Payment note announcing the balance window.
    SaldoNote,
    /// FEGA news listing; links about payments map to the campaign windows.
    NewsIndex,
    /// Any HTML page whose links name a fund.
    GenericHtml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSource {
    pub label: String,
    pub url: String,
    pub kind: WebSourceKind,
}

impl WebSource {
    pub fn new(label: impl Into<String>, url: impl Into<String>, kind: WebSourceKind) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            kind,
        }
    }
}

pub fn default_web_sources() -> Vec<WebSource> {
    vec![
        WebSource::new(
            "Anticipo ecorregímenes",
            format!("{FEGA_DOCUMENTS}/Nota_web_Ecorregimenes_Ca_2024_ANTICIPO.pdf"),
            WebSourceKind::AnticipoNote,
        ),
        WebSource::new(
            "Anticipo ayudas asociadas",
            format!("{FEGA_DOCUMENTS}/Nota_Web_AAS_Ca_2024_ANTICIPO.pdf"),
            WebSourceKind::AnticipoNote,
        ),
        WebSource::new(
            "Saldo ecorregímenes (EERR)",
            format!("{FEGA_DOCUMENTS}/241115_NOTA_WEB_EERR_PRIMER_SALDO_Ca_2024_def.pdf"),
            WebSourceKind::SaldoNote,
        ),
        WebSource::new("Noticias FEGA", FEGA_NEWS_URL, WebSourceKind::NewsIndex),
    ]
}

/// Stand-in used when the crate is built without the `http` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableFetcher;

impl DocumentFetcher for UnavailableFetcher {
    fn is_available(&self) -> bool {
        false
    }

    fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        Err(PaymentsError::Unavailable("HTTP".into()))
    }
}

/// Stand-in used when the crate is built without the `pdf` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableExtractor;

impl PdfTextExtractor for UnavailableExtractor {
    fn is_available(&self) -> bool {
        false
    }

    fn extract_text(&self, _path: &Path) -> Result<String> {
        Err(PaymentsError::Unavailable("PDF".into()))
    }
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use tracing::debug;

    use super::DocumentFetcher;
    use crate::errors::{PaymentsError, Result};

    /// Blocking reqwest client with a per-request timeout.
    pub struct HttpFetcher {
        client: reqwest::blocking::Client,
    }

    impl HttpFetcher {
        pub fn new(timeout_secs: u64) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| PaymentsError::ConfigError(format!("http client: {e}")))?;
            Ok(Self { client })
        }
    }

    impl DocumentFetcher for HttpFetcher {
        fn is_available(&self) -> bool {
            true
        }

        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            let failed = |reason: String| PaymentsError::SourceFailed {
                source_name: url.to_string(),
                reason,
            };
            let response = self.client.get(url).send().map_err(|e| failed(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(failed(format!("HTTP {status}")));
            }
            let body = response.bytes().map_err(|e| failed(e.to_string()))?;
            debug!(url, bytes = body.len(), "fetched document");
            Ok(body.to_vec())
        }
    }
}

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractText;

#[cfg(feature = "pdf")]
mod pdf {
    use std::path::Path;

    use super::PdfTextExtractor;
    use crate::errors::{PaymentsError, Result};

    /// Text layer extraction through `pdf-extract`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfExtractText;

    impl PdfTextExtractor for PdfExtractText {
        fn is_available(&self) -> bool {
            true
        }

        fn extract_text(&self, path: &Path) -> Result<String> {
            pdf_extract::extract_text(path).map_err(|e| PaymentsError::SourceFailed {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Fetcher for this build: reqwest when compiled with `http`, otherwise unavailable.
pub fn default_fetcher(timeout_secs: u64) -> Result<Box<dyn DocumentFetcher>> {
    #[cfg(feature = "http")]
    {
        Ok(Box::new(HttpFetcher::new(timeout_secs)?))
    }
    #[cfg(not(feature = "http"))]
    {
        let _ = timeout_secs;
        Ok(Box::new(UnavailableFetcher))
    }
}

pub fn default_extractor() -> Box<dyn PdfTextExtractor> {
    #[cfg(feature = "pdf")]
    {
        Box::new(PdfExtractText)
    }
    #[cfg(not(feature = "pdf"))]
    {
        Box::new(UnavailableExtractor)
    }
}
