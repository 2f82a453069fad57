pub mod record;

pub use record::{Fund, FundSet, Origin, OriginFilter, PaymentRecord, RecordDraft};

// Re-export chrono so consumers can build dates without a direct dependency.
pub use chrono;
