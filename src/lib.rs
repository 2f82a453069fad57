#![doc(test(attr(deny(warnings))))]

//! PEPAC core resolves which FEAGA/FEADER subsidy payments apply to a calendar day,
//! combining stored records, campaign payment windows and month-level references, and
//! ingests new records from spreadsheets, PDF notes and FEGA web pages.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod ingest;
pub mod storage;
pub mod utils;

pub use config::{Config, ConfigManager};
pub use crate::core::{CampaignCalendar, ResolutionEngine};
pub use domain::{Fund, Origin, OriginFilter, PaymentRecord, RecordDraft};
pub use errors::{PaymentsError, Result};
pub use ingest::{IngestReport, IngestionPipeline};
pub use storage::{JsonStore, MemoryStore, PaymentStore};

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    if utils::init_tracing() {
        tracing::info!("PEPAC core tracing initialized.");
    }
}
