//! Turning notes, PDFs, spreadsheets and web pages into stored payment records.

pub mod classifier;
pub mod parser;
pub mod pipeline;
pub mod sources;
pub mod table;
pub mod worker;

pub use classifier::{FundClassifier, FundMatch, KeywordClassifier, MentionShape};
pub use parser::{ParsedLine, PatternRule, SpanishDateRangeParser};
pub use pipeline::{IngestReport, IngestionPipeline, TableLayout, TextDocument};
pub use sources::{
    default_extractor, default_fetcher, default_web_sources, DocumentFetcher, PdfTextExtractor,
    UnavailableExtractor, UnavailableFetcher, WebSource, WebSourceKind,
};
pub use table::Table;
pub use worker::{spawn_ingestion, IngestHandle, IngestJob};
