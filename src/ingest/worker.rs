//! Off-thread ingestion. Each job runs on its own named thread and reports back over a
//! channel; the caller chooses when to block on or poll the outcome.

use std::{
    path::PathBuf,
    sync::{
        mpsc::{channel, Receiver, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
};

use tracing::{info, warn};

use crate::domain::Origin;
use crate::errors::{PaymentsError, Result};

use super::pipeline::{IngestReport, IngestionPipeline, TextDocument};
use super::sources::WebSource;

/// A user-triggered ingestion action.
#[derive(Debug, Clone)]
pub enum IngestJob {
    CsvFile {
        path: PathBuf,
        year: i32,
        origin: Origin,
    },
    PdfFolder {
        folder: PathBuf,
        default_year: i32,
        origin: Origin,
    },
    Web {
        sources: Vec<WebSource>,
        default_year: i32,
    },
    Text {
        name: String,
        text: String,
        origin: Origin,
        default_year: i32,
    },
}

impl IngestJob {
    pub fn label(&self) -> &'static str {
        match self {
            IngestJob::CsvFile { .. } => "csv",
            IngestJob::PdfFolder { .. } => "pdf",
            IngestJob::Web { .. } => "web",
            IngestJob::Text { .. } => "text",
        }
    }
}

impl IngestionPipeline {
    /// Runs `job` on the current thread.
    pub fn run(&self, job: &IngestJob) -> Result<IngestReport> {
        match job {
            IngestJob::CsvFile { path, year, origin } => self.ingest_csv_file(path, *year, *origin),
            IngestJob::PdfFolder {
                folder,
                default_year,
                origin,
            } => self.ingest_pdf_folder(folder, *default_year, *origin),
            IngestJob::Web {
                sources,
                default_year,
            } => self.ingest_web(sources, *default_year),
            IngestJob::Text {
                name,
                text,
                origin,
                default_year,
            } => self.ingest_text(
                TextDocument {
                    name,
                    reference: name,
                    text,
                },
                *origin,
                *default_year,
            ),
        }
    }
}

pub struct IngestHandle {
    receiver: Receiver<Result<IngestReport>>,
    thread: Option<JoinHandle<()>>,
}

impl IngestHandle {
    /// Blocks until the worker reports.
    pub fn wait(mut self) -> Result<IngestReport> {
        let outcome = self.receiver.recv().unwrap_or_else(|_| Err(worker_lost()));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        outcome
    }

    /// Non-blocking poll; `None` while the job is still running.
    pub fn try_outcome(&self) -> Option<Result<IngestReport>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }
}

/// Starts `job` on a dedicated thread sharing `pipeline` (and therefore its store).
pub fn spawn_ingestion(pipeline: Arc<IngestionPipeline>, job: IngestJob) -> Result<IngestHandle> {
    let (sender, receiver) = channel();
    let label = job.label();
    let thread = thread::Builder::new()
        .name(format!("pepac-ingest-{label}"))
        .spawn(move || {
            let outcome = pipeline.run(&job);
            match &outcome {
                Ok(report) => info!(
                    job = label,
                    inserted = report.inserted,
                    skipped = report.skipped,
                    failed_sources = report.failed_sources,
                    "ingestion finished"
                ),
                Err(err) => warn!(job = label, error = %err, "ingestion failed"),
            }
            // The caller may have dropped its handle; nothing left to notify then.
            let _ = sender.send(outcome);
        })?;
    Ok(IngestHandle {
        receiver,
        thread: Some(thread),
    })
}

fn worker_lost() -> PaymentsError {
    PaymentsError::StorageError("ingestion worker stopped without reporting".into())
}
