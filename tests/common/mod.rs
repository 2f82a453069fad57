#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use once_cell::sync::Lazy;
use pepac_core::{
    domain::chrono::NaiveDate,
    errors::{PaymentsError, Result},
    ingest::{DocumentFetcher, PdfTextExtractor},
    ConfigManager, IngestionPipeline, JsonStore, MemoryStore, ResolutionEngine,
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// File-backed store and config manager sharing one isolated directory.
pub fn setup_test_env() -> (Arc<JsonStore>, ConfigManager) {
    let base = temp_dir();
    let config = ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    let store = JsonStore::open(config.store_path()).expect("open json store");
    (Arc::new(store), config)
}

pub fn memory_engine() -> (Arc<MemoryStore>, ResolutionEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = ResolutionEngine::new(store.clone());
    (store, engine)
}

pub fn memory_pipeline() -> (Arc<MemoryStore>, IngestionPipeline) {
    let store = Arc::new(MemoryStore::new());
    let pipeline = IngestionPipeline::new(store.clone());
    (store, pipeline)
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

/// Serves canned bodies by URL; unknown URLs fail like an unreachable host.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, Vec<u8>>,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }
}

impl DocumentFetcher for StubFetcher {
    fn is_available(&self) -> bool {
        true
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| PaymentsError::SourceFailed {
                source_name: url.to_string(),
                reason: "connection refused".into(),
            })
    }
}

/// Returns canned text by file name; unknown files are unreadable.
#[derive(Default)]
pub struct StubExtractor {
    texts: HashMap<String, String>,
}

impl StubExtractor {
    pub fn with_text(mut self, file_name: &str, text: &str) -> Self {
        self.texts.insert(file_name.to_string(), text.to_string());
        self
    }
}

impl PdfTextExtractor for StubExtractor {
    fn is_available(&self) -> bool {
        true
    }

    fn extract_text(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.texts
            .get(name)
            .cloned()
            .ok_or_else(|| PaymentsError::SourceFailed {
                source_name: name.to_string(),
                reason: "no text layer".into(),
            })
    }
}
