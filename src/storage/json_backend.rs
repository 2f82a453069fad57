use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    domain::{Origin, OriginFilter, PaymentRecord},
    errors::{PaymentsError, Result},
    utils::paths::{app_data_dir, store_file_in, write_atomic},
};

use super::{PaymentStore, RecordIndex};

pub const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    schema_version: u32,
    #[serde(default)]
    records: Vec<PaymentRecord>,
    #[serde(default)]
    meta: BTreeMap<String, String>,
}

/// File-backed store. The whole index lives in memory and every effective mutation is
/// flushed as a full snapshot through a staging file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    index: Mutex<RecordIndex>,
}

impl JsonStore {
    /// Opens (or lazily creates) the snapshot at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let index = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let snapshot: StoreSnapshot = serde_json::from_str(&data)?;
            if snapshot.schema_version > STORE_SCHEMA_VERSION {
                return Err(PaymentsError::StorageError(format!(
                    "payment store `{}` uses schema {} but this build reads up to {}",
                    path.display(),
                    snapshot.schema_version,
                    STORE_SCHEMA_VERSION
                )));
            }
            RecordIndex::from_parts(snapshot.records, snapshot.meta)
        } else {
            RecordIndex::default()
        };
        info!(path = %path.display(), records = index.len(), "opened payment store");
        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    /// Store under the application data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(store_file_in(&app_data_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, RecordIndex>> {
        Ok(self.index.lock()?)
    }

    fn persist(&self, index: &RecordIndex) -> Result<()> {
        let snapshot = StoreSnapshot {
            schema_version: STORE_SCHEMA_VERSION,
            records: index.records().cloned().collect(),
            meta: index.meta().clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), records = snapshot.records.len(), "snapshot written");
        Ok(())
    }
}

impl PaymentStore for JsonStore {
    fn add_many(&self, records: Vec<PaymentRecord>) -> Result<usize> {
        for record in &records {
            record.validate_storable()?;
        }
        let mut index = self.lock()?;
        let mut inserted = 0;
        for record in records {
            if index.try_insert(record)? {
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.persist(&index)?;
        }
        Ok(inserted)
    }

    fn get_day(&self, date: NaiveDate, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        Ok(self.lock()?.day(date, filter))
    }

    fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: &OriginFilter,
    ) -> Result<Vec<PaymentRecord>> {
        Ok(self.lock()?.range(start, end, filter))
    }

    fn has_day(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.lock()?.has_day(date))
    }

    fn delete_day(&self, date: NaiveDate, origin: Option<Origin>) -> Result<usize> {
        let mut index = self.lock()?;
        let removed = index.delete_day(date, origin);
        if removed > 0 {
            self.persist(&index)?;
        }
        Ok(removed)
    }

    fn delete_all(&self, include_heuristic: bool) -> Result<usize> {
        let mut index = self.lock()?;
        let removed = index.delete_all(include_heuristic);
        if removed > 0 {
            self.persist(&index)?;
        }
        Ok(removed)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn all_records(&self, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        Ok(self
            .lock()?
            .records()
            .filter(|r| filter.matches(r.origin))
            .cloned()
            .collect())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get_meta(key))
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let mut index = self.lock()?;
        if index.set_meta(key, value) {
            self.persist(&index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Fund;
    use tempfile::tempdir;

    fn record(d: u32, origin: Origin) -> PaymentRecord {
        PaymentRecord::new(
            NaiveDate::from_ymd_opt(2025, 11, d).unwrap(),
            "Pago",
            Fund::Feader,
            "Convocatoria",
            "tabla.csv",
            origin,
        )
    }

    #[test]
    fn records_and_markers_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pagos.json");
        {
            let store = JsonStore::open(&path).unwrap();
            assert_eq!(store.add_many(vec![record(3, Origin::Manual), record(4, Origin::Web)]).unwrap(), 2);
            store.set_meta("autoload_tabla_2025", "ok").unwrap();
        }
        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get_meta("autoload_tabla_2025").unwrap().as_deref(), Some("ok"));
        assert!(!store.add(record(3, Origin::Manual)).unwrap());
    }

    #[test]
    fn missing_file_is_not_created_until_first_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pagos.json");
        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.delete_all(true).unwrap(), 0);
        assert!(!path.exists());
        store.add(record(3, Origin::Manual)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pagos.json");
        fs::write(&path, r#"{"schema_version": 99, "records": [], "meta": {}}"#).unwrap();
        let err = JsonStore::open(&path).unwrap_err();
        assert!(matches!(err, PaymentsError::StorageError(ref m) if m.contains("schema 99")));
    }

    #[test]
    fn info_records_are_refused() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("pagos.json")).unwrap();
        let err = store.add(record(3, Origin::Info)).unwrap_err();
        assert!(matches!(err, PaymentsError::InvalidInput(_)));
        assert_eq!(store.count().unwrap(), 0);
    }
}
