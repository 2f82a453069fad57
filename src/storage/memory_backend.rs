use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Origin, OriginFilter, PaymentRecord};
use crate::errors::Result;

use super::{PaymentStore, RecordIndex};

/// Volatile store; the default substrate for tests and one-shot resolution.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: Mutex<RecordIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for MemoryStore {
    fn add_many(&self, records: Vec<PaymentRecord>) -> Result<usize> {
        for record in &records {
            record.validate_storable()?;
        }
        let mut index = self.index.lock()?;
        let mut inserted = 0;
        for record in records {
            if index.try_insert(record)? {
                inserted += 1;
            }
        }
        debug!(inserted, "memory store insert");
        Ok(inserted)
    }

    fn get_day(&self, date: NaiveDate, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        Ok(self.index.lock()?.day(date, filter))
    }

    fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: &OriginFilter,
    ) -> Result<Vec<PaymentRecord>> {
        Ok(self.index.lock()?.range(start, end, filter))
    }

    fn has_day(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.index.lock()?.has_day(date))
    }

    fn delete_day(&self, date: NaiveDate, origin: Option<Origin>) -> Result<usize> {
        Ok(self.index.lock()?.delete_day(date, origin))
    }

    fn delete_all(&self, include_heuristic: bool) -> Result<usize> {
        Ok(self.index.lock()?.delete_all(include_heuristic))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.index.lock()?.len())
    }

    fn all_records(&self, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        let index = self.index.lock()?;
        Ok(index
            .records()
            .filter(|r| filter.matches(r.origin))
            .cloned()
            .collect())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        Ok(self.index.lock()?.get_meta(key))
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.index.lock()?.set_meta(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fund, RecordDraft};
    use std::sync::Arc;
    use std::thread;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_range_inserts_one_row_per_day() {
        let store = MemoryStore::new();
        let draft = RecordDraft::new("Pago", Fund::Feader, "Ayuda", "tabla.csv", Origin::Manual);
        let inserted = store
            .add_range(day(2025, 5, 3), day(2025, 5, 15), &draft)
            .expect("add range");
        assert_eq!(inserted, 13);
        assert_eq!(
            store.add_range(day(2025, 5, 3), day(2025, 5, 15), &draft).unwrap(),
            0
        );
        assert_eq!(store.count().unwrap(), 13);
    }

    #[test]
    fn concurrent_writers_never_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let draft = RecordDraft::new("Pago", Fund::Feaga, "Ventana", "", Origin::Web);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let draft = draft.clone();
                thread::spawn(move || {
                    store
                        .add_range(day(2025, 10, 1), day(2025, 10, 31), &draft)
                        .unwrap()
                })
            })
            .collect();
        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 31);
        assert_eq!(store.count().unwrap(), 31);
    }

    #[test]
    fn meta_markers_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_meta("autoload_tabla_2025").unwrap(), None);
        store.set_meta("autoload_tabla_2025", "ok").unwrap();
        assert_eq!(
            store.get_meta("autoload_tabla_2025").unwrap().as_deref(),
            Some("ok")
        );
    }
}
