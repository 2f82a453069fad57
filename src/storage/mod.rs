//! Layered payment-record store.
//!
//! Backends share [`RecordIndex`], an ordered in-memory index, and guard it with a single
//! mutex so every mutation is serialized across ingestion workers and user edits.

pub mod csv_export;
pub mod json_backend;
pub mod memory_backend;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::core::utils::{daterange, month_bounds};
use crate::domain::{Origin, OriginFilter, PaymentRecord, RecordDraft};
use crate::errors::Result;

pub use json_backend::JsonStore;
pub use memory_backend::MemoryStore;

/// Abstraction over persistence substrates holding payment records and metadata markers.
pub trait PaymentStore: Send + Sync {
    /// Inserts every record whose identity is not stored yet. Returns how many were new.
    fn add_many(&self, records: Vec<PaymentRecord>) -> Result<usize>;
    fn get_day(&self, date: NaiveDate, filter: &OriginFilter) -> Result<Vec<PaymentRecord>>;
    fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: &OriginFilter,
    ) -> Result<Vec<PaymentRecord>>;
    fn has_day(&self, date: NaiveDate) -> Result<bool>;
    /// Deletes the day's rows of `origin`, or of every origin when `None`.
    fn delete_day(&self, date: NaiveDate, origin: Option<Origin>) -> Result<usize>;
    /// Wipes all rows, or everything except heuristic rows.
    fn delete_all(&self, include_heuristic: bool) -> Result<usize>;
    fn count(&self) -> Result<usize>;
    fn all_records(&self, filter: &OriginFilter) -> Result<Vec<PaymentRecord>>;
    fn get_meta(&self, key: &str) -> Result<Option<String>>;
    fn set_meta(&self, key: &str, value: &str) -> Result<()>;

    /// Idempotent insert; `Ok(false)` when the record was already present.
    fn add(&self, record: PaymentRecord) -> Result<bool> {
        Ok(self.add_many(vec![record])? == 1)
    }

    /// Stamps `draft` on every day of `[start, end]`; a reversed range inserts nothing.
    fn add_range(&self, start: NaiveDate, end: NaiveDate, draft: &RecordDraft) -> Result<usize> {
        let records: Vec<PaymentRecord> = daterange(start, end).map(|day| draft.at(day)).collect();
        if records.is_empty() {
            return Ok(0);
        }
        self.add_many(records)
    }

    fn get_month(&self, year: i32, month: u32, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        match month_bounds(year, month) {
            Some((first, last)) => self.get_range(first, last, filter),
            None => Ok(Vec::new()),
        }
    }
}

/// Ordered index of records plus the metadata map used for idempotency markers.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    by_date: BTreeMap<NaiveDate, Vec<PaymentRecord>>,
    meta: BTreeMap<String, String>,
}

impl RecordIndex {
    pub fn from_parts(records: Vec<PaymentRecord>, meta: BTreeMap<String, String>) -> Self {
        let mut index = Self {
            by_date: BTreeMap::new(),
            meta,
        };
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Validates and inserts; returns `Ok(false)` on an identity collision.
    pub fn try_insert(&mut self, record: PaymentRecord) -> Result<bool> {
        record.validate_storable()?;
        Ok(self.insert(record))
    }

    fn insert(&mut self, record: PaymentRecord) -> bool {
        let day = self.by_date.entry(record.date).or_default();
        if day.iter().any(|existing| existing.same_identity(&record)) {
            return false;
        }
        day.push(record);
        true
    }

    /// Same-day ordering: origin descending by name, then kind ascending. This puts
    /// web/manual rows ahead of heuristic ones.
    pub fn day(&self, date: NaiveDate, filter: &OriginFilter) -> Vec<PaymentRecord> {
        let mut rows: Vec<PaymentRecord> = self
            .by_date
            .get(&date)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.matches(r.origin))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(display_order);
        rows
    }

    pub fn range(&self, start: NaiveDate, end: NaiveDate, filter: &OriginFilter) -> Vec<PaymentRecord> {
        if start > end {
            return Vec::new();
        }
        let mut rows: Vec<PaymentRecord> = self
            .by_date
            .range(start..=end)
            .flat_map(|(_, rows)| rows.iter())
            .filter(|r| filter.matches(r.origin))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| display_order(a, b)));
        rows
    }

    pub fn has_day(&self, date: NaiveDate) -> bool {
        self.by_date.get(&date).is_some_and(|rows| !rows.is_empty())
    }

    pub fn delete_day(&mut self, date: NaiveDate, origin: Option<Origin>) -> usize {
        let Some(rows) = self.by_date.get_mut(&date) else {
            return 0;
        };
        let before = rows.len();
        match origin {
            Some(origin) => rows.retain(|r| r.origin != origin),
            None => rows.clear(),
        }
        let removed = before - rows.len();
        if rows.is_empty() {
            self.by_date.remove(&date);
        }
        removed
    }

    pub fn delete_all(&mut self, include_heuristic: bool) -> usize {
        let before = self.len();
        if include_heuristic {
            self.by_date.clear();
        } else {
            for rows in self.by_date.values_mut() {
                rows.retain(|r| r.origin == Origin::Heuristic);
            }
            self.by_date.retain(|_, rows| !rows.is_empty());
        }
        before - self.len()
    }

    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &PaymentRecord> {
        self.by_date.values().flat_map(|rows| rows.iter())
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn get_meta(&self, key: &str) -> Option<String> {
        self.meta.get(key).cloned()
    }

    /// Returns `true` when the stored value changed.
    pub fn set_meta(&mut self, key: &str, value: &str) -> bool {
        match self.meta.insert(key.to_string(), value.to_string()) {
            Some(previous) => previous != value,
            None => true,
        }
    }
}

fn display_order(a: &PaymentRecord, b: &PaymentRecord) -> std::cmp::Ordering {
    b.origin
        .as_str()
        .cmp(a.origin.as_str())
        .then_with(|| a.kind.cmp(&b.kind))
}
