//! Payment records and the provenance tags attached to them.

use std::{collections::BTreeSet, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{PaymentsError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Subsidy program a record belongs to.
pub enum Fund {
    #[serde(rename = "FEAGA")]
    Feaga,
    #[serde(rename = "FEADER")]
    Feader,
    #[serde(rename = "—")]
    Unknown,
}

impl Fund {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fund::Feaga => "FEAGA",
            Fund::Feader => "FEADER",
            Fund::Unknown => "—",
        }
    }

    /// Lenient mapping used by importers: `"fega"`/`"feaga"` and `"feader"` anywhere in the
    /// label pick the fund, anything else is unknown.
    pub fn from_label(label: &str) -> Fund {
        let upper = label.trim().to_uppercase();
        if upper.contains("FEADER") {
            Fund::Feader
        } else if upper.contains("FEAGA") || upper.contains("FEGA") {
            Fund::Feaga
        } else {
            Fund::Unknown
        }
    }
}

impl fmt::Display for Fund {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
/// Where a record came from.
pub enum Origin {
    Manual,
    Web,
    Heuristic,
    /// Synthesized for display; never stored.
    Info,
}

impl Origin {
    pub const STORABLE: [Origin; 3] = [Origin::Manual, Origin::Web, Origin::Heuristic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Web => "web",
            Origin::Heuristic => "heuristic",
            Origin::Info => "info",
        }
    }

    /// Manual and web rows carry real data; heuristic and info rows are rule-derived.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Origin::Manual | Origin::Web)
    }

    pub fn parse(raw: &str) -> Result<Origin> {
        match raw.trim().to_lowercase().as_str() {
            "manual" => Ok(Origin::Manual),
            "web" => Ok(Origin::Web),
            "heuristic" | "heuristica" | "heurística" => Ok(Origin::Heuristic),
            "info" => Ok(Origin::Info),
            other => Err(PaymentsError::InvalidInput(format!(
                "unknown origin `{other}`"
            ))),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restricts queries to a set of origins. An unrestricted filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginFilter {
    allowed: Option<BTreeSet<Origin>>,
}

impl OriginFilter {
    pub fn any() -> Self {
        Self { allowed: None }
    }

    /// Restricts to exactly `origins`; an empty iterator yields an unrestricted filter.
    pub fn only<I: IntoIterator<Item = Origin>>(origins: I) -> Self {
        let set: BTreeSet<Origin> = origins.into_iter().collect();
        if set.is_empty() {
            Self::any()
        } else {
            Self { allowed: Some(set) }
        }
    }

    /// Builds the filter from a presentation-layer selection. Nothing selected means all
    /// three storable origins.
    pub fn from_selection<I: IntoIterator<Item = Origin>>(selection: I) -> Self {
        let set: BTreeSet<Origin> = selection
            .into_iter()
            .filter(|origin| *origin != Origin::Info)
            .collect();
        if set.is_empty() {
            Self::only(Origin::STORABLE)
        } else {
            Self { allowed: Some(set) }
        }
    }

    pub fn matches(&self, origin: Origin) -> bool {
        match &self.allowed {
            Some(set) => set.contains(&origin),
            None => true,
        }
    }

    pub fn origins(&self) -> Option<&BTreeSet<Origin>> {
        self.allowed.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// A dated payment entry. The identity of a record is
/// `(date, kind, fund, detail, origin)`; `source` is informational only.
pub struct PaymentRecord {
    pub date: NaiveDate,
    pub kind: String,
    pub fund: Fund,
    pub detail: String,
    #[serde(default)]
    pub source: String,
    pub origin: Origin,
}

impl PaymentRecord {
    pub fn new(
        date: NaiveDate,
        kind: impl Into<String>,
        fund: Fund,
        detail: impl Into<String>,
        source: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            date,
            kind: kind.into().trim().to_string(),
            fund,
            detail: detail.into().trim().to_string(),
            source: source.into().trim().to_string(),
            origin,
        }
    }

    pub fn same_identity(&self, other: &PaymentRecord) -> bool {
        self.date == other.date
            && self.origin == other.origin
            && self.fund == other.fund
            && self.kind == other.kind
            && self.detail == other.detail
    }

    /// Triple used to collapse entries that would render identically.
    pub fn display_key(&self) -> (String, Fund, String) {
        (self.kind.clone(), self.fund, self.detail.clone())
    }

    /// Checks the constraints a record must satisfy before it can be stored.
    pub fn validate_storable(&self) -> Result<()> {
        if self.origin == Origin::Info {
            return Err(PaymentsError::InvalidInput(
                "info records are synthesized for display and cannot be stored".into(),
            ));
        }
        if self.kind.is_empty() {
            return Err(PaymentsError::InvalidInput("record kind is empty".into()));
        }
        if self.detail.is_empty() {
            return Err(PaymentsError::InvalidInput("record detail is empty".into()));
        }
        Ok(())
    }
}

/// Everything in a record except its date, used to stamp the same entry over a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub kind: String,
    pub fund: Fund,
    pub detail: String,
    pub source: String,
    pub origin: Origin,
}

impl RecordDraft {
    pub fn new(
        kind: impl Into<String>,
        fund: Fund,
        detail: impl Into<String>,
        source: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            kind: kind.into(),
            fund,
            detail: detail.into(),
            source: source.into(),
            origin,
        }
    }

    pub fn at(&self, date: NaiveDate) -> PaymentRecord {
        PaymentRecord::new(
            date,
            self.kind.clone(),
            self.fund,
            self.detail.clone(),
            self.source.clone(),
            self.origin,
        )
    }
}

/// Fund membership as declared by a spreadsheet row or a classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundSet {
    pub feaga: bool,
    pub feader: bool,
}

impl FundSet {
    pub fn new(feaga: bool, feader: bool) -> Self {
        Self { feaga, feader }
    }

    pub fn is_empty(&self) -> bool {
        !self.feaga && !self.feader
    }

    pub fn funds(&self) -> Vec<Fund> {
        let mut out = Vec::with_capacity(2);
        if self.feaga {
            out.push(Fund::Feaga);
        }
        if self.feader {
            out.push(Fund::Feader);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fund_labels_are_mapped_leniently() {
        assert_eq!(Fund::from_label("Ayuda FEADER"), Fund::Feader);
        assert_eq!(Fund::from_label("fega"), Fund::Feaga);
        assert_eq!(Fund::from_label("feaga "), Fund::Feaga);
        assert_eq!(Fund::from_label("nan"), Fund::Unknown);
        assert_eq!(Fund::Unknown.to_string(), "—");
    }

    #[test]
    fn empty_selection_means_all_storable_origins() {
        let filter = OriginFilter::from_selection(Vec::new());
        assert!(filter.matches(Origin::Manual));
        assert!(filter.matches(Origin::Web));
        assert!(filter.matches(Origin::Heuristic));
        assert!(!filter.matches(Origin::Info));

        let narrow = OriginFilter::from_selection([Origin::Manual]);
        assert!(narrow.matches(Origin::Manual));
        assert!(!narrow.matches(Origin::Heuristic));
    }

    #[test]
    fn identity_ignores_source() {
        let a = PaymentRecord::new(day(2025, 5, 3), "Pago", Fund::Feaga, "x", "a.pdf", Origin::Web);
        let b = PaymentRecord::new(day(2025, 5, 3), "Pago ", Fund::Feaga, "x", "b.pdf", Origin::Web);
        assert!(a.same_identity(&b));
        let c = PaymentRecord::new(day(2025, 5, 3), "Pago", Fund::Feaga, "x", "a.pdf", Origin::Manual);
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn info_and_blank_records_are_not_storable() {
        let info = PaymentRecord::new(day(2025, 1, 1), "k", Fund::Feaga, "d", "", Origin::Info);
        assert!(info.validate_storable().is_err());
        let blank = PaymentRecord::new(day(2025, 1, 1), "  ", Fund::Feaga, "d", "", Origin::Manual);
        assert!(blank.validate_storable().is_err());
    }

    #[test]
    fn origins_serialize_lowercase() {
        let json = serde_json::to_string(&Origin::Heuristic).unwrap();
        assert_eq!(json, "\"heuristic\"");
        let fund: Fund = serde_json::from_str("\"—\"").unwrap();
        assert_eq!(fund, Fund::Unknown);
    }
}
