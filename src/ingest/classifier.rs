//! Fund membership from the words around a date expression.

use crate::core::campaign::{ANTICIPO_KIND, SALDO_KIND};
use crate::core::utils::strip_accents_lower;
use crate::domain::{Fund, FundSet};

pub const RURAL_PAYMENT_KIND: &str = "Pago medidas desarrollo rural";

/// How a date was written; single-day mentions need stronger evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionShape {
    Range,
    Day,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundMatch {
    pub kind: String,
    pub fund: Fund,
}

impl FundMatch {
    pub fn new(kind: impl Into<String>, fund: Fund) -> Self {
        Self {
            kind: kind.into(),
            fund,
        }
    }
}

/// Maps a bounded text window to a payment kind and fund. `None` means the window carries
/// no recognizable payment vocabulary.
pub trait FundClassifier: Send + Sync {
    fn classify(&self, window: &str, shape: MentionShape) -> Option<FundMatch>;

    fn funds(&self, window: &str) -> FundSet {
        match self.classify(window, MentionShape::Range).map(|m| m.fund) {
            Some(Fund::Feaga) => FundSet::new(true, false),
            Some(Fund::Feader) => FundSet::new(false, true),
            _ => FundSet::default(),
        }
    }
}

/// Keyword rules: `anticipo` and `saldo` name the general-fund windows, `feader` names
/// rural development (single days additionally need the word `pago`).
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl FundClassifier for KeywordClassifier {
    fn classify(&self, window: &str, shape: MentionShape) -> Option<FundMatch> {
        let text = strip_accents_lower(window);
        if text.contains("anticipo") {
            Some(FundMatch::new(ANTICIPO_KIND, Fund::Feaga))
        } else if text.contains("saldo") {
            Some(FundMatch::new(SALDO_KIND, Fund::Feaga))
        } else if text.contains("feader") && (shape == MentionShape::Range || text.contains("pago")) {
            Some(FundMatch::new(RURAL_PAYMENT_KIND, Fund::Feader))
        } else {
            None
        }
    }
}
