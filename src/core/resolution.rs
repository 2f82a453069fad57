//! Day/month/range lookups with the graceful fallback cascade.
//!
//! A day query returns the stored rows first. Funds without real (manual or web) data on
//! that day are supplemented with the campaign-window rule and with month-level rows
//! recast as informational entries. Heuristic rows that repeat a window entry give way to
//! it. A day with nothing at all degrades to the month
//! summary produced by [`CampaignCalendar::month_generic_for_day`].

use std::{collections::HashSet, sync::Arc};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::core::campaign::CampaignCalendar;
use crate::core::time::Clock;
use crate::core::utils::{daterange, fmt_dmy, month_bounds};
use crate::domain::{Fund, Origin, OriginFilter, PaymentRecord};
use crate::errors::Result;
use crate::storage::PaymentStore;

pub const DEFAULT_MONTH_FALLBACK_CAP: usize = 20;
const MONTH_ITEM_PREFIX: &str = "Del mes · ";
const OVERVIEW_TOP_KINDS: usize = 3;

/// Per-day digest used by month views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub feaga: usize,
    pub feader: usize,
    pub top_kinds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSummary {
    pub removed: usize,
    pub reseeded: usize,
}

pub struct ResolutionEngine {
    store: Arc<dyn PaymentStore>,
    month_fallback_cap: usize,
}

impl ResolutionEngine {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self::with_cap(store, DEFAULT_MONTH_FALLBACK_CAP)
    }

    /// `cap` bounds how many month rows are recast per uncovered fund.
    pub fn with_cap(store: Arc<dyn PaymentStore>, cap: usize) -> Self {
        Self {
            store,
            month_fallback_cap: cap,
        }
    }

    pub fn store(&self) -> &Arc<dyn PaymentStore> {
        &self.store
    }

    pub fn month_fallback_cap(&self) -> usize {
        self.month_fallback_cap
    }

    pub fn resolve_day(&self, date: NaiveDate, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        let exact = self.store.get_day(date, filter)?;
        let covered = |fund: Fund| {
            exact
                .iter()
                .any(|r| r.fund == fund && r.origin.is_concrete())
        };
        let feaga_covered = covered(Fund::Feaga);
        let feader_covered = covered(Fund::Feader);

        let mut window_rows = Vec::new();
        if !feaga_covered {
            window_rows.extend(
                CampaignCalendar::day_in_any_window(date)
                    .into_iter()
                    .filter(|r| r.fund == Fund::Feaga),
            );
        }
        let had_window_entry = !window_rows.is_empty();
        if !feader_covered {
            window_rows.push(CampaignCalendar::feader_reminder(date));
        }

        let mut recast = Vec::new();
        if !(feaga_covered && feader_covered) {
            let month_rows = self.store.get_month(date.year(), date.month(), filter)?;
            for (fund, is_covered) in [(Fund::Feaga, feaga_covered), (Fund::Feader, feader_covered)] {
                if is_covered {
                    continue;
                }
                recast.extend(
                    month_rows
                        .iter()
                        .filter(|r| r.fund == fund && r.origin.is_concrete())
                        .take(self.month_fallback_cap)
                        .map(|r| recast_as_month_item(date, r)),
                );
            }
        }

        let candidates = if exact.is_empty() && !had_window_entry && recast.is_empty() {
            debug!(%date, "no day data, using month summary");
            CampaignCalendar::month_generic_for_day(date)
        } else {
            let mut all = without_seeded_duplicates(exact, &window_rows);
            all.extend(window_rows);
            all.extend(recast);
            all
        };
        Ok(dedup_by_display_key(candidates))
    }

    /// Stored rows of the month; no fallback.
    pub fn resolve_month(&self, year: i32, month: u32, filter: &OriginFilter) -> Result<Vec<PaymentRecord>> {
        self.store.get_month(year, month, filter)
    }

    /// Stored rows of `[start, end]`; a reversed range is empty.
    pub fn resolve_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: &OriginFilter,
    ) -> Result<Vec<PaymentRecord>> {
        self.store.get_range(start, end, filter)
    }

    pub fn has_records(&self, date: NaiveDate) -> Result<bool> {
        self.store.has_day(date)
    }

    /// Fund counts and the most frequent kinds for every day of the month. Window entries
    /// count towards the totals just like stored rows.
    pub fn month_overview(
        &self,
        year: i32,
        month: u32,
        filter: &OriginFilter,
    ) -> Result<Vec<DayOverview>> {
        let Some((first, last)) = month_bounds(year, month) else {
            return Ok(Vec::new());
        };
        let rows = self.store.get_range(first, last, filter)?;
        Ok(daterange(first, last)
            .map(|date| {
                let window_rows = CampaignCalendar::day_in_any_window(date);
                let stored: Vec<PaymentRecord> =
                    rows.iter().filter(|r| r.date == date).cloned().collect();
                let mut day_rows = without_seeded_duplicates(stored, &window_rows);
                day_rows.extend(window_rows);
                DayOverview {
                    date,
                    feaga: day_rows.iter().filter(|r| r.fund == Fund::Feaga).count(),
                    feader: day_rows.iter().filter(|r| r.fund == Fund::Feader).count(),
                    top_kinds: top_kinds(&day_rows, OVERVIEW_TOP_KINDS),
                }
            })
            .collect())
    }

    /// Materializes both windows of `campaign_year` as heuristic rows.
    pub fn seed_campaign(&self, campaign_year: i32) -> Result<usize> {
        let inserted = self.store.add_many(CampaignCalendar::seed_records(campaign_year))?;
        info!(campaign_year, inserted, "seeded campaign windows");
        Ok(inserted)
    }

    pub fn seed_current_campaign(&self, clock: &dyn Clock) -> Result<usize> {
        self.seed_campaign(CampaignCalendar::campaign_year_for(clock.today()))
    }

    /// Wipes the store. When heuristic rows are spared, the current campaign is re-seeded so
    /// the window reference is complete again.
    pub fn reset(&self, include_heuristic: bool, today: NaiveDate) -> Result<ResetSummary> {
        let removed = self.store.delete_all(include_heuristic)?;
        let reseeded = if include_heuristic {
            0
        } else {
            self.seed_campaign(CampaignCalendar::campaign_year_for(today))?
        };
        info!(removed, reseeded, include_heuristic, "store reset");
        Ok(ResetSummary { removed, reseeded })
    }
}

/// Re-dates a month-level row onto `day` as an informational entry, keeping its original
/// date in the detail when it differs.
pub fn recast_as_month_item(day: NaiveDate, original: &PaymentRecord) -> PaymentRecord {
    let mut detail = format!("{MONTH_ITEM_PREFIX}{}", original.detail);
    if original.date != day {
        detail.push_str(&format!(" (original: {})", fmt_dmy(original.date)));
    }
    PaymentRecord::new(
        day,
        original.kind.clone(),
        original.fund,
        detail,
        original.source.clone(),
        Origin::Info,
    )
}

/// Drops heuristic rows that a window entry already stands for.
fn without_seeded_duplicates(rows: Vec<PaymentRecord>, window_rows: &[PaymentRecord]) -> Vec<PaymentRecord> {
    rows.into_iter()
        .filter(|r| {
            r.origin != Origin::Heuristic
                || !window_rows.iter().any(|w| w.kind == r.kind && w.fund == r.fund)
        })
        .collect()
}

fn dedup_by_display_key(rows: Vec<PaymentRecord>) -> Vec<PaymentRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(r.display_key()))
        .collect()
}

fn top_kinds(rows: &[PaymentRecord], k: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let kind = if row.kind.is_empty() { "—" } else { row.kind.as_str() };
        match counts.iter_mut().find(|(existing, _)| existing == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind.to_string(), 1)),
        }
    }
    // Stable sort keeps first-seen order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(k).map(|(kind, _)| kind).collect()
}
