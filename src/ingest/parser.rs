//! Spanish date-range extraction.
//!
//! A line is matched against an ordered rule list, most specific first:
//!
//! 1. `del 3 al 15 de mayo`
//! 2. `del 3 al 15` (default month)
//! 3. `a partir del 10 de octubre` (through the end of that month; `de` is optional)
//! 4. `a partir del 10` (through the end of the default month)
//! 5. `12 de septiembre` or `12 septiembre`
//! 6. a bare day number in a `day: description` line
//! 7. anything else becomes a month-level note on day 1 of the default month
//!
//! Matching runs on lower-cased, accent-free text; labels are taken from the raw line.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::core::utils::{checked_date, end_of_month, spanish_month, strip_accents_lower};
use crate::errors::{PaymentsError, Result};

const MONTHS: &str =
    "enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre";
const LABEL_LIMIT: usize = 80;
pub const MONTH_NOTE_PREFIX: &str = "[Mes] ";

static RANGE_NAMED_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bdel\s+(\d{{1,2}})\s+al\s+(\d{{1,2}})\s+de\s+({MONTHS})\b"))
        .expect("valid range regex")
});
static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdel\s+(\d{1,2})\s+al\s+(\d{1,2})\b").expect("valid range regex"));
static FROM_NAMED_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\ba\s+partir\s+del\s+(\d{{1,2}})\s+(?:de\s+)?({MONTHS})\b"))
        .expect("valid open range regex")
});
static FROM_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\ba\s+partir\s+del\s+(\d{1,2})\b").expect("valid open range regex"));
static DAY_NAMED_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(\d{{1,2}})\s+(?:de\s+)?({MONTHS})\b")).expect("valid day regex")
});
static BARE_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})\b").expect("valid day regex"));

/// Which rule produced a [`ParsedLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRule {
    RangeInNamedMonth,
    RangeInDefaultMonth,
    FromDayOfNamedMonth,
    FromDayOfDefaultMonth,
    DayOfNamedMonth,
    BareDay,
    WholeMonth,
}

impl PatternRule {
    /// Rules that name their month explicitly; the only ones usable on free text.
    pub fn names_month(&self) -> bool {
        matches!(
            self,
            PatternRule::RangeInNamedMonth
                | PatternRule::FromDayOfNamedMonth
                | PatternRule::DayOfNamedMonth
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: String,
    pub detail: String,
    pub rule: PatternRule,
}

impl ParsedLine {
    pub fn is_month_level(&self) -> bool {
        self.rule == PatternRule::WholeMonth
    }

    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }
}

/// A date expression found inside a longer document, with its byte span in the normalized
/// text so callers can look at the surrounding words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMention {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub span: (usize, usize),
    pub is_range: bool,
}

pub struct SpanishDateRangeParser;

impl SpanishDateRangeParser {
    /// Parses one line. Blank lines yield `Ok(None)`; an impossible calendar date is an
    /// `InvalidDate` error for the caller to skip.
    pub fn parse_line(line: &str, default_year: i32, default_month: u32) -> Result<Option<ParsedLine>> {
        let raw = line.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let text = strip_accents_lower(raw);
        let (kind, detail) = clean_label(raw);

        let (start, end, rule) = if let Some(caps) = RANGE_NAMED_MONTH.captures(&text) {
            let month = named_month(&caps, 3, default_month);
            (
                checked_date(default_year, month, day_of(&caps, 1)?)?,
                checked_date(default_year, month, day_of(&caps, 2)?)?,
                PatternRule::RangeInNamedMonth,
            )
        } else if let Some(caps) = RANGE.captures(&text) {
            (
                checked_date(default_year, default_month, day_of(&caps, 1)?)?,
                checked_date(default_year, default_month, day_of(&caps, 2)?)?,
                PatternRule::RangeInDefaultMonth,
            )
        } else if let Some(caps) = FROM_NAMED_MONTH.captures(&text) {
            let month = named_month(&caps, 2, default_month);
            (
                checked_date(default_year, month, day_of(&caps, 1)?)?,
                end_of_month(default_year, month)?,
                PatternRule::FromDayOfNamedMonth,
            )
        } else if let Some(caps) = FROM_DAY.captures(&text) {
            (
                checked_date(default_year, default_month, day_of(&caps, 1)?)?,
                end_of_month(default_year, default_month)?,
                PatternRule::FromDayOfDefaultMonth,
            )
        } else if let Some(caps) = DAY_NAMED_MONTH.captures(&text) {
            let day = checked_date(default_year, named_month(&caps, 2, default_month), day_of(&caps, 1)?)?;
            (day, day, PatternRule::DayOfNamedMonth)
        } else if let Some(caps) = BARE_DAY.captures(&text).filter(|_| raw.contains(':')) {
            let day = checked_date(default_year, default_month, day_of(&caps, 1)?)?;
            (day, day, PatternRule::BareDay)
        } else {
            let day = checked_date(default_year, default_month, 1)?;
            return Ok(Some(ParsedLine {
                start: day,
                end: day,
                kind,
                detail: format!("{MONTH_NOTE_PREFIX}{detail}"),
                rule: PatternRule::WholeMonth,
            }));
        };

        Ok(Some(ParsedLine {
            start,
            end,
            kind,
            detail,
            rule,
        }))
    }

    /// Finds every date expression that names its month in `text` (already normalized):
    /// closed ranges, open ranges running to the end of the month, and single days.
    /// Single days inside an already matched range are not reported twice. Impossible
    /// dates are returned as errors next to the valid mentions.
    pub fn scan_mentions(text: &str, year: i32) -> (Vec<DateMention>, Vec<PaymentsError>) {
        let mut mentions = Vec::new();
        let mut errors = Vec::new();
        let mut range_spans = Vec::new();

        for caps in RANGE_NAMED_MONTH.captures_iter(text) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or_default();
            range_spans.push(whole);
            let month = caps.get(3).and_then(|m| spanish_month(m.as_str()));
            let built = month
                .ok_or_else(|| PaymentsError::InvalidInput("unknown month name".into()))
                .and_then(|month| {
                    Ok((
                        checked_date(year, month, day_of(&caps, 1)?)?,
                        checked_date(year, month, day_of(&caps, 2)?)?,
                    ))
                });
            match built {
                Ok((start, end)) => mentions.push(DateMention {
                    start,
                    end,
                    span: whole,
                    is_range: true,
                }),
                Err(err) => errors.push(err),
            }
        }

        for caps in FROM_NAMED_MONTH.captures_iter(text) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or_default();
            range_spans.push(whole);
            let month = caps.get(2).and_then(|m| spanish_month(m.as_str()));
            let built = month
                .ok_or_else(|| PaymentsError::InvalidInput("unknown month name".into()))
                .and_then(|month| {
                    Ok((
                        checked_date(year, month, day_of(&caps, 1)?)?,
                        end_of_month(year, month)?,
                    ))
                });
            match built {
                Ok((start, end)) => mentions.push(DateMention {
                    start,
                    end,
                    span: whole,
                    is_range: true,
                }),
                Err(err) => errors.push(err),
            }
        }

        for caps in DAY_NAMED_MONTH.captures_iter(text) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or_default();
            if range_spans
                .iter()
                .any(|(lo, hi)| whole.0 >= *lo && whole.1 <= *hi)
            {
                continue;
            }
            let month = caps.get(2).and_then(|m| spanish_month(m.as_str()));
            let built = month
                .ok_or_else(|| PaymentsError::InvalidInput("unknown month name".into()))
                .and_then(|month| checked_date(year, month, day_of(&caps, 1)?));
            match built {
                Ok(day) => mentions.push(DateMention {
                    start: day,
                    end: day,
                    span: whole,
                    is_range: false,
                }),
                Err(err) => errors.push(err),
            }
        }

        mentions.sort_by_key(|m| m.span.0);
        (mentions, errors)
    }
}

static YEAR_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"20\d{2}").expect("valid year regex"));

/// First four-digit `20xx` year in `text`.
pub fn year_hint(text: &str) -> Option<i32> {
    YEAR_HINT.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Splits a line into `(kind, detail)`. A `label: description` line uses the description
/// as the kind; the detail is always the whole (dash-trimmed) line.
pub fn clean_label(line: &str) -> (String, String) {
    let text = line.trim().trim_start_matches('-').trim();
    if let Some((_, right)) = text.split_once(':') {
        let right = right.trim();
        let kind = if right.is_empty() {
            truncate_chars(text, LABEL_LIMIT)
        } else {
            right.to_string()
        };
        return (kind, text.to_string());
    }
    (truncate_chars(text, LABEL_LIMIT), text.to_string())
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn named_month(caps: &Captures, idx: usize, fallback: u32) -> u32 {
    caps.get(idx)
        .and_then(|m| spanish_month(m.as_str()))
        .unwrap_or(fallback)
}

fn day_of(caps: &Captures, idx: usize) -> Result<u32> {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| PaymentsError::InvalidInput("missing day number".into()))
}
