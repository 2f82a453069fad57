//! Date and text helpers shared by the calendar, parser and importers.

use std::iter;

use chrono::{Datelike, NaiveDate};

use crate::errors::{PaymentsError, Result};

/// Spanish month names, including the archaic `setiembre` spelling.
pub const SPANISH_MONTHS: [(&str, u32); 13] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Maps a month name (any case, accents ignored) to its number.
pub fn spanish_month(name: &str) -> Option<u32> {
    let key = strip_accents_lower(name);
    let key = key.trim();
    SPANISH_MONTHS
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, number)| *number)
}

/// Every calendar day in `[start, end]`; empty when `start > end`.
pub fn daterange(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    iter::successors(Some(start).filter(|s| *s <= end), move |current| {
        current.succ_opt().filter(|next| *next <= end)
    })
}

/// First and last day of a calendar month, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

/// Builds a date, failing explicitly instead of wrapping into the next month.
pub fn checked_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(PaymentsError::InvalidDate { year, month, day })
}

/// Last day of the month that contains `year`/`month`.
pub fn end_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    month_bounds(year, month)
        .map(|(_, last)| last)
        .ok_or(PaymentsError::InvalidDate {
            year,
            month,
            day: 1,
        })
}

/// Parses the date formats users type or spreadsheets carry: `dd/mm/yyyy`, `dd/mm/yy`,
/// `dd-mm-yyyy` and ISO `yyyy-mm-dd`.
pub fn parse_user_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    // Spreadsheet exports sometimes append a midnight time component.
    let date_part = raw.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split(['/', '-']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(
            parts[0].parse().ok()?,
            parts[1].parse().ok()?,
            parts[2].parse().ok()?,
        );
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let mut year: i32 = parts[2].parse().ok()?;
    if parts[2].len() <= 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn fmt_dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn fmt_dm(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}

pub fn fmt_month(date: NaiveDate) -> String {
    format!("{:02}/{}", date.month(), date.year())
}

/// Lower-cases and removes Spanish diacritics so pattern matching can work on plain ASCII
/// vocabulary.
pub fn strip_accents_lower(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Slices `text` to `radius` characters on each side of the byte span `start..end`.
/// The span must sit on char boundaries, as regex match offsets do.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[lo..hi]
}
