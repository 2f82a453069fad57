//! Fixed seasonal rule for the general fund (FEAGA) direct-aid payments.
//!
//! A campaign year `cy` runs from October of `cy` to the following summer. Advance
//! payments ("anticipo") fall between 16 October and 30 November of `cy`; the balance
//! ("saldo") runs from 1 December of `cy` to 30 June of `cy + 1`. The rural-development
//! fund (FEADER) has no fixed window and is paid per regional resolution.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::utils::{daterange, fmt_dm, fmt_dmy, fmt_month, month_bounds};
use crate::domain::{Fund, Origin, PaymentRecord};

pub const ANTICIPO_KIND: &str = "Anticipo ayudas directas";
pub const SALDO_KIND: &str = "Saldo ayudas directas";
pub const FEADER_REFERENCE_KIND: &str = "Referencia: FEADER (desarrollo rural)";
pub const NO_GENERAL_PAYMENTS_KIND: &str = "Referencia mes: Sin pagos FEAGA generales";

const FEAGA_REFERENCE_SOURCE: &str = "Referencia FEAGA";
const FEADER_REFERENCE_SOURCE: &str = "Referencia";
const FEADER_REFERENCE_DETAIL: &str = "Pagos según resoluciones/convocatorias autonómicas.";

const ANTICIPO_START: (u32, u32) = (10, 16);
const ANTICIPO_END: (u32, u32) = (11, 30);
const SALDO_START: (u32, u32) = (12, 1);
const SALDO_END: (u32, u32) = (6, 30);
const CAMPAIGN_START_MONTH: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Anticipo,
    Saldo,
}

impl WindowKind {
    pub fn kind_label(&self) -> &'static str {
        match self {
            WindowKind::Anticipo => ANTICIPO_KIND,
            WindowKind::Saldo => SALDO_KIND,
        }
    }

    fn plural_noun(&self) -> &'static str {
        match self {
            WindowKind::Anticipo => "anticipos",
            WindowKind::Saldo => "saldos",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Closed interval of calendar days.
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn intersect(&self, other: &DateWindow) -> Option<DateWindow> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateWindow { start, end })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        daterange(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignWindows {
    pub campaign_year: i32,
    pub anticipo: DateWindow,
    pub saldo: DateWindow,
}

impl CampaignWindows {
    pub fn iter(&self) -> impl Iterator<Item = (WindowKind, DateWindow)> {
        [
            (WindowKind::Anticipo, self.anticipo),
            (WindowKind::Saldo, self.saldo),
        ]
        .into_iter()
    }

    pub fn window(&self, kind: WindowKind) -> DateWindow {
        match kind {
            WindowKind::Anticipo => self.anticipo,
            WindowKind::Saldo => self.saldo,
        }
    }
}

/// Pure calendar rules; every function is total over valid dates.
pub struct CampaignCalendar;

impl CampaignCalendar {
    pub fn campaign_year_for(date: NaiveDate) -> i32 {
        if date.month() >= CAMPAIGN_START_MONTH {
            date.year()
        } else {
            date.year() - 1
        }
    }

    pub fn windows_for_campaign(campaign_year: i32) -> CampaignWindows {
        CampaignWindows {
            campaign_year,
            anticipo: DateWindow {
                start: fixed_date(campaign_year, ANTICIPO_START),
                end: fixed_date(campaign_year, ANTICIPO_END),
            },
            saldo: DateWindow {
                start: fixed_date(campaign_year, SALDO_START),
                end: fixed_date(campaign_year + 1, SALDO_END),
            },
        }
    }

    pub fn windows_for_day(date: NaiveDate) -> CampaignWindows {
        Self::windows_for_campaign(Self::campaign_year_for(date))
    }

    /// Detail of a synthesized window entry.
    pub fn window_detail(window: &DateWindow, campaign_year: i32) -> String {
        format!(
            "Ventana general ({}–{}). Campaña {}.",
            fmt_dm(window.start),
            fmt_dm(window.end),
            campaign_year
        )
    }

    /// Informational entries for every window containing `date`, followed by the standing
    /// FEADER reminder.
    pub fn day_in_any_window(date: NaiveDate) -> Vec<PaymentRecord> {
        let windows = Self::windows_for_day(date);
        let mut out: Vec<PaymentRecord> = windows
            .iter()
            .filter(|(_, window)| window.contains(date))
            .map(|(kind, window)| {
                PaymentRecord::new(
                    date,
                    kind.kind_label(),
                    Fund::Feaga,
                    Self::window_detail(&window, windows.campaign_year),
                    FEAGA_REFERENCE_SOURCE,
                    Origin::Info,
                )
            })
            .collect();
        out.push(Self::feader_reminder(date));
        out
    }

    /// Month-level hints for a day that sits outside a window: where each window falls
    /// within the day's month, or a single "no general payments" entry.
    pub fn month_generic_for_day(date: NaiveDate) -> Vec<PaymentRecord> {
        let windows = Self::windows_for_day(date);
        let mut out = Vec::new();
        if let Some((first, last)) = month_bounds(date.year(), date.month()) {
            let month = DateWindow {
                start: first,
                end: last,
            };
            for (kind, window) in windows.iter() {
                if window.contains(date) {
                    continue;
                }
                if let Some(overlap) = window.intersect(&month) {
                    let detail = format!(
                        "Este día ({}) está fuera; en {} la ventana es {}–{} (campaña {}).",
                        fmt_dmy(date),
                        fmt_month(date),
                        fmt_dm(overlap.start),
                        fmt_dm(overlap.end),
                        windows.campaign_year
                    );
                    out.push(PaymentRecord::new(
                        date,
                        format!("Referencia mes: {}", kind.kind_label()),
                        Fund::Feaga,
                        detail,
                        FEAGA_REFERENCE_SOURCE,
                        Origin::Info,
                    ));
                }
            }
        }
        if out.is_empty() {
            out.push(PaymentRecord::new(
                date,
                NO_GENERAL_PAYMENTS_KIND,
                Fund::Unknown,
                "Fuera de ventanas de anticipo/saldo en este mes.",
                FEAGA_REFERENCE_SOURCE,
                Origin::Info,
            ));
        }
        out.push(Self::feader_reminder(date));
        out
    }

    pub fn feader_reminder(date: NaiveDate) -> PaymentRecord {
        PaymentRecord::new(
            date,
            FEADER_REFERENCE_KIND,
            Fund::Feader,
            FEADER_REFERENCE_DETAIL,
            FEADER_REFERENCE_SOURCE,
            Origin::Info,
        )
    }

    /// Detail of a seeded heuristic row.
    pub fn seed_detail(kind: WindowKind, campaign_year: i32) -> String {
        format!("Ventana general de {}. Campaña {}.", kind.plural_noun(), campaign_year)
    }

    /// Materializes both windows of a campaign as heuristic rows, one per day.
    pub fn seed_records(campaign_year: i32) -> Vec<PaymentRecord> {
        let windows = Self::windows_for_campaign(campaign_year);
        windows
            .iter()
            .flat_map(|(kind, window)| {
                let detail = Self::seed_detail(kind, campaign_year);
                window.days().map(move |day| {
                    PaymentRecord::new(
                        day,
                        kind.kind_label(),
                        Fund::Feaga,
                        detail.clone(),
                        FEAGA_REFERENCE_SOURCE,
                        Origin::Heuristic,
                    )
                })
            })
            .collect()
    }
}

/// Window bounds are fixed month/day pairs that exist in every year, so construction only
/// fails for years outside chrono's representable range.
fn fixed_date(year: i32, (month, day): (u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("campaign year within chrono's range")
}
