mod common;

use common::day;
use pepac_core::{
    core::utils::daterange,
    ingest::{PatternRule, SpanishDateRangeParser},
    domain::chrono::Datelike,
    CampaignCalendar, Origin,
};

#[test]
fn campaign_year_flips_in_october_for_every_day() {
    for date in daterange(day(2023, 1, 1), day(2026, 12, 31)) {
        let expected = if date.month() >= 10 {
            date.year()
        } else {
            date.year() - 1
        };
        assert_eq!(CampaignCalendar::campaign_year_for(date), expected, "{date}");
    }
}

#[test]
fn windows_are_fixed_and_disjoint() {
    for cy in 2020..=2030 {
        let windows = CampaignCalendar::windows_for_campaign(cy);
        assert_eq!(windows.anticipo.start, day(cy, 10, 16));
        assert_eq!(windows.anticipo.end, day(cy, 11, 30));
        assert_eq!(windows.saldo.start, day(cy, 12, 1));
        assert_eq!(windows.saldo.end, day(cy + 1, 6, 30));
        assert!(windows.anticipo.intersect(&windows.saldo).is_none());
    }
}

#[test]
fn window_entries_always_end_with_feader_reminder() {
    for date in [day(2025, 1, 1), day(2025, 7, 15), day(2025, 10, 16), day(2025, 12, 1)] {
        let in_window = CampaignCalendar::day_in_any_window(date);
        let generic = CampaignCalendar::month_generic_for_day(date);
        for rows in [in_window, generic] {
            assert!(rows.iter().all(|r| r.origin == Origin::Info));
            assert_eq!(rows.last().map(|r| r.kind.as_str()), Some("Referencia: FEADER (desarrollo rural)"));
        }
    }
}

#[test]
fn documented_line_examples() {
    let parse = |line: &str, month: u32| {
        SpanishDateRangeParser::parse_line(line, 2025, month)
            .unwrap()
            .unwrap()
    };

    let named = parse("del 3 al 15 de mayo", 1);
    assert_eq!((named.start, named.end), (day(2025, 5, 3), day(2025, 5, 15)));

    let open = parse("a partir del 10", 10);
    assert_eq!((open.start, open.end), (day(2025, 10, 10), day(2025, 10, 31)));

    let single = parse("12 de septiembre", 3);
    assert_eq!((single.start, single.end), (day(2025, 9, 12), day(2025, 9, 12)));

    let note = parse("Plazo de modificación de la solicitud", 3);
    assert_eq!(note.rule, PatternRule::WholeMonth);
    assert_eq!(note.start, day(2025, 3, 1));
    assert!(note.detail.starts_with("[Mes] "));
}

#[test]
fn range_without_month_uses_default_month() {
    let parsed = SpanishDateRangeParser::parse_line("Pagos del 1 al 9", 2025, 12)
        .unwrap()
        .unwrap();
    assert_eq!(parsed.rule, PatternRule::RangeInDefaultMonth);
    assert_eq!((parsed.start, parsed.end), (day(2025, 12, 1), day(2025, 12, 9)));
}

#[test]
fn reversed_range_is_reported_not_swapped() {
    let parsed = SpanishDateRangeParser::parse_line("del 20 al 5 de junio", 2025, 1)
        .unwrap()
        .unwrap();
    assert!(parsed.is_reversed());
}
