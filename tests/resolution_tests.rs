mod common;

use common::{day, memory_engine, setup_test_env};
use pepac_core::{
    core::campaign::{ANTICIPO_KIND, FEADER_REFERENCE_KIND, NO_GENERAL_PAYMENTS_KIND, SALDO_KIND},
    core::FixedClock,
    Fund, Origin, OriginFilter, PaymentRecord, PaymentStore, ResolutionEngine,
};

fn manual(date: (i32, u32, u32), kind: &str, fund: Fund, detail: &str) -> PaymentRecord {
    PaymentRecord::new(day(date.0, date.1, date.2), kind, fund, detail, "usuario", Origin::Manual)
}

fn all_origins() -> OriginFilter {
    OriginFilter::from_selection(Vec::<Origin>::new())
}

#[test]
fn empty_day_falls_back_to_info_entries_only() {
    let (_, engine) = memory_engine();
    for date in [day(2025, 11, 20), day(2025, 6, 15), day(2025, 8, 10)] {
        let rows = engine.resolve_day(date, &all_origins()).unwrap();
        assert!(!rows.is_empty(), "{date} resolved to nothing");
        assert!(rows.iter().all(|r| r.origin == Origin::Info));
        assert!(rows.iter().all(|r| r.date == date));
    }
}

#[test]
fn outside_both_windows_reports_no_general_payments() {
    let (_, engine) = memory_engine();
    let kinds: Vec<String> = engine
        .resolve_day(day(2025, 8, 10), &all_origins())
        .unwrap()
        .into_iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(kinds, vec![NO_GENERAL_PAYMENTS_KIND, FEADER_REFERENCE_KIND]);
}

#[test]
fn month_edge_of_window_points_at_overlap() {
    let (_, engine) = memory_engine();
    // 10/10/2025 sits before the anticipo window that opens on the 16th.
    let rows = engine.resolve_day(day(2025, 10, 10), &all_origins()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].kind, format!("Referencia mes: {ANTICIPO_KIND}"));
    assert!(rows[0].detail.contains("16/10–31/10"));
    assert_eq!(rows[1].kind, FEADER_REFERENCE_KIND);
}

#[test]
fn seeded_campaign_day_shows_anticipo_and_reminder_only() {
    let (store, engine) = memory_engine();
    engine.seed_campaign(2025).unwrap();
    assert_eq!(store.get_day(day(2025, 11, 20), &all_origins()).unwrap()[0].origin, Origin::Heuristic);

    for filter in [all_origins(), OriginFilter::only([Origin::Manual, Origin::Web])] {
        let rows = engine.resolve_day(day(2025, 11, 20), &filter).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, ANTICIPO_KIND);
        assert_eq!(rows[0].origin, Origin::Info);
        assert_eq!(rows[1].kind, FEADER_REFERENCE_KIND);
        assert_eq!(rows[1].origin, Origin::Info);
    }
}

#[test]
fn manual_feaga_record_suppresses_feaga_info() {
    let (store, engine) = memory_engine();
    engine.seed_campaign(2025).unwrap();
    store
        .add(manual((2025, 11, 20), "Pago anticipo", Fund::Feaga, "Ingreso confirmado"))
        .unwrap();

    for filter in [all_origins(), OriginFilter::only([Origin::Manual])] {
        let rows = engine.resolve_day(day(2025, 11, 20), &filter).unwrap();
        assert!(rows
            .iter()
            .all(|r| !(r.origin == Origin::Info && r.fund == Fund::Feaga)));
        assert!(rows.iter().any(|r| r.kind == "Pago anticipo"));
        assert!(rows.iter().any(|r| r.kind == FEADER_REFERENCE_KIND));
    }
}

#[test]
fn missing_fund_is_supplemented_without_replacing_exact_rows() {
    let (store, engine) = memory_engine();
    store
        .add(manual((2025, 12, 5), "Medida agroambiental", Fund::Feader, "Resolución 12/2025"))
        .unwrap();

    let rows = engine.resolve_day(day(2025, 12, 5), &all_origins()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].origin, Origin::Manual);
    assert_eq!(rows[1].kind, SALDO_KIND);
    assert_eq!(rows[1].origin, Origin::Info);
}

#[test]
fn month_rows_fill_in_for_uncovered_fund() {
    let (store, engine) = memory_engine();
    store
        .add(manual((2025, 5, 3), "Pago FEADER", Fund::Feader, "Incorporación jóvenes"))
        .unwrap();

    let rows = engine.resolve_day(day(2025, 5, 20), &all_origins()).unwrap();
    let recast: Vec<&PaymentRecord> = rows
        .iter()
        .filter(|r| r.detail.starts_with("Del mes · "))
        .collect();
    assert_eq!(recast.len(), 1);
    assert_eq!(recast[0].origin, Origin::Info);
    assert_eq!(recast[0].fund, Fund::Feader);
    assert_eq!(
        recast[0].detail,
        "Del mes · Incorporación jóvenes (original: 03/05/2025)"
    );
    assert!(rows.iter().any(|r| r.kind == SALDO_KIND));
}

#[test]
fn deleting_concrete_rows_keeps_heuristic_window() {
    let (store, engine) = memory_engine();
    engine.seed_campaign(2025).unwrap();
    let date = day(2025, 11, 20);
    store
        .add(manual((2025, 11, 20), "Pago", Fund::Feaga, "Manual"))
        .unwrap();
    store
        .add(PaymentRecord::new(date, "Nota", Fund::Feaga, "Web", "https://fega.gob.es", Origin::Web))
        .unwrap();

    assert_eq!(store.delete_day(date, Some(Origin::Manual)).unwrap(), 1);
    assert_eq!(store.delete_day(date, Some(Origin::Web)).unwrap(), 1);

    let left = store.get_day(date, &all_origins()).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].origin, Origin::Heuristic);
    assert_eq!(left[0].kind, ANTICIPO_KIND);

    let rows = engine.resolve_day(date, &all_origins()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].kind, ANTICIPO_KIND);
    assert_eq!(rows[0].origin, Origin::Info);
}

#[test]
fn range_and_month_queries_have_no_fallback() {
    let (_, engine) = memory_engine();
    assert!(engine
        .resolve_range(day(2025, 11, 1), day(2025, 11, 30), &all_origins())
        .unwrap()
        .is_empty());
    assert!(engine.resolve_month(2025, 11, &all_origins()).unwrap().is_empty());
    assert!(engine
        .resolve_range(day(2025, 11, 30), day(2025, 11, 1), &all_origins())
        .unwrap()
        .is_empty());
}

#[test]
fn month_overview_counts_window_days() {
    let (_, engine) = memory_engine();
    let overview = engine.month_overview(2025, 10, &all_origins()).unwrap();
    assert_eq!(overview.len(), 31);
    assert_eq!(overview[9].date, day(2025, 10, 10));
    assert_eq!(overview[9].feaga, 0);
    assert_eq!(overview[15].date, day(2025, 10, 16));
    assert_eq!(overview[15].feaga, 1);
    assert!(overview.iter().all(|d| d.feader >= 1));
    assert_eq!(overview[15].top_kinds[0], ANTICIPO_KIND);

    let november = engine.month_overview(2025, 11, &all_origins()).unwrap();
    assert!(november.iter().all(|d| d.feaga == 1));
}

#[test]
fn month_overview_does_not_count_seeded_rows_twice() {
    let (_, engine) = memory_engine();
    engine.seed_campaign(2025).unwrap();
    let overview = engine.month_overview(2025, 11, &all_origins()).unwrap();
    assert!(overview.iter().all(|d| d.feaga == 1), "{overview:?}");
}

#[test]
fn reset_of_concrete_rows_survives_reopen() {
    let (store, config) = setup_test_env();
    let engine = ResolutionEngine::new(store.clone());
    let clock = FixedClock(day(2025, 11, 20));
    let seeded = engine.seed_current_campaign(&clock).unwrap();
    assert_eq!(seeded, 46 + 212);
    store
        .add(manual((2025, 11, 20), "Pago", Fund::Feaga, "Manual"))
        .unwrap();

    let summary = engine.reset(false, day(2025, 11, 20)).unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.reseeded, 0);

    let reopened = pepac_core::JsonStore::open(config.store_path()).unwrap();
    assert_eq!(reopened.count().unwrap(), seeded);
}
