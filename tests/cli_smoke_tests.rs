mod common;

use std::{fs, path::Path};

use assert_cmd::Command;
use common::{temp_dir, write_file};
use predicates::prelude::*;

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pepac_cli").expect("binary builds");
    cmd.env("PEPAC_HOME", home)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn version_prints_build_summary() {
    cli(&temp_dir())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pepac_core"));
}

#[test]
fn day_inside_anticipo_window_shows_reference() {
    let home = temp_dir();
    cli(&home)
        .args(["day", "2025-11-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20/11/2025"))
        .stdout(predicate::str::contains("Anticipo ayudas directas"))
        .stdout(predicate::str::contains("Referencia: FEADER"));
    assert!(home.join("pagos.json").exists());
}

#[test]
fn manual_record_round_trip_through_export() {
    let home = temp_dir();
    cli(&home)
        .args(["add", "03/05/2025", "Pago", "FEADER", "Ayuda jóvenes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registro añadido el 03/05/2025"));

    cli(&home)
        .args(["day", "2025-05-03", "--origins=manual"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ayuda jóvenes"))
        .stdout(predicate::str::contains("(manual)"));

    let out = home.join("mayo.csv");
    cli(&home)
        .args(["export-month", "2025", "5"])
        .arg(&out)
        .args(["--origins=manual"])
        .assert()
        .success();
    let exported = fs::read_to_string(&out).unwrap();
    assert!(exported.starts_with("fecha;tipo;fondo;detalle;origen;fuente"));
    assert!(exported.contains("2025-05-03;Pago;FEADER;Ayuda jóvenes;manual;Manual"));

    cli(&home)
        .args(["delete-day", "2025-05-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 registros eliminados"));
}

#[test]
fn csv_import_reports_counts() {
    let home = temp_dir();
    let csv = write_file(
        &home,
        "calendario.csv",
        "Mes;Actividad;Ayuda FEAGA;Ayuda FEADER\nMayo;Pago del 3 al 5 de mayo;Sí;No\n",
    );
    cli(&home)
        .arg("import-csv")
        .arg(&csv)
        .arg("2025")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 insertados, 0 omitidos"));
}

#[cfg(not(feature = "http"))]
#[test]
fn update_web_without_http_support_fails_cleanly() {
    cli(&temp_dir())
        .arg("update-web")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP support is not available"));
}

#[test]
fn bad_input_exits_with_error() {
    let home = temp_dir();
    cli(&home)
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown command"));
    cli(&home)
        .args(["day", "31/02/2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid date"));
}
