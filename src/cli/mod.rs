//! Command-line front end: argv dispatch over the store, resolution engine and ingestion
//! pipeline.

pub mod output;

use std::{env, path::PathBuf, sync::Arc};

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::{
    config::{Config, ConfigManager},
    core::{
        utils::{fmt_dmy, parse_user_date},
        CampaignCalendar, Clock, ResolutionEngine, SystemClock,
    },
    domain::{Fund, Origin, OriginFilter, PaymentRecord},
    errors::{PaymentsError, Result},
    ingest::{
        sources::{default_extractor, default_fetcher},
        spawn_ingestion, IngestJob, IngestReport, IngestionPipeline,
    },
    storage::{csv_export, JsonStore, PaymentStore},
    utils::build_info,
};

const USAGE: &str = "Usage: pepac_cli <command> [--origins=manual,web,heuristic]\n\
Commands:\n  \
day <fecha>\n  \
month <año> <mes>\n  \
range <fecha1> <fecha2>\n  \
seed [campaña]\n  \
add <fecha> <tipo> <fondo> <detalle> [fuente]\n  \
delete-day <fecha> [--all]\n  \
clear [--all]\n  \
import-csv <ruta> [año]\n  \
import-pdf <carpeta> [año]\n  \
update-web\n  \
export-month <año> <mes> <salida.csv>\n  \
version";

/// Parsed argv: positional words plus the recognised flags.
#[derive(Debug, Default, PartialEq, Eq)]
struct Invocation {
    command: String,
    args: Vec<String>,
    origins: Option<Vec<Origin>>,
    all: bool,
}

impl Invocation {
    fn parse<I: IntoIterator<Item = String>>(argv: I) -> Result<Self> {
        let mut invocation = Invocation::default();
        let mut positional = Vec::new();
        for arg in argv {
            if let Some(list) = arg.strip_prefix("--origins=") {
                let origins = list
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(Origin::parse)
                    .collect::<Result<Vec<_>>>()?;
                invocation.origins = Some(origins);
            } else if arg == "--all" {
                invocation.all = true;
            } else if arg.starts_with("--") {
                return Err(PaymentsError::InvalidInput(format!("unknown flag `{arg}`")));
            } else {
                positional.push(arg);
            }
        }
        let mut positional = positional.into_iter();
        invocation.command = positional.next().unwrap_or_default();
        invocation.args = positional.collect();
        Ok(invocation)
    }

    fn arg(&self, index: usize, name: &str) -> Result<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| PaymentsError::InvalidInput(format!("missing <{name}>\n{USAGE}")))
    }

    fn optional_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

struct Session {
    config: Config,
    store: Arc<JsonStore>,
    engine: ResolutionEngine,
    today: NaiveDate,
}

impl Session {
    fn open(clock: &dyn Clock) -> Result<Self> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        let store = Arc::new(JsonStore::open(manager.store_path())?);
        let engine = ResolutionEngine::with_cap(store.clone(), config.month_fallback_cap);
        engine.seed_current_campaign(clock)?;
        let session = Self {
            config,
            store,
            engine,
            today: clock.today(),
        };
        session.autoload()?;
        Ok(session)
    }

    fn pipeline(&self) -> Result<IngestionPipeline> {
        Ok(IngestionPipeline::new(self.store.clone())
            .with_fetcher(Arc::from(default_fetcher(self.config.http_timeout_secs)?))
            .with_extractor(Arc::from(default_extractor()))
            .with_context_window(self.config.context_window))
    }

    fn autoload(&self) -> Result<()> {
        if self.config.autoload_tables.is_empty() {
            return Ok(());
        }
        if let Some(report) = self
            .pipeline()?
            .autoload_table(&self.config.autoload_tables, self.today.year())?
        {
            output::info(format!("Tabla cargada automáticamente: {} registros.", report.inserted));
        }
        Ok(())
    }

    fn filter(&self, invocation: &Invocation) -> OriginFilter {
        match &invocation.origins {
            Some(origins) => OriginFilter::from_selection(origins.iter().copied()),
            None => self.config.origin_filter(),
        }
    }

    fn ingest(&self, job: IngestJob) -> Result<()> {
        output::info(format!("Importando ({})...", job.label()));
        let handle = spawn_ingestion(Arc::new(self.pipeline()?), job)?;
        report(&handle.wait()?);
        Ok(())
    }
}

/// Entry point used by the `pepac_cli` binary.
pub fn run_cli() -> Result<()> {
    run_with_args(env::args().skip(1), &SystemClock)
}

pub fn run_with_args<I: IntoIterator<Item = String>>(argv: I, clock: &dyn Clock) -> Result<()> {
    let invocation = Invocation::parse(argv)?;
    debug!(command = %invocation.command, "dispatching command");
    match invocation.command.as_str() {
        "version" => {
            println!("{}", build_info::current().summary());
            return Ok(());
        }
        "" | "help" => {
            println!("{USAGE}");
            return Ok(());
        }
        _ => {}
    }

    let session = Session::open(clock)?;
    match invocation.command.as_str() {
        "day" => {
            let date = date_arg(&invocation, 0, "fecha")?;
            let rows = session.engine.resolve_day(date, &session.filter(&invocation))?;
            output::section(fmt_dmy(date));
            output::records(&rows);
        }
        "month" => {
            let (year, month) = year_month_args(&invocation)?;
            let filter = session.filter(&invocation);
            output::section(format!("{month:02}/{year}"));
            for day in session.engine.month_overview(year, month, &filter)? {
                if day.feaga == 0 && day.feader == 0 && day.top_kinds.is_empty() {
                    continue;
                }
                println!(
                    "{}  FEAGA {:>2}  FEADER {:>2}  {}",
                    fmt_dmy(day.date),
                    day.feaga,
                    day.feader,
                    day.top_kinds.join(" | ")
                );
            }
        }
        "range" => {
            let start = date_arg(&invocation, 0, "fecha1")?;
            let end = date_arg(&invocation, 1, "fecha2")?;
            let rows = session
                .engine
                .resolve_range(start, end, &session.filter(&invocation))?;
            output::section(format!("{} - {}", fmt_dmy(start), fmt_dmy(end)));
            output::records(&rows);
        }
        "seed" => {
            let campaign = match invocation.optional_arg(0) {
                Some(raw) => parse_number(raw, "campaña")?,
                None => CampaignCalendar::campaign_year_for(session.today),
            };
            let inserted = session.engine.seed_campaign(campaign)?;
            output::success(format!("Campaña {campaign}: {inserted} registros nuevos."));
        }
        "add" => {
            let date = date_arg(&invocation, 0, "fecha")?;
            let record = PaymentRecord::new(
                date,
                invocation.arg(1, "tipo")?,
                Fund::from_label(invocation.arg(2, "fondo")?),
                invocation.arg(3, "detalle")?,
                invocation.optional_arg(4).unwrap_or("Manual"),
                Origin::Manual,
            );
            if session.store.add(record)? {
                output::success(format!("Registro añadido el {}.", fmt_dmy(date)));
            } else {
                output::warning("El registro ya existía.");
            }
        }
        "delete-day" => {
            let date = date_arg(&invocation, 0, "fecha")?;
            let origin = if invocation.all { None } else { Some(Origin::Manual) };
            let removed = session.store.delete_day(date, origin)?;
            output::success(format!("{removed} registros eliminados del {}.", fmt_dmy(date)));
        }
        "clear" => {
            let summary = session.engine.reset(invocation.all, session.today)?;
            output::success(format!(
                "{} registros eliminados, {} reconstruidos.",
                summary.removed, summary.reseeded
            ));
        }
        "import-csv" => {
            let path = PathBuf::from(invocation.arg(0, "ruta")?);
            let year = optional_year(&invocation, 1, session.today)?;
            session.ingest(IngestJob::CsvFile {
                path,
                year,
                origin: Origin::Manual,
            })?;
        }
        "import-pdf" => {
            let folder = PathBuf::from(invocation.arg(0, "carpeta")?);
            let default_year = optional_year(&invocation, 1, session.today)?;
            session.ingest(IngestJob::PdfFolder {
                folder,
                default_year,
                origin: Origin::Manual,
            })?;
        }
        "update-web" => {
            session.ingest(IngestJob::Web {
                sources: session.config.web_sources.clone(),
                default_year: session.today.year(),
            })?;
        }
        "export-month" => {
            let (year, month) = year_month_args(&invocation)?;
            let out = PathBuf::from(invocation.arg(2, "salida.csv")?);
            let rows = session
                .engine
                .resolve_month(year, month, &session.filter(&invocation))?;
            let written = csv_export::export_csv_file(&rows, &out)?;
            output::success(format!("{written} filas exportadas a {}.", out.display()));
        }
        other => {
            return Err(PaymentsError::InvalidInput(format!(
                "unknown command `{other}`\n{USAGE}"
            )))
        }
    }
    Ok(())
}

fn report(report: &IngestReport) {
    output::success(format!(
        "{} insertados, {} omitidos, {} fuentes con error.",
        report.inserted, report.skipped, report.failed_sources
    ));
    for reason in &report.errors {
        output::warning(reason);
    }
}

fn date_arg(invocation: &Invocation, index: usize, name: &str) -> Result<NaiveDate> {
    let raw = invocation.arg(index, name)?;
    parse_user_date(raw)
        .ok_or_else(|| PaymentsError::InvalidInput(format!("`{raw}` is not a valid date")))
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PaymentsError::InvalidInput(format!("<{name}> must be a number, got `{raw}`")))
}

fn year_month_args(invocation: &Invocation) -> Result<(i32, u32)> {
    let year = parse_number(invocation.arg(0, "año")?, "año")?;
    let month: u32 = parse_number(invocation.arg(1, "mes")?, "mes")?;
    if !(1..=12).contains(&month) {
        return Err(PaymentsError::InvalidInput(format!("month {month} is out of range")));
    }
    Ok((year, month))
}

fn optional_year(invocation: &Invocation, index: usize, today: NaiveDate) -> Result<i32> {
    match invocation.optional_arg(index) {
        Some(raw) => parse_number(raw, "año"),
        None => Ok(today.year()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn flags_are_pulled_out_of_positionals() {
        let invocation =
            Invocation::parse(argv(&["delete-day", "--all", "2025-11-20", "--origins=web,manual"]))
                .unwrap();
        assert_eq!(invocation.command, "delete-day");
        assert_eq!(invocation.args, vec!["2025-11-20"]);
        assert!(invocation.all);
        assert_eq!(invocation.origins, Some(vec![Origin::Web, Origin::Manual]));
    }

    #[test]
    fn unknown_flags_and_origins_are_rejected() {
        assert!(Invocation::parse(argv(&["day", "--verbose"])).is_err());
        assert!(Invocation::parse(argv(&["day", "--origins=satellite"])).is_err());
    }

    #[test]
    fn month_arguments_are_validated() {
        let invocation = Invocation::parse(argv(&["month", "2025", "13"])).unwrap();
        assert!(matches!(
            year_month_args(&invocation),
            Err(PaymentsError::InvalidInput(_))
        ));
        let invocation = Invocation::parse(argv(&["month", "2025", "5"])).unwrap();
        assert_eq!(year_month_args(&invocation).unwrap(), (2025, 5));
    }

    #[test]
    fn missing_argument_mentions_its_name() {
        let invocation = Invocation::parse(argv(&["day"])).unwrap();
        let err = date_arg(&invocation, 0, "fecha").unwrap_err();
        assert!(err.to_string().contains("<fecha>"));
    }
}
