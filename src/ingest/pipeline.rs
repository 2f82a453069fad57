//! Drives external producers through the parser into the store.
//!
//! Every unit (table row, text line, web source, PDF file) is handled on its own: a bad
//! unit is counted and skipped, it never aborts the batch. Only a missing capability or a
//! store failure is returned as an error.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::core::campaign::{CampaignCalendar, DateWindow, WindowKind};
use crate::core::utils::{
    checked_date, context_window, parse_user_date, spanish_month, strip_accents_lower,
};
use crate::domain::{Fund, FundSet, Origin, PaymentRecord, RecordDraft};
use crate::errors::{PaymentsError, Result};
use crate::storage::PaymentStore;

use super::classifier::{FundClassifier, KeywordClassifier, MentionShape};
use super::parser::{clean_label, truncate_chars, year_hint, SpanishDateRangeParser, MONTH_NOTE_PREFIX};
use super::sources::{
    DocumentFetcher, PdfTextExtractor, UnavailableExtractor, UnavailableFetcher, WebSource,
    WebSourceKind,
};
use super::table::{decode_latin1, yes_cell, Table};

pub const MAX_REPORTED_ERRORS: usize = 10;
pub const DEFAULT_CONTEXT_WINDOW: usize = 120;
/// Single dates look slightly further than ranges for their payment vocabulary.
const DAY_CONTEXT_EXTRA: usize = 20;
pub const CALENDAR_TABLE_SOURCE: &str = "Excel Aragón (Calendario)";
const UNCLASSIFIED_RANGE_KIND: &str = "Pago/ventana";
const TITLE_LIMIT: usize = 120;
const NEWS_KEYWORDS: [&str; 5] = ["anticipo", "saldo", "ecorreg", "asociad", "pago"];

const MONTH_COLUMNS: [&str; 1] = ["mes"];
const ACTIVITY_COLUMNS: [&str; 4] = ["actividad", "observaciones", "descripcion", "descripción"];
const FEAGA_COLUMNS: [&str; 2] = ["ayuda feaga", "feaga"];
const FEADER_COLUMNS: [&str; 2] = ["ayuda feader", "feader"];
const DATE_COLUMNS: [&str; 4] = ["fecha", "día", "dia", "date"];
const KIND_COLUMNS: [&str; 5] = ["tipo", "concepto", "pago", "descripcion", "descripción"];
const FUND_COLUMNS: [&str; 5] = ["fondo", "feaga", "feader", "linea", "línea"];
const DETAIL_COLUMNS: [&str; 6] = ["detalle", "descripcion", "descripción", "observaciones", "nota", "obs"];
const SOURCE_COLUMNS: [&str; 4] = ["fuente", "source", "url", "enlace"];

static HTML_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)href="([^"]+)"[^>]*>(.*?)</a>"#).expect("valid link regex")
});
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("valid tag regex"));
static DMY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]20\d{2}").expect("valid date regex"));

/// Outcome of one ingestion action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed_sources: usize,
    /// First few human-readable skip/failure reasons.
    pub errors: Vec<String>,
}

impl IngestReport {
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skipped += 1;
        self.note(reason.into());
    }

    pub fn fail_source(&mut self, source: &str, reason: impl std::fmt::Display) {
        self.failed_sources += 1;
        warn!(source, %reason, "ingestion source failed");
        self.note(format!("{source}: {reason}"));
    }

    pub fn merge(&mut self, other: IngestReport) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.failed_sources += other.failed_sources;
        for reason in other.errors {
            self.note(reason);
        }
    }

    fn note(&mut self, reason: String) {
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(reason);
        }
    }
}

/// A text corpus and where it came from.
#[derive(Debug, Clone, Copy)]
pub struct TextDocument<'a> {
    /// Short name used in details, e.g. a file name.
    pub name: &'a str,
    /// Full reference stored as the record source, e.g. a path or URL.
    pub reference: &'a str,
    pub text: &'a str,
}

/// Which spreadsheet layout a table was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    Calendar {
        month: usize,
        activity: usize,
        feaga: Option<usize>,
        feader: Option<usize>,
    },
    Dated {
        date: usize,
        kind: usize,
        detail: usize,
        fund: Option<usize>,
        source: Option<usize>,
    },
}

impl TableLayout {
    pub fn detect(table: &Table) -> Option<TableLayout> {
        let month = table.find_column(&MONTH_COLUMNS);
        let activity = table.find_column(&ACTIVITY_COLUMNS);
        let feaga = table.find_column(&FEAGA_COLUMNS);
        let feader = table.find_column(&FEADER_COLUMNS);
        if let (Some(month), Some(activity)) = (month, activity) {
            if feaga.is_some() || feader.is_some() {
                return Some(TableLayout::Calendar {
                    month,
                    activity,
                    feaga,
                    feader,
                });
            }
        }
        let date = table.find_column(&DATE_COLUMNS)?;
        let kind = table.find_column(&KIND_COLUMNS)?;
        let detail = table.find_column(&DETAIL_COLUMNS)?;
        Some(TableLayout::Dated {
            date,
            kind,
            detail,
            fund: table.find_column(&FUND_COLUMNS),
            source: table.find_column(&SOURCE_COLUMNS),
        })
    }
}

pub struct IngestionPipeline {
    store: Arc<dyn PaymentStore>,
    classifier: Arc<dyn FundClassifier>,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn PdfTextExtractor>,
    context_window: usize,
}

impl IngestionPipeline {
    /// Pipeline with keyword classification and no network or PDF capability.
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self {
            store,
            classifier: Arc::new(KeywordClassifier),
            fetcher: Arc::new(UnavailableFetcher),
            extractor: Arc::new(UnavailableExtractor),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn FundClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PdfTextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_context_window(mut self, chars: usize) -> Self {
        self.context_window = chars;
        self
    }

    pub fn store(&self) -> &Arc<dyn PaymentStore> {
        &self.store
    }

    pub fn can_fetch(&self) -> bool {
        self.fetcher.is_available()
    }

    pub fn can_extract_pdf(&self) -> bool {
        self.extractor.is_available()
    }

    /// Scans a document for date expressions that name their month. Ranges without payment
    /// vocabulary are kept as generic windows; unclassified single dates are ignored.
    pub fn ingest_text(
        &self,
        doc: TextDocument<'_>,
        origin: Origin,
        default_year: i32,
    ) -> Result<IngestReport> {
        ensure_ingest_origin(origin)?;
        let mut report = IngestReport::default();
        let year = year_hint(doc.text).unwrap_or(default_year);
        let normalized = strip_accents_lower(doc.text);

        let mut offset = 0;
        for line in normalized.split('\n') {
            let (mentions, errors) = SpanishDateRangeParser::scan_mentions(line, year);
            for err in errors {
                report.skip(format!("{}: {err}", doc.name));
            }
            for mention in mentions {
                let (lo, hi) = (offset + mention.span.0, offset + mention.span.1);
                let (shape, radius) = if mention.is_range {
                    (MentionShape::Range, self.context_window)
                } else {
                    (MentionShape::Day, self.context_window + DAY_CONTEXT_EXTRA)
                };
                let window = context_window(&normalized, lo, hi, radius);
                let classified = self.classifier.classify(window, shape);

                let draft = match (classified, mention.is_range) {
                    (Some(found), true) => RecordDraft::new(
                        found.kind,
                        found.fund,
                        format!("Ventana detectada en {}", doc.name),
                        doc.reference,
                        origin,
                    ),
                    (None, true) => RecordDraft::new(
                        UNCLASSIFIED_RANGE_KIND,
                        Fund::Unknown,
                        format!("Ventana detectada en {}", doc.name),
                        doc.reference,
                        origin,
                    ),
                    (Some(found), false) => RecordDraft::new(
                        found.kind,
                        found.fund,
                        format!("Fecha mencionada en {}", doc.name),
                        doc.reference,
                        origin,
                    ),
                    (None, false) => continue,
                };
                if mention.start > mention.end {
                    report.skip(format!(
                        "{}: rango invertido {}..{}",
                        doc.name, mention.start, mention.end
                    ));
                    continue;
                }
                report.inserted += self.store.add_range(mention.start, mention.end, &draft)?;
            }
            offset += line.len() + 1;
        }
        info!(source = doc.name, inserted = report.inserted, skipped = report.skipped, "text ingested");
        Ok(report)
    }

    /// Regional calendar layout: one row per month activity, yes/no fund columns. Rows
    /// without any fund become a month-level note of unknown fund.
    pub fn ingest_calendar_table(
        &self,
        table: &Table,
        layout: TableLayout,
        year: i32,
        origin: Origin,
    ) -> Result<IngestReport> {
        ensure_ingest_origin(origin)?;
        let TableLayout::Calendar {
            month,
            activity,
            feaga,
            feader,
        } = layout
        else {
            return Err(PaymentsError::InvalidInput("table is not in calendar layout".into()));
        };
        let mut report = IngestReport::default();

        for (i, row) in table.rows.iter().enumerate() {
            let row_no = i + 2;
            let month_text = table.cell(row, month);
            let Some(month_no) = spanish_month(month_text) else {
                report.skip(format!("Fila {row_no}: mes inválido '{month_text}'"));
                continue;
            };
            let activity_text = table.cell(row, activity);
            if activity_text.is_empty() {
                report.skip(format!("Fila {row_no}: actividad vacía"));
                continue;
            }
            let funds = FundSet::new(
                feaga.is_some_and(|c| yes_cell(table.cell(row, c))),
                feader.is_some_and(|c| yes_cell(table.cell(row, c))),
            );

            if funds.is_empty() {
                let first_line = activity_text.lines().next().unwrap_or(activity_text);
                let (kind, detail) = clean_label(first_line);
                let date = match checked_date(year, month_no, 1) {
                    Ok(date) => date,
                    Err(err) => {
                        report.skip(format!("Fila {row_no}: {err}"));
                        continue;
                    }
                };
                let record = PaymentRecord::new(
                    date,
                    kind,
                    Fund::Unknown,
                    format!("{MONTH_NOTE_PREFIX}{detail}"),
                    CALENDAR_TABLE_SOURCE,
                    origin,
                );
                if self.store.add(record)? {
                    report.inserted += 1;
                }
                continue;
            }

            for line in activity_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                let parsed = match SpanishDateRangeParser::parse_line(line, year, month_no) {
                    Ok(Some(parsed)) => parsed,
                    Ok(None) => continue,
                    Err(err) => {
                        report.skip(format!("Fila {row_no}: {err}"));
                        continue;
                    }
                };
                if parsed.is_reversed() {
                    report.skip(format!(
                        "Fila {row_no}: rango invertido {}..{}",
                        parsed.start, parsed.end
                    ));
                    continue;
                }
                for fund in funds.funds() {
                    let draft = RecordDraft::new(
                        parsed.kind.clone(),
                        fund,
                        parsed.detail.clone(),
                        CALENDAR_TABLE_SOURCE,
                        origin,
                    );
                    report.inserted += self.store.add_range(parsed.start, parsed.end, &draft)?;
                }
            }
        }
        info!(year, inserted = report.inserted, skipped = report.skipped, "calendar table ingested");
        Ok(report)
    }

    /// Generic layout: one dated record per row.
    pub fn ingest_dated_table(
        &self,
        table: &Table,
        layout: TableLayout,
        origin: Origin,
    ) -> Result<IngestReport> {
        ensure_ingest_origin(origin)?;
        let TableLayout::Dated {
            date,
            kind,
            detail,
            fund,
            source,
        } = layout
        else {
            return Err(PaymentsError::InvalidInput("table is not in dated layout".into()));
        };
        let mut report = IngestReport::default();

        for (i, row) in table.rows.iter().enumerate() {
            let row_no = i + 2;
            let raw_date = table.cell(row, date);
            let Some(day) = parse_user_date(raw_date) else {
                report.skip(format!("Fila {row_no}: fecha inválida '{raw_date}'"));
                continue;
            };
            let kind_text = table.cell(row, kind);
            let detail_text = table.cell(row, detail);
            if kind_text.is_empty() || detail_text.is_empty() {
                report.skip(format!("Fila {row_no}: falta Tipo/Detalle"));
                continue;
            }
            let fund = fund.map_or(Fund::Unknown, |c| Fund::from_label(table.cell(row, c)));
            let source_text = source.map_or("", |c| table.cell(row, c));
            let record = PaymentRecord::new(day, kind_text, fund, detail_text, source_text, origin);
            if self.store.add(record)? {
                report.inserted += 1;
            }
        }
        info!(inserted = report.inserted, skipped = report.skipped, "dated table ingested");
        Ok(report)
    }

    /// Imports a table in whichever layout its headers describe.
    pub fn ingest_table(&self, table: &Table, year: i32, origin: Origin) -> Result<IngestReport> {
        match TableLayout::detect(table) {
            Some(layout @ TableLayout::Calendar { .. }) => {
                self.ingest_calendar_table(table, layout, year, origin)
            }
            Some(layout @ TableLayout::Dated { .. }) => self.ingest_dated_table(table, layout, origin),
            None => Err(PaymentsError::InvalidInput(format!(
                "no encuentro columnas mínimas (Mes/Actividad/FEAGA/FEADER o Fecha/Tipo/Detalle); columnas detectadas: {}",
                table.headers.join(", ")
            ))),
        }
    }

    pub fn ingest_csv_file(&self, path: &Path, year: i32, origin: Origin) -> Result<IngestReport> {
        let table = Table::from_file(path)?;
        if table.is_empty() {
            return Ok(IngestReport::default());
        }
        self.ingest_table(&table, year, origin)
    }

    /// Extracts and scans every `.pdf` directly inside `folder`.
    pub fn ingest_pdf_folder(
        &self,
        folder: &Path,
        default_year: i32,
        origin: Origin,
    ) -> Result<IngestReport> {
        if !self.extractor.is_available() {
            return Err(PaymentsError::Unavailable("PDF".into()));
        }
        if !folder.is_dir() {
            return Err(PaymentsError::InvalidInput(format!(
                "folder `{}` does not exist",
                folder.display()
            )));
        }
        let mut pdfs: Vec<PathBuf> = fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        pdfs.sort();

        let mut report = IngestReport::default();
        for pdf in &pdfs {
            let reference = pdf.display().to_string();
            let name = pdf
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(reference.as_str())
                .to_string();
            let text = match self.extractor.extract_text(pdf) {
                Ok(text) => text,
                Err(err) => {
                    report.fail_source(&name, err);
                    continue;
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            let doc = TextDocument {
                name: &name,
                reference: &reference,
                text: &text,
            };
            report.merge(self.ingest_text(doc, origin, default_year)?);
        }
        info!(folder = %folder.display(), files = pdfs.len(), inserted = report.inserted, "pdf folder ingested");
        Ok(report)
    }

    /// Fetches each source independently; failures are counted and the rest continue.
    pub fn ingest_web(&self, sources: &[WebSource], default_year: i32) -> Result<IngestReport> {
        if !self.fetcher.is_available() {
            return Err(PaymentsError::Unavailable("HTTP".into()));
        }
        let mut report = IngestReport::default();
        for source in sources {
            let body = match self.fetcher.fetch(&source.url) {
                Ok(body) => body,
                Err(err) => {
                    report.fail_source(&source.label, err);
                    continue;
                }
            };
            let inserted = match source.kind {
                WebSourceKind::AnticipoNote => {
                    self.store_note(source, &decode_latin1(&body), WindowKind::Anticipo, default_year)?
                }
                WebSourceKind::SaldoNote => {
                    self.store_note(source, &decode_latin1(&body), WindowKind::Saldo, default_year)?
                }
                WebSourceKind::NewsIndex => {
                    self.store_news_links(source, &String::from_utf8_lossy(&body), default_year)?
                }
                WebSourceKind::GenericHtml => {
                    self.store_fund_links(source, &String::from_utf8_lossy(&body), default_year)?
                }
            };
            info!(source = %source.label, inserted, "web source ingested");
            report.inserted += inserted;
        }
        Ok(report)
    }

    /// Imports the first existing candidate once per year. Returns `None` when nothing was
    /// found or the import already ran.
    pub fn autoload_table(&self, candidates: &[PathBuf], year: i32) -> Result<Option<IngestReport>> {
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Ok(None);
        };
        let key = autoload_key(path, year);
        if self.store.get_meta(&key)?.is_some() {
            return Ok(None);
        }
        let report = self.ingest_csv_file(path, year, Origin::Manual)?;
        self.store.set_meta(&key, "ok")?;
        info!(path = %path.display(), year, inserted = report.inserted, "autoloaded table");
        Ok(Some(report))
    }

    fn store_note(
        &self,
        source: &WebSource,
        content: &str,
        kind: WindowKind,
        default_year: i32,
    ) -> Result<usize> {
        let year = year_hint(content).unwrap_or(default_year);
        let detail = match kind {
            WindowKind::Anticipo => "Ventana general de anticipos (nota FEGA).",
            WindowKind::Saldo => "Ventana general de saldos (nota FEGA).",
        };
        let window = CampaignCalendar::windows_for_campaign(year).window(kind);
        let draft = RecordDraft::new(source.label.as_str(), Fund::Feaga, detail, source.url.as_str(), Origin::Web);
        self.store_window(window, &draft)
    }

    fn store_news_links(&self, source: &WebSource, html: &str, default_year: i32) -> Result<usize> {
        let mut inserted = 0;
        for (href, title) in html_links(html) {
            let lowered = strip_accents_lower(&title);
            if !NEWS_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                continue;
            }
            let year = DMY_DATE
                .find(&format!("{href} {title}"))
                .and_then(|m| parse_user_date(m.as_str()))
                .map(|d| chrono::Datelike::year(&d))
                .unwrap_or(default_year);
            let (kind, detail) = if ["anticipo", "ecorreg", "asociad"].iter().any(|k| lowered.contains(k)) {
                (WindowKind::Anticipo, "Ventana general (anticipo) detectada en noticias FEGA.")
            } else if lowered.contains("saldo") {
                (WindowKind::Saldo, "Ventana general (saldo) detectada en noticias FEGA.")
            } else {
                continue;
            };
            let draft = RecordDraft::new(
                format!("[{}] {}", source.label, truncate_chars(&title, TITLE_LIMIT)),
                Fund::Feaga,
                detail,
                link_source(&href, &source.url),
                Origin::Web,
            );
            let window = CampaignCalendar::windows_for_campaign(year).window(kind);
            inserted += self.store_window(window, &draft)?;
        }
        Ok(inserted)
    }

    fn store_fund_links(&self, source: &WebSource, html: &str, default_year: i32) -> Result<usize> {
        let mut inserted = 0;
        for (href, title) in html_links(html) {
            let lowered = strip_accents_lower(&title);
            let fund = if lowered.contains("feaga") {
                Fund::Feaga
            } else if lowered.contains("feader") {
                Fund::Feader
            } else {
                continue;
            };
            let year = year_hint(&format!("{href} {title}")).unwrap_or(default_year);
            let (kind, detail) = if lowered.contains("anticipo") {
                (WindowKind::Anticipo, "Ventana (anticipo) detectada.")
            } else if lowered.contains("saldo") {
                (WindowKind::Saldo, "Ventana (saldo) detectada.")
            } else {
                continue;
            };
            let draft = RecordDraft::new(
                format!("[{}] {}", source.label, truncate_chars(&title, TITLE_LIMIT)),
                fund,
                detail,
                link_source(&href, &source.url),
                Origin::Web,
            );
            let window = CampaignCalendar::windows_for_campaign(year).window(kind);
            inserted += self.store_window(window, &draft)?;
        }
        Ok(inserted)
    }

    fn store_window(&self, window: DateWindow, draft: &RecordDraft) -> Result<usize> {
        self.store.add_range(window.start, window.end, draft)
    }
}

/// Store metadata key guarding a one-time import, e.g. `autoload_aragon_2025`.
pub fn autoload_key(path: &Path, year: i32) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| strip_accents_lower(s).replace(|c: char| !c.is_ascii_alphanumeric(), "_"))
        .unwrap_or_else(|| "table".to_string());
    format!("autoload_{stem}_{year}")
}

fn ensure_ingest_origin(origin: Origin) -> Result<()> {
    if origin.is_concrete() {
        Ok(())
    } else {
        Err(PaymentsError::InvalidInput(format!(
            "ingested records must be manual or web, not {origin}"
        )))
    }
}

/// `(href, text)` for every anchor with non-empty text.
fn html_links(html: &str) -> Vec<(String, String)> {
    HTML_LINK
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps.get(1)?.as_str().to_string();
            let title = HTML_TAG.replace_all(caps.get(2)?.as_str(), "").trim().to_string();
            (!title.is_empty()).then_some((href, title))
        })
        .collect()
}

fn link_source(href: &str, page: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        page.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OriginFilter;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pipeline() -> IngestionPipeline {
        IngestionPipeline::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn report_keeps_only_first_reasons() {
        let mut report = IngestReport::default();
        for i in 0..25 {
            report.skip(format!("Fila {i}"));
        }
        assert_eq!(report.skipped, 25);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    }

    #[test]
    fn text_ranges_are_classified_by_nearby_words() {
        let pipeline = pipeline();
        let text = "Nota FEGA campaña 2024\nEl anticipo se abonará del 16 al 31 de octubre.\n";
        let doc = TextDocument {
            name: "nota.pdf",
            reference: "/tmp/nota.pdf",
            text,
        };
        let report = pipeline.ingest_text(doc, Origin::Manual, 2030).unwrap();
        assert_eq!(report.inserted, 16);
        let rows = pipeline
            .store()
            .get_day(day(2024, 10, 20), &OriginFilter::any())
            .unwrap();
        assert_eq!(rows[0].kind, "Anticipo ayudas directas");
        assert_eq!(rows[0].detail, "Ventana detectada en nota.pdf");
        assert_eq!(rows[0].source, "/tmp/nota.pdf");
    }

    #[test]
    fn heuristic_origin_cannot_be_ingested() {
        let doc = TextDocument {
            name: "x",
            reference: "x",
            text: "del 1 al 2 de mayo",
        };
        assert!(matches!(
            pipeline().ingest_text(doc, Origin::Heuristic, 2025),
            Err(PaymentsError::InvalidInput(_))
        ));
    }

    #[test]
    fn layout_detection() {
        let calendar = Table::new(vec!["Mes".into(), "Actividad".into(), "Ayuda FEADER".into()], vec![]);
        assert!(matches!(TableLayout::detect(&calendar), Some(TableLayout::Calendar { feaga: None, .. })));
        let dated = Table::new(vec!["Fecha".into(), "Tipo".into(), "Detalle".into()], vec![]);
        assert!(matches!(TableLayout::detect(&dated), Some(TableLayout::Dated { fund: None, .. })));
        let unknown = Table::new(vec!["Columna".into()], vec![]);
        assert!(TableLayout::detect(&unknown).is_none());
    }

    #[test]
    fn links_drop_markup() {
        let html = r#"<li><a href="/es/noticias/anticipo-2025"><span>Pago del <b>anticipo</b></span></a></li>
                      <a href="https://x.es/y">  </a>"#;
        let links = html_links(html);
        assert_eq!(links, vec![("/es/noticias/anticipo-2025".to_string(), "Pago del anticipo".to_string())]);
    }

    #[test]
    fn autoload_key_uses_file_stem() {
        assert_eq!(autoload_key(Path::new("/data/Aragón.csv"), 2025), "autoload_aragon_2025");
    }
}
