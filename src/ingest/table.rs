//! Row/column view over spreadsheet exports.

use std::{fs, path::Path};

use crate::core::utils::strip_accents_lower;
use crate::errors::Result;

/// Header row plus data rows, every cell kept as text. Short rows read as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parses CSV text, picking `;` or `,` from the header line.
    pub fn from_string(s: &str) -> Result<Self> {
        let s = s.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(s.lines().next().unwrap_or(""));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(s.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = reader
            .records()
            .map(|r| r.map(|record| record.iter().map(|c| c.to_string()).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self { headers, rows })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            // Spanish spreadsheet exports are frequently Windows-1252/latin-1.
            Err(err) => decode_latin1(err.as_bytes()),
        };
        Self::from_string(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column whose normalized header equals one of `candidates`, else the first one that
    /// contains a candidate.
    pub fn find_column(&self, candidates: &[&str]) -> Option<usize> {
        let wanted: Vec<String> = candidates.iter().map(|c| normalize_header(c)).collect();
        let normalized: Vec<String> = self.headers.iter().map(|h| normalize_header(h)).collect();
        normalized
            .iter()
            .position(|h| wanted.iter().any(|w| w == h))
            .or_else(|| {
                normalized
                    .iter()
                    .position(|h| !h.is_empty() && wanted.iter().any(|w| h.contains(w.as_str())))
            })
    }

    pub fn cell<'a>(&'a self, row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(|c| c.trim()).unwrap_or("")
    }
}

/// Header key: accent-free lower-case letters only.
pub fn normalize_header(raw: &str) -> String {
    strip_accents_lower(raw)
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// `Sí`, `si`, `SI (parcial)`... count as yes.
pub fn yes_cell(raw: &str) -> bool {
    strip_accents_lower(raw).trim().starts_with("si")
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn sniff_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons >= commas && semicolons > 0 {
        b';'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_exports_are_detected() {
        let table = Table::from_string("Mes;Actividad;Ayuda FEAGA\nMayo;del 3 al 5, pago;Sí\n").unwrap();
        assert_eq!(table.headers, vec!["Mes", "Actividad", "Ayuda FEAGA"]);
        assert_eq!(table.rows[0][1], "del 3 al 5, pago");
    }

    #[test]
    fn comma_exports_and_short_rows() {
        let table = Table::from_string("fecha,tipo,detalle\n03/05/2025,Pago\n").unwrap();
        let row = &table.rows[0];
        assert_eq!(table.cell(row, 1), "Pago");
        assert_eq!(table.cell(row, 2), "");
    }

    #[test]
    fn column_lookup_prefers_exact_then_substring() {
        let table = Table::new(
            vec!["Mes".into(), "Ayuda FEADER".into(), "Descripción".into(), "FEAGA".into()],
            vec![],
        );
        assert_eq!(table.find_column(&["feaga"]), Some(3));
        assert_eq!(table.find_column(&["feader"]), Some(1));
        assert_eq!(table.find_column(&["actividad", "descripcion"]), Some(2));
        assert_eq!(table.find_column(&["fuente"]), None);
    }

    #[test]
    fn yes_cells() {
        assert!(yes_cell(" Sí"));
        assert!(yes_cell("SI"));
        assert!(!yes_cell("No"));
        assert!(!yes_cell(""));
    }
}
