use std::{fs::File, io::Write, path::Path};

use crate::{domain::PaymentRecord, errors::Result};

const HEADER: [&str; 6] = ["fecha", "tipo", "fondo", "detalle", "origen", "fuente"];

/// Writes `records` as `;`-separated rows under the `fecha;tipo;fondo;detalle;origen;fuente`
/// header. Returns the number of data rows.
pub fn export_csv<W: Write>(records: &[PaymentRecord], writer: W) -> Result<usize> {
    let mut out = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    out.write_record(HEADER)?;
    for record in records {
        let date = record.date.format("%Y-%m-%d").to_string();
        out.write_record([
            date.as_str(),
            record.kind.as_str(),
            record.fund.as_str(),
            record.detail.as_str(),
            record.origin.as_str(),
            record.source.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(records.len())
}

pub fn export_csv_file(records: &[PaymentRecord], path: &Path) -> Result<usize> {
    let file = File::create(path)?;
    export_csv(records, file)
}

/// Default export name for a month, e.g. `pagos_2025_11.csv`.
pub fn month_file_name(year: i32, month: u32) -> String {
    format!("pagos_{year}_{month:02}.csv")
}
