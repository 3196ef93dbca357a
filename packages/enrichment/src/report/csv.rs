//! CSV report writer.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding for accented product names.

use async_trait::async_trait;
use chrono::Local;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use super::ReportTable;
use crate::error::ReportError;
use crate::traits::report::ReportWriter;
use crate::types::summary::ReportRef;

const BOM: &[u8] = "\u{feff}".as_bytes();

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one row, quoting fields that need it.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

/// Render a whole table, header row first.
pub fn render(table: &ReportTable) -> io::Result<Vec<u8>> {
    let mut out = BOM.to_vec();
    write_row(&mut out, &table.headers)?;
    for row in &table.rows {
        write_row(&mut out, row)?;
    }
    Ok(out)
}

/// Writes reports as timestamped CSV files in an exports directory.
#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    exports_dir: PathBuf,
    url_prefix: String,
}

impl CsvReportWriter {
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
            url_prefix: "/exports".to_string(),
        }
    }

    /// Prefix of the download reference (default `/exports`).
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// `{integration}_produtos_{YYYYMMDD_HHMMSS}.csv`
    pub fn file_name(integration: &str) -> String {
        format!(
            "{}_produtos_{}.csv",
            integration,
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }
}

#[async_trait]
impl ReportWriter for CsvReportWriter {
    async fn write_report(&self, table: &ReportTable) -> Result<ReportRef, ReportError> {
        let bytes = render(table)?;

        tokio::fs::create_dir_all(&self.exports_dir).await?;
        let file_name = Self::file_name(&table.integration);
        let path = self.exports_dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        info!(
            path = %path.display(),
            rows = table.rows.len(),
            "Report written"
        );

        Ok(ReportRef {
            path: path.display().to_string(),
            download_url: format!("{}/{}", self.url_prefix, file_name),
            rows: table.rows.len(),
        })
    }
}
