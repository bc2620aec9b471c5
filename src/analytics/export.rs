// src/analytics/export.rs
use anyhow::{bail, Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

use crate::core::FsOps;

/// Text of one cell as it appears in tables and exports
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Column set of the first row, in its key order
pub fn columns(rows: &[Map<String, Value>]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Serialize rows as CSV: header plus one line per row, every field quoted
pub fn rows_to_csv(rows: &[Map<String, Value>]) -> Result<String> {
    if rows.is_empty() {
        bail!("No data to export");
    }

    let columns = columns(rows);
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(&columns)
        .context("Failed to write CSV header")?;
    for row in rows {
        let record: Vec<String> = columns.iter().map(|c| cell_text(row.get(c))).collect();
        writer
            .write_record(&record)
            .context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub async fn export_csv(rows: &[Map<String, Value>], path: &Path) -> Result<usize> {
    let content = rows_to_csv(rows)?;
    FsOps::write_file_safe(path, &content).await?;
    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}
