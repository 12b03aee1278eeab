//! The summary artifact.
//!
//! A semicolon-delimited text file: a fixed header row, then one row per
//! (device, year-month, sensor) with max/mean/min to two decimal places.
//! The file is the durable source of truth for a run; the grouped view is
//! re-derived from it by [`read_summary`], never from in-memory state.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use report_core::error::{ReportError, Result};
use report_core::formatting::{format_stat, format_year_month, parse_year_month};
use report_core::models::SummaryRow;
use tracing::debug;

/// Header row of the summary artifact. Field names come from the upstream
/// tool and are part of the output contract.
pub const SUMMARY_HEADER: &str = "device;ano-mes;sensor;valor_maximo;valor_medio;valor_minimo";

// ── Serialize ──────────────────────────────────────────────────────────────────

/// Write all rows to `path`, header first.
///
/// Row order is whatever the caller provides — the artifact itself carries
/// no ordering guarantee. Any I/O failure is fatal for the run.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<()> {
    let to_write_err = |source: std::io::Error| ReportError::SummaryWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_write_err)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", SUMMARY_HEADER).map_err(to_write_err)?;
    for row in rows {
        writeln!(
            writer,
            "{};{};{};{};{};{}",
            row.device,
            format_year_month(row.year_month),
            row.sensor,
            format_stat(row.max),
            format_stat(row.mean),
            format_stat(row.min),
        )
        .map_err(to_write_err)?;
    }
    writer.flush().map_err(to_write_err)?;

    debug!(rows = rows.len(), path = %path.display(), "summary written");
    Ok(())
}

// ── Deserialize ────────────────────────────────────────────────────────────────

/// Re-read a summary artifact back into rows.
///
/// Unlike input records, the summary file is our own output: a malformed
/// row here is a hard [`ReportError::SummaryParse`], not a silent skip.
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    let file = File::open(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    let mut lines = reader.lines();

    match lines.next() {
        Some(header) => {
            let header = header?;
            if header != SUMMARY_HEADER {
                return Err(ReportError::SummaryParse(format!(
                    "unexpected header: {header}"
                )));
            }
        }
        None => return Err(ReportError::SummaryParse("empty summary file".to_string())),
    }

    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        rows.push(parse_row(&line)?);
    }

    debug!(rows = rows.len(), path = %path.display(), "summary re-read");
    Ok(rows)
}

/// Parse one `device;YYYY-MM;sensor;max;mean;min` row.
fn parse_row(line: &str) -> Result<SummaryRow> {
    let malformed = || ReportError::SummaryParse(line.to_string());

    let fields: Vec<&str> = line.split(';').collect();
    let &[device, year_month, sensor, max, mean, min] = fields.as_slice() else {
        return Err(malformed());
    };

    Ok(SummaryRow {
        device: device.to_string(),
        year_month: parse_year_month(year_month).ok_or_else(malformed)?,
        sensor: sensor.to_string(),
        max: max.parse().map_err(|_| malformed())?,
        mean: mean.parse().map_err(|_| malformed())?,
        min: min.parse().map_err(|_| malformed())?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
