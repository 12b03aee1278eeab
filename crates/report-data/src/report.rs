//! Grouped report rendering.
//!
//! Takes the rows re-read from the summary artifact, orders them by
//! (device, sensor, year-month), and renders a per-device grouped view with
//! one header line per device.

use report_core::formatting::{format_stat, format_year_month};
use report_core::models::SummaryRow;

/// Sort rows by device, then sensor name, then year-month.
///
/// String comparisons are plain byte-ordinal, matching the artifact's
/// ASCII field content.
pub fn sort_rows(rows: &mut [SummaryRow]) {
    rows.sort_by(|a, b| {
        a.device
            .cmp(&b.device)
            .then_with(|| a.sensor.cmp(&b.sensor))
            .then_with(|| a.year_month.cmp(&b.year_month))
    });
}

/// Render the grouped per-device view.
///
/// A device header precedes the device's first row and never repeats; the
/// caller is expected to have sorted the rows first (see [`sort_rows`]).
pub fn render_grouped(rows: &[SummaryRow]) -> String {
    let mut out = String::new();
    let mut current_device: Option<&str> = None;

    for row in rows {
        if current_device != Some(row.device.as_str()) {
            if current_device.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("Dispositivo: {}\n", row.device));
            current_device = Some(row.device.as_str());
        }
        out.push_str(&format!(
            "  {}  {:<12}  max {:>10}  media {:>10}  min {:>10}\n",
            format_year_month(row.year_month),
            row.sensor,
            format_stat(row.max),
            format_stat(row.mean),
            format_stat(row.min),
        ));
    }

    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
