//! Raw record parsing.
//!
//! One record is one delimited line of the input log. Parsing is deliberately
//! permissive: anything that cannot be recovered is skipped, never surfaced
//! as an error, matching the upstream log producer's behavior.

use chrono::{Datelike, NaiveDate};
use report_core::models::{Reading, MAX_DEVICE_NAME, SENSOR_COUNT};
use tracing::trace;

/// Maximum number of fields recovered from one record.
const MAX_FIELDS: usize = 12;

/// Minimum number of fields for a record to be usable (device, date and all
/// six sensor positions must be present).
const MIN_FIELDS: usize = 10;

/// Field position of the device name.
const DEVICE_FIELD: usize = 1;

/// Field position of the ISO date.
const DATE_FIELD: usize = 3;

/// Field position of the first sensor value; the six sensors occupy
/// consecutive positions from here.
const FIRST_SENSOR_FIELD: usize = 4;

// ── ParserOptions ──────────────────────────────────────────────────────────────

/// Strictness switches for the parser.
///
/// The defaults reproduce the upstream format's permissive semantics; the
/// flags exist so callers can opt into rejecting data the upstream tool
/// would have silently coerced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// When `true`, a sensor field with no leading numeric prefix rejects
    /// the whole record instead of folding `0.0`.
    pub strict_numbers: bool,
}

// ── RecordParser ───────────────────────────────────────────────────────────────

/// Pure mapping from one raw record to a [`Reading`], or a silent rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser {
    options: ParserOptions,
}

impl RecordParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parse one raw record.
    ///
    /// Returns `None` — with no error surfaced — when the record has fewer
    /// than [`MIN_FIELDS`] fields, a date that does not parse as
    /// `YYYY-MM-DD`, or a date before the 2024-03 cutoff.
    pub fn parse(&self, line: &str) -> Option<Reading> {
        let fields = split_fields(line);
        if fields.len() < MIN_FIELDS {
            trace!(fields = fields.len(), "record rejected: too few fields");
            return None;
        }

        let date = match NaiveDate::parse_from_str(fields[DATE_FIELD], "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                trace!(date = fields[DATE_FIELD], "record rejected: bad date");
                return None;
            }
        };
        if before_cutoff(date) {
            trace!(%date, "record rejected: before cutoff");
            return None;
        }

        let device = truncate_device(fields[DEVICE_FIELD]);

        let mut values = [0.0; SENSOR_COUNT];
        for (channel, value) in values.iter_mut().enumerate() {
            let field = fields[FIRST_SENSOR_FIELD + channel];
            match lenient_f64(field) {
                Some(v) => *value = v,
                None if self.options.strict_numbers => {
                    trace!(field, "record rejected: unparsable value (strict)");
                    return None;
                }
                // atof semantics: no numeric prefix degrades to zero.
                None => *value = 0.0,
            }
        }

        Some(Reading {
            device,
            date,
            values,
        })
    }
}

// ── Field splitting ────────────────────────────────────────────────────────────

/// Split a record into at most [`MAX_FIELDS`] non-empty fields.
///
/// The primary delimiter is `|`; when that pass recovers fewer than
/// [`MAX_FIELDS`] fields, the trailing field is re-split on `;`. This
/// two-delimiter fallback is part of the source format and is preserved
/// as-is. Consecutive delimiters collapse (empty fields are skipped).
fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);

    let mut fields: Vec<&str> = line
        .split('|')
        .filter(|f| !f.is_empty())
        .take(MAX_FIELDS)
        .collect();

    if fields.len() < MAX_FIELDS {
        if let Some(last) = fields.pop() {
            let remaining = MAX_FIELDS - fields.len();
            fields.extend(last.split(';').filter(|f| !f.is_empty()).take(remaining));
        }
    }

    fields
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Records dated before 2024-03 are outside the reporting window.
fn before_cutoff(date: NaiveDate) -> bool {
    date.year() < 2024 || (date.year() == 2024 && date.month() < 3)
}

/// Truncate a device name to [`MAX_DEVICE_NAME`] bytes on a character
/// boundary. Truncation is not an error.
fn truncate_device(name: &str) -> String {
    if name.len() <= MAX_DEVICE_NAME {
        return name.to_string();
    }
    let mut end = MAX_DEVICE_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// Convert text to `f64` with `atof` semantics: parse the longest valid
/// leading numeric prefix, ignoring leading whitespace.
///
/// Returns `None` when no prefix parses at all (the caller decides between
/// zero-degradation and rejection).
fn lenient_f64(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    for end in (1..=trimmed.len()).rev() {
        if !trimmed.is_char_boundary(end) {
            continue;
        }
        if let Ok(value) = trimmed[..end].parse::<f64>() {
            return Some(value);
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
