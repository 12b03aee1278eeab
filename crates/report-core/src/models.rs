use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of sensor channels carried by every record.
pub const SENSOR_COUNT: usize = 6;

/// Maximum stored length of a device name, in bytes. Longer names are
/// truncated, never rejected.
pub const MAX_DEVICE_NAME: usize = 64;

/// Earliest admissible reading, encoded as `year * 100 + month`.
/// Records dated before 2024-03 are silently dropped.
pub const CUTOFF_YEAR_MONTH: u32 = 202403;

// ── Sensor ─────────────────────────────────────────────────────────────────────

/// One of the six sensor channels, in the fixed order they appear in the
/// input record (fields 4 through 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sensor {
    Temperature,
    Humidity,
    Luminosity,
    Noise,
    Eco2,
    Etvoc,
}

impl Sensor {
    /// All sensors in record order. `ALL[i]` is the sensor at channel `i`.
    pub const ALL: [Sensor; SENSOR_COUNT] = [
        Sensor::Temperature,
        Sensor::Humidity,
        Sensor::Luminosity,
        Sensor::Noise,
        Sensor::Eco2,
        Sensor::Etvoc,
    ];

    /// The channel index (0..5) of this sensor.
    pub fn index(self) -> usize {
        match self {
            Sensor::Temperature => 0,
            Sensor::Humidity => 1,
            Sensor::Luminosity => 2,
            Sensor::Noise => 3,
            Sensor::Eco2 => 4,
            Sensor::Etvoc => 5,
        }
    }

    /// Look up a sensor by channel index.
    pub fn from_index(index: usize) -> Option<Sensor> {
        Sensor::ALL.get(index).copied()
    }

    /// The name used for this sensor in the summary artifact.
    ///
    /// These strings come from the upstream log format and are part of the
    /// output contract; they are not translated.
    pub fn label(self) -> &'static str {
        match self {
            Sensor::Temperature => "Temperatura",
            Sensor::Humidity => "Umidade",
            Sensor::Luminosity => "Luminosidade",
            Sensor::Noise => "Ruido",
            Sensor::Eco2 => "eco2",
            Sensor::Etvoc => "etvoc",
        }
    }

    /// Look up a sensor by its summary-artifact label.
    pub fn from_label(label: &str) -> Option<Sensor> {
        Sensor::ALL.into_iter().find(|s| s.label() == label)
    }
}

// ── Reading ────────────────────────────────────────────────────────────────────

/// One accepted input record: a device, the calendar date of the
/// transmission, and all six sensor values.
///
/// Readings are ephemeral — they exist only between the parser and the
/// aggregate store and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Device name, already truncated to [`MAX_DEVICE_NAME`] bytes.
    pub device: String,
    /// Calendar date of the transmission.
    pub date: NaiveDate,
    /// Sensor values indexed by channel ([`Sensor::index`]).
    pub values: [f64; SENSOR_COUNT],
}

impl Reading {
    /// The aggregation bucket for this reading's date, `year * 100 + month`.
    pub fn year_month(&self) -> u32 {
        self.date.year() as u32 * 100 + self.date.month()
    }
}

// ── AggregateKey ───────────────────────────────────────────────────────────────

/// Identity of one statistic bucket: (device, year-month, sensor).
///
/// Equality is structural — string equality on the device, integer equality
/// on the rest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateKey {
    pub device: String,
    /// Bucket month encoded as `year * 100 + month`, e.g. `202403`.
    pub year_month: u32,
    pub sensor: Sensor,
}

// ── AggregateEntry ─────────────────────────────────────────────────────────────

/// Running min/max/sum/count for one [`AggregateKey`].
///
/// The mean is never stored; it is derived as `sum / count` at report time.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateEntry {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl AggregateEntry {
    /// Create an entry from the first folded value.
    pub fn new(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            sum: value,
            count: 1,
        }
    }

    /// Fold one more value into the running statistics.
    pub fn fold(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    /// Arithmetic mean of all folded values.
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

// ── SummaryRow ─────────────────────────────────────────────────────────────────

/// One row of the summary artifact — the display-ready projection of an
/// [`AggregateEntry`], independently re-derivable by re-reading the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub device: String,
    /// Bucket month encoded as `year * 100 + month`; formatted as `YYYY-MM`
    /// on disk.
    pub year_month: u32,
    /// Sensor label as written to the artifact (see [`Sensor::label`]).
    pub sensor: String,
    pub max: f64,
    pub mean: f64,
    pub min: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
