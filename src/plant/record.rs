//! Per-tick result records and the append-only result log.
//!
//! The log is the plant's only output artifact: index `i` holds the state
//! after tick `i + 1`. Records are never changed after they are appended.

use std::io::Write;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Instantaneous power draw split by consumer (kW).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerBreakdown {
    /// Constant baseload.
    pub baseload_power: f64,
    /// Production pumps and treatment.
    pub production_power: f64,
    /// Distribution pumps.
    pub distribution_power: f64,
    /// Backwash pumps.
    pub backwash_power: f64,
}

impl PowerBreakdown {
    /// Sum of all consumers.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.baseload_power + self.production_power + self.distribution_power + self.backwash_power
    }
}

/// Immutable snapshot of the plant after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Tick number (1-based).
    pub step: u64,
    /// Timestamp at the end of the tick.
    pub time: NaiveDateTime,
    /// Reservoir content (m³).
    pub reservoir_volume: f64,
    /// Reservoir content relative to capacity.
    pub reservoir_level: f64,
    /// Backwash buffer content (m³).
    pub backwash_buffer: f64,
    /// Whether a backwash is still running after this tick.
    pub backwash_active: bool,
    /// Minutes into the running programme (0 when idle).
    pub backwash_step: usize,
    /// Street of the running backwash.
    pub backwash_street: Option<usize>,
    /// Filter of the running backwash.
    pub backwash_filter: Option<usize>,
    /// Filters waiting for a backwash.
    pub queue_length: usize,
    /// Production flow decided this tick (m³/h).
    pub production_flow: f64,
    /// Demand flow supplied this tick (m³/h).
    pub distribution_flow: f64,
    /// Backwash flow drawn this tick (m³/h).
    pub backwash_flow: f64,
    /// Power draw per consumer (kW).
    #[serde(flatten)]
    pub power: PowerBreakdown,
    /// Total power draw (kW).
    pub total_power: f64,
}

/// Mean power over one quarter-hour settlement period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterHourPower {
    /// Start of the period.
    pub start: NaiveDateTime,
    /// Ticks that fell in the period.
    pub samples: usize,
    /// Mean total power (kW).
    pub mean_power: f64,
}

/// Append-only log of tick records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultLog {
    records: Vec<TickRecord>,
}

impl ResultLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return it.
    pub(crate) fn push(&mut self, record: TickRecord) -> &TickRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// All records, in tick order.
    #[must_use]
    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    /// Record of the `index`-th tick (0-based).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TickRecord> {
        self.records.get(index)
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&TickRecord> {
        self.records.last()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in tick order.
    pub fn iter(&self) -> std::slice::Iter<'_, TickRecord> {
        self.records.iter()
    }

    /// Mean total power per clock-aligned quarter hour.
    ///
    /// Periods start at :00, :15, :30 and :45; a period is reported only if
    /// at least one tick falls in it.
    #[must_use]
    pub fn quarter_hour_power(&self) -> Vec<QuarterHourPower> {
        let mut periods: Vec<QuarterHourPower> = Vec::new();
        for record in &self.records {
            let start = quarter_hour_floor(record.time);
            match periods.last_mut() {
                Some(period) if period.start == start => {
                    period.samples += 1;
                    period.mean_power += record.total_power;
                }
                _ => periods.push(QuarterHourPower {
                    start,
                    samples: 1,
                    mean_power: record.total_power,
                }),
            }
        }
        for period in &mut periods {
            period.mean_power /= period.samples as f64;
        }
        periods
    }

    /// BLAKE3 fingerprint of the serialized log.
    ///
    /// Two runs of the same configuration produce the same fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if a record cannot be encoded.
    pub fn fingerprint(&self) -> SimResult<String> {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            let bytes = serde_json::to_vec(record)?;
            hasher.update(&bytes);
            hasher.update(b"\n");
        }
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Write one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` errors from the writer.
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> SimResult<()> {
        for record in &self.records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a TickRecord;
    type IntoIter = std::slice::Iter<'a, TickRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn quarter_hour_floor(time: NaiveDateTime) -> NaiveDateTime {
    let minute = time.minute() - time.minute() % 15;
    time.with_minute(minute)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}
