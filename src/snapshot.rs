//! Snapshot - a point-in-time view of monitor state.
//!
//! The [`Snapshot`] is the only aggregate external readers ever observe.
//! It bundles the latest reading, the alert state computed against the
//! baseline carried in the same snapshot, and the recent history, so a
//! reader can never pair a reading with an alert evaluated against some
//! other baseline. Snapshots serialise to the flat JSON shape the polling
//! dashboard consumes.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::channel::Channel;
use crate::frame::ChannelValues;

/// One sampled value per channel at a single instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Per-channel values in frame order.
    pub values: ChannelValues,
    /// Unix timestamp in milliseconds when the frame was captured.
    pub timestamp_ms: u64,
}

impl Reading {
    /// Create a reading captured now.
    pub fn new(values: ChannelValues) -> Self {
        Self {
            values,
            timestamp_ms: current_timestamp_ms(),
        }
    }

    /// Create a reading with a specific capture timestamp.
    pub fn with_timestamp(values: ChannelValues, timestamp_ms: u64) -> Self {
        Self {
            values,
            timestamp_ms,
        }
    }

    /// Value for one channel.
    pub fn value(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }
}

/// Per-channel reference values established by calibration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Baseline(pub ChannelValues);

impl Baseline {
    /// The degraded fallback: zero for every channel.
    pub fn zero() -> Self {
        Self([0.0; Channel::COUNT])
    }

    /// Per-channel arithmetic mean across a set of sampled value arrays.
    ///
    /// Returns the zero baseline when `samples` is empty.
    pub fn mean_of(samples: &[ChannelValues]) -> Self {
        if samples.is_empty() {
            return Self::zero();
        }
        let mut sums = [0.0; Channel::COUNT];
        for sample in samples {
            for (sum, value) in sums.iter_mut().zip(sample) {
                *sum += value;
            }
        }
        let count = samples.len() as f64;
        Self(sums.map(|sum| sum / count))
    }

    /// Reference value for one channel.
    pub fn value(&self, channel: Channel) -> f64 {
        self.0[channel.index()]
    }
}

/// Per-channel alert flags for one cycle.
///
/// Recomputed from scratch every cycle; carries no memory of previous
/// cycles (no hysteresis, no debounce).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertState {
    /// `true` where `reading - baseline > threshold`, in frame order.
    pub triggered: [bool; Channel::COUNT],
}

impl AlertState {
    /// Whether any channel is alerting.
    pub fn any(&self) -> bool {
        self.triggered.iter().any(|&t| t)
    }

    /// Whether a specific channel is alerting.
    pub fn is_triggered(&self, channel: Channel) -> bool {
        self.triggered[channel.index()]
    }

    /// Cause messages for the triggered channels, in frame order.
    pub fn causes(&self) -> Vec<&'static str> {
        Channel::ALL
            .iter()
            .filter(|c| self.is_triggered(**c))
            .map(|c| c.alert_cause())
            .collect()
    }
}

/// A timestamped reading retained for trend display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Per-channel values in frame order.
    pub values: ChannelValues,
}

impl From<Reading> for HistoryEntry {
    fn from(reading: Reading) -> Self {
        Self {
            timestamp_ms: reading.timestamp_ms,
            values: reading.values,
        }
    }
}

// History entries serialise flat: a `timestamp` field in seconds plus one
// field per channel name, matching the dashboard's chart feed.
impl Serialize for HistoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + Channel::COUNT))?;
        map.serialize_entry("timestamp", &(self.timestamp_ms as f64 / 1000.0))?;
        for channel in Channel::ALL {
            map.serialize_entry(channel.name(), &self.values[channel.index()])?;
        }
        map.end()
    }
}

/// The externally visible aggregate of current monitor state.
///
/// Published wholesale after every acquisition cycle and after every
/// administrative mutation; never updated piecemeal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Latest decoded reading, if any frame has been accepted yet.
    pub reading: Option<Reading>,
    /// Alert state computed against `baseline` for `reading`.
    pub alert: AlertState,
    /// Baseline the alert state was evaluated against.
    pub baseline: Baseline,
    /// Recent readings, oldest first.
    pub history: Vec<HistoryEntry>,
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut readings = BTreeMap::new();
        let mut alert_status = BTreeMap::new();
        for channel in Channel::ALL {
            let value = self.reading.map_or(0.0, |r| r.value(channel));
            readings.insert(channel.name(), value);
            alert_status.insert(channel.name(), self.alert.is_triggered(channel));
        }

        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("readings", &readings)?;
        map.serialize_entry("alerts", &self.alert.causes())?;
        map.serialize_entry("baseline", &self.baseline.0.as_slice())?;
        map.serialize_entry("alert_status", &alert_status)?;
        map.serialize_entry("history", &self.history)?;
        map.end()
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
