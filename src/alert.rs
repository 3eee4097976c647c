//! Alert evaluation.
//!
//! A pure function of (reading, baseline, thresholds). Each cycle's alert
//! state is computed from scratch; there is no hysteresis or debounce.

use crate::channel::{Channel, Thresholds};
use crate::snapshot::{AlertState, Baseline, Reading};

/// Evaluate the alert state for one reading.
///
/// A channel alerts exactly when its reading exceeds the baseline by more
/// than the channel's threshold: `reading - baseline > threshold`.
pub fn evaluate(reading: &Reading, baseline: &Baseline, thresholds: &Thresholds) -> AlertState {
    let mut triggered = [false; Channel::COUNT];
    for channel in Channel::ALL {
        let i = channel.index();
        triggered[i] = reading.values[i] - baseline.0[i] > thresholds[i];
    }
    AlertState { triggered }
}
