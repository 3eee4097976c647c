//! Baseline calibration.
//!
//! Collects a short burst of valid readings from the device and reduces
//! them to one per-channel mean. Runs once at startup and again whenever a
//! baseline reset is requested; in both cases it executes inside the
//! acquisition task, so it holds the device and the baseline exclusively.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::frame::{decode_frame, DecodeError};
use crate::snapshot::Baseline;
use crate::source::{DeviceError, DeviceStream, ReadOutcome};

/// Read attempts allowed per requested sample before giving up.
///
/// Bounds the procedure so calibration never blocks indefinitely on a
/// device that only emits garbage.
const ATTEMPTS_PER_SAMPLE: usize = 3;

/// Collect up to `samples` valid readings and average them per channel.
///
/// Invalid and empty lines are skipped: they do not count toward `samples`
/// and do not abort the procedure. If the attempt budget runs out with no
/// valid reading collected, the baseline degrades to zero for every
/// channel; that is a safe fallback, not an error. Only an unrecoverable
/// device failure is propagated.
pub async fn calibrate<S: DeviceStream>(
    device: &mut S,
    samples: usize,
    pause: Duration,
) -> Result<Baseline, DeviceError> {
    let mut collected = Vec::with_capacity(samples);
    let budget = samples * ATTEMPTS_PER_SAMPLE;
    let mut attempts = 0;

    while collected.len() < samples && attempts < budget {
        attempts += 1;
        match device.read_line().await? {
            ReadOutcome::Timeout => {}
            ReadOutcome::Line(line) => match decode_frame(&line) {
                Ok(values) => collected.push(values),
                Err(DecodeError::Empty) => {}
                Err(e) => debug!(error = %e, "skipped line during calibration"),
            },
        }
        if collected.len() < samples && attempts < budget {
            tokio::time::sleep(pause).await;
        }
    }

    if collected.is_empty() {
        warn!(
            attempts,
            "calibration collected no valid readings, falling back to zero baseline"
        );
        return Ok(Baseline::zero());
    }

    let baseline = Baseline::mean_of(&collected);
    info!(
        samples = collected.len(),
        baseline = ?baseline.0,
        "baseline calibrated"
    );
    Ok(baseline)
}
