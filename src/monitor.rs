//! The acquisition loop and its shared-state publisher.
//!
//! One dedicated task owns the device stream for the lifetime of the
//! process. It calibrates once at startup, then repeats: read a frame,
//! decode it, evaluate alerts against the current baseline, append to the
//! history ring, and publish a fresh [`Snapshot`] as a single guarded
//! assignment. Query handlers only ever read published snapshots, so they
//! never block the read cadence and never observe a torn update.
//!
//! Administrative operations (baseline reset, history clear) travel to the
//! task over a command channel and answer over oneshot replies. Because
//! they execute on the task itself, a reset holds the device and the
//! baseline exclusively: no cycle can ever mix half-old/half-new baseline
//! values across channels.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::alert::evaluate;
use crate::calibrate::calibrate;
use crate::config::MonitorConfig;
use crate::frame::{decode_frame, DecodeError};
use crate::history::HistoryRing;
use crate::snapshot::{Baseline, Reading, Snapshot};
use crate::source::{DeviceError, DeviceStream, ReadOutcome};

/// Lifecycle phase of the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Device stream handed over, loop not yet calibrating.
    Starting,
    /// Collecting baseline samples (startup or reset).
    Calibrating,
    /// Steady-state sampling.
    Running,
}

/// Error returned by administrative operations when the acquisition task
/// has already stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("monitor task is not running")]
pub struct MonitorStopped;

enum Command {
    ResetBaseline(oneshot::Sender<Baseline>),
    ClearHistory(oneshot::Sender<()>),
}

#[derive(Debug)]
struct SharedState {
    snapshot: RwLock<Snapshot>,
    phase: RwLock<Phase>,
}

/// Handle for querying and administering a running monitor.
///
/// Cheap to clone; every clone reads the same published state and talks to
/// the same acquisition task.
#[derive(Clone)]
pub struct MonitorHandle {
    shared: Arc<SharedState>,
    cmd_tx: mpsc::Sender<Command>,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl MonitorHandle {
    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot.read().clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.shared.phase.read()
    }

    /// Recalibrate the baseline and return the new value.
    ///
    /// Runs on the acquisition task, exclusive with the sampling cycle; it
    /// applies to either the current or the next cycle, never partway
    /// through one.
    pub async fn reset_baseline(&self) -> Result<Baseline, MonitorStopped> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ResetBaseline(reply_tx))
            .await
            .map_err(|_| MonitorStopped)?;
        reply_rx.await.map_err(|_| MonitorStopped)
    }

    /// Empty the history ring and republish.
    pub async fn clear_history(&self) -> Result<(), MonitorStopped> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ClearHistory(reply_tx))
            .await
            .map_err(|_| MonitorStopped)?;
        reply_rx.await.map_err(|_| MonitorStopped)
    }

    /// Ask the acquisition task to stop after its current cycle.
    pub fn shutdown(&self) {
        let _ = self.stop_tx.send(true);
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("phase", &self.phase())
            .finish()
    }
}

/// Spawn the acquisition task for a device.
///
/// Returns a handle for queries and administration plus the task's join
/// handle. The task runs until shutdown is requested or the device stream
/// fails unrecoverably; the failure is the join handle's error value, so
/// the process owner can observe it and exit instead of carrying a
/// silently dead loop.
pub fn spawn<S>(device: S, config: MonitorConfig) -> (MonitorHandle, JoinHandle<Result<(), DeviceError>>)
where
    S: DeviceStream + 'static,
{
    let shared = Arc::new(SharedState {
        snapshot: RwLock::new(Snapshot::default()),
        phase: RwLock::new(Phase::Starting),
    });
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = MonitorHandle {
        shared: shared.clone(),
        cmd_tx,
        stop_tx: Arc::new(stop_tx),
    };
    let task = tokio::spawn(run(device, config, shared, cmd_rx, stop_rx));

    (handle, task)
}

async fn run<S: DeviceStream>(
    mut device: S,
    config: MonitorConfig,
    shared: Arc<SharedState>,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<(), DeviceError> {
    info!(device = device.description(), "acquisition starting");

    *shared.phase.write() = Phase::Calibrating;
    let mut baseline = calibrate(
        &mut device,
        config.calibration_samples,
        config.calibration_pause,
    )
    .await?;

    let mut ring = HistoryRing::new(config.history_capacity);
    let mut latest: Option<Reading> = None;
    publish(&shared, latest, baseline, &ring, &config);
    *shared.phase.write() = Phase::Running;
    info!("acquisition running");

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    info!("acquisition shutting down");
                    return Ok(());
                }
            }

            cmd = cmd_rx.recv() => match cmd {
                Some(Command::ResetBaseline(reply)) => {
                    info!("baseline reset requested");
                    *shared.phase.write() = Phase::Calibrating;
                    baseline = calibrate(
                        &mut device,
                        config.calibration_samples,
                        config.calibration_pause,
                    )
                    .await?;
                    *shared.phase.write() = Phase::Running;
                    publish(&shared, latest, baseline, &ring, &config);
                    let _ = reply.send(baseline);
                }
                Some(Command::ClearHistory(reply)) => {
                    info!("history cleared");
                    ring.clear();
                    publish(&shared, latest, baseline, &ring, &config);
                    let _ = reply.send(());
                }
                // All handles dropped: nobody can observe us any more.
                None => return Ok(()),
            },

            outcome = device.read_line() => match outcome? {
                ReadOutcome::Timeout => {}
                ReadOutcome::Line(line) => match decode_frame(&line) {
                    Err(DecodeError::Empty) => {}
                    Err(e) => debug!(error = %e, "dropped malformed frame"),
                    Ok(values) => {
                        let reading = Reading::new(values);
                        ring.push(reading.into());
                        latest = Some(reading);
                        publish(&shared, latest, baseline, &ring, &config);
                        tokio::time::sleep(config.cycle_pause).await;
                    }
                },
            },
        }
    }
}

/// Replace the published snapshot wholesale.
///
/// The alert state is computed here, against the baseline being published,
/// so a reader can never pair a reading with an alert evaluated against a
/// different baseline.
fn publish(
    shared: &SharedState,
    reading: Option<Reading>,
    baseline: Baseline,
    ring: &HistoryRing,
    config: &MonitorConfig,
) {
    let alert = reading
        .map(|r| evaluate(&r, &baseline, &config.thresholds))
        .unwrap_or_default();
    let snapshot = Snapshot {
        reading,
        alert,
        baseline,
        history: ring.entries(),
    };
    *shared.snapshot.write() = snapshot;
}
