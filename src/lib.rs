//! # gaswatch
//!
//! A daemon for monitoring a small set of gas-concentration channels from
//! a connected sensing device. It decodes the device's line-oriented
//! telemetry, establishes a per-channel baseline at startup, flags
//! threshold-crossing anomalies, retains a bounded recent history, and
//! exposes everything to polling clients as one consistent JSON snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Acquisition task                        │
//! │  ┌─────────┐   ┌───────┐   ┌───────┐   ┌─────────┐          │
//! │  │ source  │──▶│ frame │──▶│ alert │──▶│ history │          │
//! │  │ (device)│   │(decode)   │(eval) │   │ (ring)  │          │
//! │  └─────────┘   └───────┘   └───────┘   └────┬────┘          │
//! │       ▲                                     │ publish       │
//! │  calibrate ◀── reset command                ▼               │
//! │                                      ┌────────────┐         │
//! │                                      │  Snapshot  │         │
//! │                                      └─────┬──────┘         │
//! └────────────────────────────────────────────┼────────────────┘
//!                                              │ read-only
//!                                              ▼
//!                                       ┌────────────┐
//!                                       │   server   │──▶ HTTP clients
//!                                       └────────────┘
//! ```
//!
//! - **[`source`]**: the [`DeviceStream`] seam over the device transport,
//!   with a buffered line reader for TCP serial bridges and tests
//! - **[`frame`]**: decodes one telemetry line into per-channel values,
//!   with a specific reason for every rejected frame
//! - **[`calibrate`]**: reduces a burst of startup readings to a
//!   per-channel baseline, degrading to zero rather than failing
//! - **[`alert`]**: the pure threshold evaluation run every cycle
//! - **[`history`]**: the bounded FIFO ring of recent readings
//! - **[`monitor`]**: the acquisition loop that owns the device, drives
//!   calibration, and publishes snapshots; administrative resets and
//!   clears run on the same task so published state is never torn
//! - **[`server`]**: the JSON polling endpoint over the published state
//!
//! ## Usage
//!
//! ```bash
//! # Monitor a device exposed on a TCP serial bridge
//! gaswatch --device 192.168.1.50:23 --listen 0.0.0.0:5000
//! ```
//!
//! As a library:
//!
//! ```no_run
//! use std::time::Duration;
//! use gaswatch::{monitor, MonitorConfig};
//! use gaswatch::source::connect_tcp;
//!
//! # tokio_test::block_on(async {
//! let config = MonitorConfig::default();
//! let device = connect_tcp("192.168.1.50:23", config.settle_delay, config.read_timeout)
//!     .await
//!     .unwrap();
//! let (handle, task) = monitor::spawn(device, config);
//! let snapshot = handle.snapshot();
//! # });
//! ```

pub mod alert;
pub mod calibrate;
pub mod channel;
pub mod config;
pub mod frame;
pub mod history;
pub mod monitor;
pub mod server;
pub mod snapshot;
pub mod source;

// Re-export main types for convenience
pub use channel::{Channel, Thresholds};
pub use config::MonitorConfig;
pub use frame::{decode_frame, DecodeError};
pub use history::HistoryRing;
pub use monitor::{MonitorHandle, Phase};
pub use snapshot::{AlertState, Baseline, HistoryEntry, Reading, Snapshot};
pub use source::{DeviceError, DeviceStream, LineStream, ReadOutcome};
