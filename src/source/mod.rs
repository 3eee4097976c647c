//! Device stream abstraction for receiving telemetry frames.
//!
//! The transport to the sensing device is a collaborator: something that
//! yields newline-terminated text frames and may time out on a read. This
//! module provides the [`DeviceStream`] seam plus the buffered line-reader
//! implementation used for real connections and tests.

mod line;

pub use line::{connect_tcp, LineStream};

use std::future::Future;

use thiserror::Error;

/// Outcome of one bounded read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One complete frame, without the trailing newline.
    Line(String),
    /// Nothing arrived within the per-read timeout. Transient; the caller
    /// simply tries again.
    Timeout,
}

/// Unrecoverable device-stream failures.
///
/// These terminate the acquisition loop and are surfaced to the process
/// owner. There is deliberately no reconnect logic in this layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device closed the stream (EOF).
    #[error("device stream closed")]
    Closed,

    /// The underlying transport failed.
    #[error("device read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for receiving telemetry frames from a device.
///
/// Implementations wrap a concrete transport (a TCP serial bridge, or an
/// in-memory double in tests) behind a uniform line-read operation with a
/// bounded per-read timeout.
pub trait DeviceStream: Send {
    /// Read one frame, waiting at most the configured per-read timeout.
    fn read_line(&mut self) -> impl Future<Output = Result<ReadOutcome, DeviceError>> + Send;

    /// Human-readable description of the transport, for logs.
    fn description(&self) -> &str;
}
