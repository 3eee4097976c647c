//! Buffered line reader over an async byte stream.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::info;

use super::{DeviceError, DeviceStream, ReadOutcome};

/// A [`DeviceStream`] that reads newline-terminated frames from any async
/// byte stream.
///
/// Framing is done over a buffer owned by the stream, with `read_buf` as
/// the only await point. `read_buf` either appends bytes or does nothing,
/// so a caller cancelling `read_line` mid-read (a timeout, or losing a
/// `select!` race) never loses a partial frame: the bytes stay buffered and
/// the next call picks up where the last one stopped.
///
/// Each read is bounded by a per-read timeout; an elapsed timeout is
/// reported as [`ReadOutcome::Timeout`], not an error. EOF is reported as
/// [`DeviceError::Closed`].
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use std::time::Duration;
/// use gaswatch::source::{DeviceStream, LineStream, ReadOutcome};
///
/// # tokio_test::block_on(async {
/// let bytes = Cursor::new(b"MQ135:1.0 MQ138:0.5\n".to_vec());
/// let mut device = LineStream::new(bytes, "cursor", Duration::from_millis(50));
/// let outcome = device.read_line().await.unwrap();
/// assert_eq!(outcome, ReadOutcome::Line("MQ135:1.0 MQ138:0.5".to_string()));
/// # });
/// ```
#[derive(Debug)]
pub struct LineStream<R> {
    reader: R,
    description: String,
    read_timeout: Duration,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> LineStream<R> {
    /// Wrap an async reader.
    pub fn new(reader: R, description: &str, read_timeout: Duration) -> Self {
        Self {
            reader,
            description: description.to_string(),
            read_timeout,
            buf: Vec::with_capacity(256),
        }
    }

    /// Detach the first complete line from the buffer, if one is there.
    fn take_buffered_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.buf.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        Some(line)
    }
}

impl<R: AsyncRead + Unpin + Send> DeviceStream for LineStream<R> {
    async fn read_line(&mut self) -> Result<ReadOutcome, DeviceError> {
        let deadline = Instant::now() + self.read_timeout;
        loop {
            if let Some(line) = self.take_buffered_line() {
                return Ok(ReadOutcome::Line(line));
            }
            match timeout_at(deadline, self.reader.read_buf(&mut self.buf)).await {
                Err(_elapsed) => return Ok(ReadOutcome::Timeout),
                Ok(Ok(0)) => return Err(DeviceError::Closed),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(DeviceError::Io(e)),
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Connect to a device exposed over a TCP serial bridge.
///
/// Waits `settle_delay` after the connection opens before the first read,
/// giving the device time to reset (the usual Arduino-style behaviour when
/// the host opens the port).
pub async fn connect_tcp(
    addr: &str,
    settle_delay: Duration,
    read_timeout: Duration,
) -> Result<LineStream<TcpStream>, DeviceError> {
    let stream = TcpStream::connect(addr).await?;
    info!(addr, "connected to device, settling");
    tokio::time::sleep(settle_delay).await;
    Ok(LineStream::new(
        stream,
        &format!("tcp: {}", addr),
        read_timeout,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn device(data: &str) -> LineStream<Cursor<Vec<u8>>> {
        LineStream::new(
            Cursor::new(data.as_bytes().to_vec()),
            "test",
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn reads_lines_in_order() {
        let mut dev = device("first\nsecond\n");
        assert_eq!(
            dev.read_line().await.unwrap(),
            ReadOutcome::Line("first".to_string())
        );
        assert_eq!(
            dev.read_line().await.unwrap(),
            ReadOutcome::Line("second".to_string())
        );
    }

    #[tokio::test]
    async fn strips_carriage_returns() {
        let mut dev = device("MQ135:1.0 MQ138:0.5\r\n");
        assert_eq!(
            dev.read_line().await.unwrap(),
            ReadOutcome::Line("MQ135:1.0 MQ138:0.5".to_string())
        );
    }

    #[tokio::test]
    async fn eof_is_closed() {
        let mut dev = device("");
        assert!(matches!(dev.read_line().await, Err(DeviceError::Closed)));
    }

    #[tokio::test]
    async fn partial_frame_survives_a_timeout() {
        use tokio::io::AsyncWriteExt;

        let (reader, mut writer) = tokio::io::duplex(64);
        let mut dev = LineStream::new(reader, "duplex", Duration::from_millis(20));

        // Half a frame arrives, then the device stalls past the timeout.
        writer.write_all(b"MQ135:1.0 ").await.unwrap();
        assert_eq!(dev.read_line().await.unwrap(), ReadOutcome::Timeout);

        // The rest of the frame arrives: the buffered half must still be
        // there, and the line comes out whole.
        writer.write_all(b"MQ138:0.5\n").await.unwrap();
        assert_eq!(
            dev.read_line().await.unwrap(),
            ReadOutcome::Line("MQ135:1.0 MQ138:0.5".to_string())
        );
    }

    #[tokio::test]
    async fn two_frames_in_one_burst_are_read_separately() {
        use tokio::io::AsyncWriteExt;

        let (reader, mut writer) = tokio::io::duplex(64);
        let mut dev = LineStream::new(reader, "duplex", Duration::from_millis(50));

        writer.write_all(b"MQ135:1.0 MQ138:0.5\nMQ135:2.0 MQ138:0.6\n").await.unwrap();
        assert_eq!(
            dev.read_line().await.unwrap(),
            ReadOutcome::Line("MQ135:1.0 MQ138:0.5".to_string())
        );
        assert_eq!(
            dev.read_line().await.unwrap(),
            ReadOutcome::Line("MQ135:2.0 MQ138:0.6".to_string())
        );
    }

    #[tokio::test]
    async fn stalled_stream_times_out() {
        // A duplex pipe with nothing written never yields a line.
        let (reader, _writer) = tokio::io::duplex(64);
        let mut dev = LineStream::new(reader, "duplex", Duration::from_millis(20));
        assert_eq!(dev.read_line().await.unwrap(), ReadOutcome::Timeout);
    }

    #[tokio::test]
    async fn description_names_the_transport() {
        let dev = device("x\n");
        assert_eq!(dev.description(), "test");
    }
}
