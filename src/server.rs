//! JSON polling endpoint.
//!
//! Serves the latest published snapshot and the two administrative
//! operations over plain HTTP/1. Readers are lock-read-and-clone cheap and
//! never block the acquisition cadence; the admin routes forward to the
//! acquisition task and await its reply.
//!
//! Routes:
//!
//! - `GET /data` — latest snapshot as flat JSON
//! - `POST /reset_baseline` — recalibrate, respond with the new baseline
//! - `POST /clear_history` — empty the history ring
//! - `GET /health` / `/healthz` — liveness probe

use std::convert::Infallible;
use std::net::SocketAddr;

use anyhow::Result;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::monitor::MonitorHandle;
use crate::snapshot::Snapshot;

/// Serve the JSON API until the listener fails.
///
/// Each connection is handled on its own task, so a slow client never
/// stalls another reader.
pub async fn serve(listen_addr: &str, handle: MonitorHandle) -> Result<()> {
    let addr: SocketAddr = listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "query endpoint listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let handle = handle.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let handle = handle.clone();
                async move { Ok::<_, Infallible>(handle_request(req, &handle).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!(error = %e, "connection error");
            }
        });
    }
}

async fn handle_request<B>(req: Request<B>, handle: &MonitorHandle) -> Response<Full<Bytes>> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/data") => json_response(StatusCode::OK, data_body(&handle.snapshot())),

        (&Method::POST, "/reset_baseline") => match handle.reset_baseline().await {
            Ok(baseline) => json_response(
                StatusCode::OK,
                serde_json::json!({
                    "status": "success",
                    "baseline": baseline.0.as_slice(),
                })
                .to_string(),
            ),
            Err(e) => json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "status": "error", "message": e.to_string() }).to_string(),
            ),
        },

        (&Method::POST, "/clear_history") => match handle.clear_history().await {
            Ok(()) => json_response(
                StatusCode::OK,
                serde_json::json!({
                    "status": "success",
                    "message": "History cleared",
                })
                .to_string(),
            ),
            Err(e) => json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "status": "error", "message": e.to_string() }).to_string(),
            ),
        },

        (&Method::GET, "/health") | (&Method::GET, "/healthz") => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("OK")))
            .unwrap(),

        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap(),
    }
}

/// Render a snapshot as the flat JSON body the dashboard polls.
fn data_body(snapshot: &Snapshot) -> String {
    serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string())
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::monitor::{self, Phase};
    use crate::source::LineStream;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    async fn running_monitor() -> (tokio::io::DuplexStream, MonitorHandle) {
        let config = MonitorConfig::builder()
            .calibration_samples(1)
            .calibration_pause(Duration::ZERO)
            .cycle_pause(Duration::ZERO)
            .read_timeout(Duration::from_millis(10))
            .build();
        let (reader, mut writer) = tokio::io::duplex(1024);
        let device = LineStream::new(reader, "pipe", config.read_timeout);
        let (handle, _task) = monitor::spawn(device, config);

        writer.write_all(b"MQ135:1.0 MQ138:0.05\n").await.unwrap();
        while handle.phase() != Phase::Running {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        (writer, handle)
    }

    fn request<B: Default>(method: Method, path: &str) -> Request<B> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(B::default())
            .unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn data_returns_flat_snapshot() {
        let (mut writer, handle) = running_monitor().await;
        writer.write_all(b"MQ135:1.3 MQ138:0.05\n").await.unwrap();
        while handle.snapshot().reading.is_none() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let response = handle_request(request::<String>(Method::GET, "/data"), &handle).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["readings"]["MQ-135"], 1.3);
        assert_eq!(json["alert_status"]["MQ-135"], true);
        assert_eq!(json["baseline"][0], 1.0);
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_history_route_clears_and_acknowledges() {
        let (mut writer, handle) = running_monitor().await;
        writer.write_all(b"MQ135:1.1 MQ138:0.05\n").await.unwrap();
        while handle.snapshot().history.is_empty() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let response =
            handle_request(request::<String>(Method::POST, "/clear_history"), &handle).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert!(handle.snapshot().history.is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (_writer, handle) = running_monitor().await;
        let response = handle_request(request::<String>(Method::GET, "/nope"), &handle).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn data_requires_get() {
        let (_writer, handle) = running_monitor().await;
        let response = handle_request(request::<String>(Method::POST, "/data"), &handle).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_writer, handle) = running_monitor().await;
        let response = handle_request(request::<String>(Method::GET, "/health"), &handle).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
