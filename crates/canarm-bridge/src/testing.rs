//! Test utilities for canarm-bridge
//!
//! Provides a fake CAN bridge server backed by a [`MockBus`], so the HTTP
//! client and everything above it can be exercised end to end.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::adapter::BusTransport;
use crate::error::Result;
use crate::http::HttpBridge;
use crate::mock::MockBus;
use crate::wire::{PollResponse, SendRequest};

/// Build the fake bridge router over a shared bus
pub fn bridge_router(bus: Arc<MockBus>) -> Router {
    Router::new()
        .route("/api/can", post(send_frame))
        .route("/api/messages/{iface}", get(list_messages))
        .with_state(bus)
}

async fn send_frame(
    State(bus): State<Arc<MockBus>>,
    Json(request): Json<SendRequest>,
) -> (StatusCode, Json<Value>) {
    let frame = match request.into_frame() {
        Ok(frame) => frame,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": e.to_string()})),
            )
        }
    };
    match bus.send(&frame).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "success", "data": {"count": 1}}))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "message": e.to_string()})),
        ),
    }
}

async fn list_messages(
    State(bus): State<Arc<MockBus>>,
    Path(iface): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<PollResponse>) {
    let Some(id) = params.get("id").and_then(|id| id.parse::<u32>().ok()) else {
        return (StatusCode::BAD_REQUEST, Json(PollResponse::default()));
    };
    match bus.poll(&iface, id).await {
        Ok(payloads) => (StatusCode::OK, Json(PollResponse::ok(&payloads))),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(PollResponse::default())),
    }
}

/// A fake bridge that automatically shuts down when dropped
pub struct TestBridge {
    pub addr: SocketAddr,
    pub bus: Arc<MockBus>,
    pub client: HttpBridge,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestBridge {
    /// Start a fake bridge over a bus with motor simulation enabled
    pub async fn start() -> Result<Self> {
        Self::start_with_bus(Arc::new(MockBus::default())).await
    }

    /// Start a fake bridge over the given bus
    pub async fn start_with_bus(bus: Arc<MockBus>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| crate::BridgeError::Unavailable(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| crate::BridgeError::Unavailable(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let router = bridge_router(bus.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let client = HttpBridge::with_config(
            &format!("http://{}", addr),
            Duration::from_secs(5),
            Duration::from_secs(2),
        )?;

        Ok(Self {
            addr,
            bus,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the fake bridge
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
