// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider callback webhook.
//!
//! Handles POST /v1/callbacks and GET /v1/health. Requests are not
//! authenticated; deploy behind a reverse proxy that does.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use herald_cascade::DispatchProcessor;
use herald_core::{CallbackStatus, Channel, HealthStatus, MessageId, PluginAdapter, StatusCallback};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct ServerState {
    pub processor: Arc<DispatchProcessor>,
    pub storage: Arc<dyn PluginAdapter>,
}

/// Request body for POST /v1/callbacks.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub channel: Channel,
    pub message_id: String,
    pub status: CallbackStatus,
    /// When the provider observed the status. Defaults to receipt time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response body for GET /v1/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: String,
    pub channels: BTreeMap<Channel, String>,
}

fn describe(status: &HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "healthy".to_string(),
        HealthStatus::Degraded(why) => format!("degraded: {why}"),
        HealthStatus::Unhealthy(why) => format!("unhealthy: {why}"),
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/v1/callbacks", post(post_callback))
        .route("/v1/health", get(get_health))
        .with_state(state)
}

/// POST /v1/callbacks
///
/// Unmatched, stale and ignored callbacks are still acknowledged with 200 so
/// providers do not redeliver them; the outcome is in the body.
pub async fn post_callback(
    State(state): State<ServerState>,
    Json(body): Json<CallbackRequest>,
) -> Response {
    let callback = StatusCallback {
        channel: body.channel,
        message_id: MessageId(body.message_id),
        status: body.status,
        timestamp: body.timestamp.unwrap_or_else(Utc::now),
    };
    match state.processor.apply_callback(&callback).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!(error = %e, message_id = %callback.message_id, "callback processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /v1/health
///
/// 200 when storage and every channel adapter are healthy, 503 otherwise.
pub async fn get_health(State(state): State<ServerState>) -> Response {
    let storage = state
        .storage
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
    let channels = state.processor.channels().health().await;

    let healthy = storage == HealthStatus::Healthy
        && channels.iter().all(|(_, s)| *s == HealthStatus::Healthy);
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage: describe(&storage),
        channels: channels
            .iter()
            .map(|(channel, status)| (*channel, describe(status)))
            .collect(),
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use herald_cascade::{CascadePolicy, ChannelSet, ProcessorSettings, ProviderRegistry};
    use herald_core::{AdapterType, DeliveryStatus, DispatchRecord, DispatchStore, HeraldError};
    use herald_test_utils::{fixtures, ManualClock, MemoryStore, MockChannel};
    use tower::ServiceExt;

    use super::*;

    struct StubStorage {
        healthy: bool,
    }

    #[async_trait]
    impl PluginAdapter for StubStorage {
        fn name(&self) -> &str {
            "stub"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }

        async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
            if self.healthy {
                Ok(HealthStatus::Healthy)
            } else {
                Err(HeraldError::Internal("disk gone".into()))
            }
        }

        async fn shutdown(&self) -> Result<(), HeraldError> {
            Ok(())
        }
    }

    fn state(store: Arc<MemoryStore>, healthy: bool) -> ServerState {
        let processor = DispatchProcessor::new(
            store.clone(),
            store,
            ChannelSet::new().with_text_message(Arc::new(MockChannel::new("sms"))),
            ProviderRegistry::new(),
            CascadePolicy::default(),
            ProcessorSettings::default(),
            Arc::new(ManualClock::fixed()),
        );
        ServerState {
            processor: Arc::new(processor),
            storage: Arc::new(StubStorage { healthy }),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn callback_updates_record() {
        let store = Arc::new(MemoryStore::new());
        let mut record = DispatchRecord::new(
            "c-1".into(),
            "m-1".into(),
            Channel::TextMessage,
            fixtures::t0(),
        );
        record.status = DeliveryStatus::Sent;
        record.attempts = 1;
        record.provider_message_id = Some(MessageId("sms-1".into()));
        record.last_sent_at = Some(fixtures::t0());
        store.upsert(&record).await.unwrap();

        let app = router(state(store.clone(), true));
        let response = app
            .oneshot(post(
                "/v1/callbacks",
                serde_json::json!({
                    "channel": "text_message",
                    "message_id": "sms-1",
                    "status": "delivered",
                    "timestamp": "2026-03-01T09:01:00Z"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["outcome"], "applied");
        assert_eq!(
            store.record("c-1", "m-1").await.unwrap().status,
            DeliveryStatus::Delivered
        );
    }

    #[tokio::test]
    async fn unknown_message_id_is_acknowledged() {
        let app = router(state(Arc::new(MemoryStore::new()), true));
        let response = app
            .oneshot(post(
                "/v1/callbacks",
                serde_json::json!({
                    "channel": "voice_call",
                    "message_id": "call-404",
                    "status": "answered"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "unmatched");
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let app = router(state(Arc::new(MemoryStore::new()), true));
        let response = app
            .oneshot(post(
                "/v1/callbacks",
                serde_json::json!({
                    "channel": "voice_call",
                    "message_id": "call-1",
                    "status": "bounced"
                }),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_adapters() {
        let app = router(state(Arc::new(MemoryStore::new()), true));
        let response = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["channels"]["text_message"], "healthy");
    }

    #[tokio::test]
    async fn failing_storage_degrades_health() {
        let app = router(state(Arc::new(MemoryStore::new()), false));
        let response = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["status"], "degraded");
        assert!(json["storage"].as_str().unwrap().contains("disk gone"));
    }
}
