//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stower_telemetry::build_sha;
use tracing::error;

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: &'static str,
    pub(crate) queue: QueueHealth,
}

#[derive(Serialize)]
pub(crate) struct QueueHealth {
    pub(crate) depth: usize,
    pub(crate) capacity: usize,
}

pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        build: build_sha(),
        queue: QueueHealth {
            depth: state.queue.depth(),
            capacity: state.queue.capacity(),
        },
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(rendered) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            rendered,
        )
            .into_response()),
        Err(err) => {
            error!(error = %err, "failed to render metrics exposition");
            Err(ApiError::internal("metrics rendering failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stower_dispatch::{CompletionNotice, CopyJob, CopyRoots, JobQueue};
    use stower_events::EventBus;
    use stower_telemetry::Metrics;

    fn sample_state(capacity: usize) -> (Arc<ApiState>, stower_dispatch::JobReceiver) {
        let roots = CopyRoots {
            source_root: "/data/torrents".into(),
            library_root: "/data/complete".into(),
        };
        let (queue, receiver) = JobQueue::bounded(capacity);
        let state = Arc::new(ApiState::new(
            queue,
            roots,
            EventBus::with_capacity(8),
            Metrics::new().expect("metrics"),
        ));
        (state, receiver)
    }

    #[tokio::test]
    async fn health_reports_queue_occupancy() {
        let (state, _receiver) = sample_state(5);
        let notice = CompletionNotice {
            metainfo: "abc".to_string(),
            name: "abc".to_string(),
            state: "done".to_string(),
            time: chrono::Utc::now(),
        };
        let job = CopyJob::build(notice, &state.roots).expect("safe identifier");
        state.queue.enqueue(job).expect("room");

        let response = health(State(Arc::clone(&state))).await;
        assert_eq!(response.0.status, "ok");
        assert_eq!(response.0.queue.depth, 1);
        assert_eq!(response.0.queue.capacity, 5);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_exposition() {
        let (state, _receiver) = sample_state(2);
        state.telemetry.inc_notice("accepted");
        let response = metrics(State(state)).await.expect("render succeeds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
