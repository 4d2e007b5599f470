//! Completion-notice admission.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stower_dispatch::{AdmissionError, CompletionNotice, CopyJob, EnqueueError};
use stower_events::Event;
use tracing::{info, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Wire shape of a completion notice.
#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    /// Content identifier (infohash) naming the finished payload.
    metainfo: String,
    /// Display name, informational only.
    #[serde(default)]
    name: String,
    /// State label, informational only.
    #[serde(default)]
    state: String,
    /// Time at which the caller observed completion.
    time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteAccepted {
    status: &'static str,
    content_id: String,
}

/// Accept a completion notice: validate, build a job, and attempt a
/// non-blocking enqueue. The response never waits on the copy itself.
pub(crate) async fn notify_complete(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CompleteRequest>,
) -> Result<(StatusCode, Json<CompleteAccepted>), ApiError> {
    let notice = CompletionNotice {
        metainfo: request.metainfo,
        name: request.name,
        state: request.state,
        time: request.time,
    };

    let job = match CopyJob::build(notice, &state.roots) {
        Ok(job) => job,
        Err(err) => return Err(reject_invalid(&state, &err)),
    };

    let notice_id = job.notice_id;
    let content_id = job.content_id().to_string();
    let name = job.notice.name.clone();

    match state.queue.enqueue(job) {
        Ok(()) => {
            state.telemetry.inc_notice("accepted");
            state.telemetry.set_queue_depth(state.queue.depth());
            let _ = state.events.publish(Event::NoticeAccepted {
                notice_id,
                content_id: content_id.clone(),
                name,
            });
            info!(
                notice_id = %notice_id,
                content_id = %content_id,
                queue_depth = state.queue.depth(),
                "completion notice queued"
            );
            Ok((
                StatusCode::ACCEPTED,
                Json(CompleteAccepted {
                    status: "queued",
                    content_id,
                }),
            ))
        }
        Err(EnqueueError::Full { job }) => {
            state.telemetry.inc_notice("rejected_busy");
            state.telemetry.inc_queue_rejection();
            let _ = state.events.publish(Event::NoticeRejected {
                content_id: job.content_id().to_string(),
                reason: "queue_full".to_string(),
            });
            warn!(
                content_id = %job.content_id(),
                capacity = state.queue.capacity(),
                "copy queue full; notice shed"
            );
            Err(ApiError::service_busy())
        }
        Err(EnqueueError::Closed { job }) => {
            state.telemetry.inc_notice("rejected_closed");
            let _ = state.events.publish(Event::NoticeRejected {
                content_id: job.content_id().to_string(),
                reason: "queue_closed".to_string(),
            });
            warn!(content_id = %job.content_id(), "copy queue closed; notice refused");
            Err(ApiError::service_unavailable("service is shutting down"))
        }
    }
}

fn reject_invalid(state: &ApiState, err: &AdmissionError) -> ApiError {
    let content_id = match err {
        AdmissionError::UnsafeIdentifier { value, .. } => value.clone(),
        AdmissionError::EmptyIdentifier => String::new(),
    };
    state.telemetry.inc_notice("rejected_invalid");
    let _ = state.events.publish(Event::NoticeRejected {
        content_id,
        reason: err.reason().to_string(),
    });
    warn!(reason = err.reason(), "completion notice rejected");
    ApiError::bad_request("invalid content identifier").with_detail(err.reason())
}
