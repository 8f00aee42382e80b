use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use job_notifications::{JobDetails, JobNotification, SubscriptionRef};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::{api_error, ApiError};
use crate::state::{AppState, Session};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub subscription: SubscriptionRef,
    pub latest_job: Option<JobDetails>,
}

fn session_not_found(session_id: Uuid) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("Session {} not found", session_id),
    )
}

/// POST /api/sessions
pub async fn create_session(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let session_id = Uuid::new_v4();
    state.sessions.insert(session_id, Session::new());
    tracing::info!(session_id = %session_id, "opened notification session");

    (StatusCode::CREATED, Json(json!({ "sessionId": session_id })))
}

/// DELETE /api/sessions/:sessionId
pub async fn close_session(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.remove(&session_id) {
        Some(_) => {
            tracing::info!(session_id = %session_id, "closed notification session");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found(session_id)),
    }
}

/// POST /api/sessions/:sessionId/notifications
///
/// Ingress for the real-time hub: one job event per call.
pub async fn push_notification(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<Uuid>,
    Json(notification): Json<JobNotification>,
) -> Result<impl IntoResponse, ApiError> {
    if notification.subscription_id().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "subscription id is required",
        ));
    }

    let mut session = state
        .live_session(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    let outcome = session.store.add_notification(notification);

    Ok((StatusCode::OK, Json(json!({ "outcome": outcome }))))
}

/// GET /api/sessions/:sessionId/notifications
pub async fn list_notifications(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let session = state
        .live_session(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    let views = session
        .store
        .notifications()
        .iter()
        .map(|notification| NotificationView {
            subscription: notification.subscription.clone(),
            latest_job: notification.latest_job.as_ref().map(|job| job.details()),
        })
        .collect();

    Ok(Json(views))
}

/// DELETE /api/sessions/:sessionId/notifications/:subscriptionId
pub async fn unsubscribe(
    Extension(state): Extension<AppState>,
    Path((session_id, subscription_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    let mut session = state
        .live_session(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    session.store.remove(&subscription_id);

    Ok(StatusCode::NO_CONTENT)
}
