use axum::{
    routing::{delete, post},
    Router,
};

use crate::handlers::notification_handlers::{
    close_session, create_session, list_notifications, push_notification, unsubscribe,
};

pub fn notification_routes() -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{sessionId}", delete(close_session))
        .route(
            "/sessions/{sessionId}/notifications",
            post(push_notification).get(list_notifications),
        )
        .route(
            "/sessions/{sessionId}/notifications/{subscriptionId}",
            delete(unsubscribe),
        )
}
