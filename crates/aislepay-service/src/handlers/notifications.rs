//! Notification handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use aislepay_core::{Notification, NotificationKind};
use aislepay_store::EscrowStore;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::state::AppState;

/// Notification representation returned by the API.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: String,
    /// What it is about.
    pub kind: NotificationKind,
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&Notification> for NotificationResponse {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.to_string(),
            kind: n.kind,
            title: n.title.clone(),
            body: n.body.clone(),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Pagination for the notification listing.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Maximum entries to return (default 50).
    pub limit: Option<usize>,
    /// Entries to skip (default 0).
    pub offset: Option<usize>,
}

/// Listing response.
#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    /// The requester's notifications, newest first.
    pub notifications: Vec<NotificationResponse>,
}

/// List the requester's notifications.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let user_id = actor.require_user()?;

    let notifications = state.store.list_notifications_by_user(
        &user_id,
        query.limit.unwrap_or(50),
        query.offset.unwrap_or(0),
    )?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.iter().map(NotificationResponse::from).collect(),
    }))
}
