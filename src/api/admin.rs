//! Admin API handlers.
//!
//! All routes require an [`AdminSession`].

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use super::users::{UserIdRequest, UserRowResponse};
use super::{AdminSession, ApiError, JsonBody};
use crate::db::{self, User};
use crate::AppState;

#[derive(Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<User>,
}

/// List every user who has submitted a payment, newest first.
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> Result<Json<RequestsResponse>, ApiError> {
    let requests = db::list_payment_requests(state.store.as_ref()).await?;
    Ok(Json(RequestsResponse { requests }))
}

/// Approve a user's payment.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> Result<Json<UserRowResponse>, ApiError> {
    let user_id = req.require()?;

    let user = db::approve_payment(state.store.as_ref(), &user_id)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to approve user payment"))?;

    tracing::info!("Approved payment for user {}", user.id);

    Ok(Json(UserRowResponse {
        message: "Payment approved successfully",
        user,
    }))
}

/// Deny a user's payment.
pub async fn deny(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> Result<Json<UserRowResponse>, ApiError> {
    let user_id = req.require()?;

    let user = db::deny_payment(state.store.as_ref(), &user_id)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to deny user payment"))?;

    tracing::info!("Denied payment for user {}", user.id);

    Ok(Json(UserRowResponse {
        message: "Payment denied successfully",
        user,
    }))
}
