//! Player API handlers: registration, login, payment and game progress.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{auth, blank, ApiError, JsonBody, QueryParams};
use crate::db::{self, PaymentStatus, RowId, User, UserSummary};
use crate::AppState;

/// Register a new player.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age_consent: Option<bool>,
}

/// Response carrying a message and the public view of a user.
#[derive(Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        req.name.filter(|s| !s.is_empty()),
        req.email.filter(|s| !s.is_empty()),
        req.password.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email, and password are required".to_string(),
        ));
    };

    if db::find_user_by_email(state.store.as_ref(), &email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let user = db::create_user(
        state.store.as_ref(),
        &name,
        &email,
        &password,
        req.age_consent,
    )
    .await?
    .ok_or_else(|| ApiError::internal("Failed to create user"))?;

    tracing::info!("Registered user {} ({})", user.id, user.email);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully",
            user: UserSummary::from(&user),
        }),
    ))
}

/// Log in as a player or as the admin.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if blank(&req.email) || blank(&req.password) {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if let Some(admin) = &state.auth.admin {
        if admin.matches(&email, &password) {
            let token = auth::create_admin_token(&state.auth.jwt_secret, state.auth.token_ttl)
                .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))?;
            tracing::info!("Admin logged in");
            return Ok(Json(LoginResponse {
                message: "Admin login successful",
                is_admin: true,
                token: Some(token),
                user: None,
            }));
        }
    }

    let user = db::find_user_by_email(state.store.as_ref(), &email)
        .await?
        .filter(|user| auth::password_matches(&user.password, &password))
        .ok_or_else(|| ApiError::InvalidCredentials("Invalid email or password".to_string()))?;

    if user.payment_status != PaymentStatus::Approved {
        return Err(ApiError::Forbidden(
            "Payment not approved. Please complete payment process.".to_string(),
        ));
    }

    Ok(Json(LoginResponse {
        message: "Login successful",
        is_admin: false,
        token: None,
        user: Some(UserSummary::from(&user)),
    }))
}

/// Response carrying a message and the full stored row.
#[derive(Serialize)]
pub struct UserRowResponse {
    pub message: &'static str,
    pub user: User,
}

/// Overwrite a player's remaining chances.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChancesRequest {
    pub user_id: Option<RowId>,
    pub game_chances: Option<i64>,
}

pub async fn update_chances(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UpdateChancesRequest>,
) -> Result<Json<UserRowResponse>, ApiError> {
    let (Some(user_id), Some(game_chances)) =
        (req.user_id.filter(|id| !id.is_blank()), req.game_chances)
    else {
        return Err(ApiError::BadRequest(
            "User ID and game chances are required".to_string(),
        ));
    };

    let user = db::update_game_chances(state.store.as_ref(), &user_id, game_chances)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to update user game chances"))?;

    Ok(Json(UserRowResponse {
        message: "Game chances updated successfully",
        user,
    }))
}

/// Request naming a single user by id.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: Option<RowId>,
}

impl UserIdRequest {
    pub(crate) fn require(self) -> Result<RowId, ApiError> {
        self.user_id
            .filter(|id| !id.is_blank())
            .ok_or_else(|| ApiError::BadRequest("User ID is required".to_string()))
    }
}

/// Record that a player won.
pub async fn record_win(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> Result<Json<UserRowResponse>, ApiError> {
    let user_id = req.require()?;

    let user = db::record_win(state.store.as_ref(), &user_id)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to record user win"))?;

    tracing::info!("Recorded win for user {}", user.id);

    Ok(Json(UserRowResponse {
        message: "Win recorded successfully",
        user,
    }))
}

/// Submit a UPI payment reference for review.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub email: Option<String>,
    pub upi_id: Option<String>,
    pub utr_number: Option<String>,
}

pub async fn submit_payment(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<PaymentRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let (Some(email), Some(upi_id), Some(utr_number)) = (
        req.email.filter(|s| !s.is_empty()),
        req.upi_id.filter(|s| !s.is_empty()),
        req.utr_number.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Email, UPI ID, and UTR number are required".to_string(),
        ));
    };

    if db::find_user_by_email(state.store.as_ref(), &email)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let user = db::submit_payment(state.store.as_ref(), &email, &upi_id, &utr_number)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to update user payment information"))?;

    tracing::info!("Payment submitted for user {}", user.id);

    Ok(Json(UserResponse {
        message: "Payment submitted successfully",
        user: UserSummary::from(&user),
    }))
}

/// Look up a player's payment status.
#[derive(Deserialize)]
pub struct StatusParams {
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: PaymentStatus,
    pub user: UserSummary,
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<StatusParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Some(email) = params.email.filter(|s| !s.is_empty()) else {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    };

    let user = db::find_user_by_email(state.store.as_ref(), &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(StatusResponse {
        status: user.payment_status,
        user: UserSummary::from(&user),
    }))
}
