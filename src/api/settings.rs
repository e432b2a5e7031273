//! Game settings API handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, JsonBody};
use crate::db::{self, SettingsValues};
use crate::AppState;

/// Get the current settings, falling back to defaults before the first save.
pub async fn get(State(state): State<Arc<AppState>>) -> Result<Json<SettingsValues>, ApiError> {
    let values = db::get_settings(state.store.as_ref())
        .await?
        .map(|row| row.values())
        .unwrap_or_default();
    Ok(Json(values))
}

/// Replace all four settings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub trial_speed: Option<f64>,
    pub trial_precision: Option<f64>,
    pub logged_in_speed: Option<f64>,
    pub logged_in_precision: Option<f64>,
}

impl UpdateSettingsRequest {
    fn complete(&self) -> Option<SettingsValues> {
        Some(SettingsValues {
            trial_speed: self.trial_speed?,
            trial_precision: self.trial_precision?,
            logged_in_speed: self.logged_in_speed?,
            logged_in_precision: self.logged_in_precision?,
        })
    }
}

#[derive(Serialize)]
pub struct UpdateSettingsResponse {
    pub message: &'static str,
    pub settings: SettingsValues,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UpdateSettingsRequest>,
) -> Result<Json<UpdateSettingsResponse>, ApiError> {
    let values = req
        .complete()
        .ok_or_else(|| ApiError::BadRequest("All settings fields are required".to_string()))?;

    let saved = db::save_settings(state.store.as_ref(), values)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to update game settings"))?;

    tracing::info!("Game settings updated: {:?}", saved.values());

    Ok(Json(UpdateSettingsResponse {
        message: "Game settings updated successfully",
        settings: saved.values(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_request_is_rejected() {
        let req: UpdateSettingsRequest =
            serde_json::from_str(r#"{"trialSpeed": 5, "trialPrecision": 0, "loggedInSpeed": 8}"#)
                .unwrap();
        assert!(req.complete().is_none());
    }

    #[test]
    fn zero_values_count_as_present() {
        let req: UpdateSettingsRequest = serde_json::from_str(
            r#"{"trialSpeed": 0, "trialPrecision": 0, "loggedInSpeed": 0, "loggedInPrecision": 0}"#,
        )
        .unwrap();
        assert_eq!(req.complete().unwrap().trial_speed, 0.0);
    }
}
