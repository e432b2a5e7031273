//! Hosted store backend speaking the PostgREST dialect used by Supabase.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::models::*;
use super::{Store, StoreError, StoreResult};

const USERS: &str = "users";
const GAME_SETTINGS: &str = "game_settings";

/// Thin REST client over `{project}/rest/v1/{table}`.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_url: String,
}

/// Error body returned by PostgREST.
#[derive(Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

impl SupabaseStore {
    /// Build a client for the given project URL and API key.
    ///
    /// The key is sent both as `apikey` and as a bearer token on every
    /// request.
    pub fn new(project_url: &str, api_key: &str) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| StoreError::Credentials(format!("api key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| StoreError::Credentials(format!("api key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.rest_url, name)
    }

    /// Decode a PostgREST row array, turning non-2xx statuses into errors.
    async fn rows<T: DeserializeOwned>(response: Response) -> StoreResult<Vec<T>> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(remote_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`Self::rows`], but rows that fail to decode are logged and
    /// skipped instead of failing the whole listing.
    async fn decodable_rows<T: DeserializeOwned>(response: Response) -> StoreResult<Vec<T>> {
        let rows: Vec<serde_json::Value> = Self::rows(response).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!("Skipping undecodable row: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn first<T: DeserializeOwned>(response: Response) -> StoreResult<Option<T>> {
        Ok(Self::rows(response).await?.into_iter().next())
    }
}

fn remote_error(status: StatusCode, body: &str) -> StoreError {
    let message = serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());
    StoreError::Remote {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl Store for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn find_user(&self, filter: &UserFilter) -> StoreResult<Option<User>> {
        let (column, operand) = filter.column_eq();
        let response = self
            .client
            .get(self.table(USERS))
            .query(&[("select", "*"), (column, operand.as_str())])
            .send()
            .await?;
        Self::first(response).await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        let response = self
            .client
            .post(self.table(USERS))
            .header("Prefer", "return=representation")
            .json(&[user])
            .send()
            .await?;
        Self::first(response).await
    }

    async fn update_user(
        &self,
        filter: &UserFilter,
        patch: UserPatch,
    ) -> StoreResult<Option<User>> {
        let (column, operand) = filter.column_eq();
        let response = self
            .client
            .patch(self.table(USERS))
            .query(&[(column, operand.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::first(response).await
    }

    async fn list_users_excluding_status(&self, status: PaymentStatus) -> StoreResult<Vec<User>> {
        let excluded = format!("neq.{}", status);
        let response = self
            .client
            .get(self.table(USERS))
            .query(&[
                ("select", "*"),
                ("payment_status", excluded.as_str()),
                ("order", "updated_at.desc"),
            ])
            .send()
            .await?;
        Self::decodable_rows(response).await
    }

    async fn first_settings(&self) -> StoreResult<Option<GameSettings>> {
        let response = self
            .client
            .get(self.table(GAME_SETTINGS))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;
        Self::first(response).await
    }

    async fn insert_settings(&self, record: SettingsRecord) -> StoreResult<Option<GameSettings>> {
        let response = self
            .client
            .post(self.table(GAME_SETTINGS))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await?;
        Self::first(response).await
    }

    async fn update_settings(
        &self,
        id: &RowId,
        record: SettingsRecord,
    ) -> StoreResult<Option<GameSettings>> {
        let operand = format!("eq.{}", id);
        let response = self
            .client
            .patch(self.table(GAME_SETTINGS))
            .query(&[("id", operand.as_str())])
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        Self::first(response).await
    }
}
