//! Database models, queries and store backends.
//!
//! Handlers never talk to a backend directly: they call the functions in
//! [`queries`], which are written against the [`Store`] trait. The hosted
//! PostgREST project is the production backend; [`MemoryStore`] keeps the
//! same tables in process for local runs and tests.

pub mod memory;
pub mod models;
pub mod queries;
pub mod supabase;

pub use memory::MemoryStore;
pub use models::*;
pub use queries::*;
pub use supabase::SupabaseStore;

use async_trait::async_trait;

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("unexpected store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid store credentials: {0}")]
    Credentials(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Single-table reads and writes against the `users` and `game_settings`
/// tables.
///
/// Every write returns the affected row as stored, or `None` when no row
/// matched.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short name for logs.
    fn backend(&self) -> &'static str;

    /// First user matching the filter.
    async fn find_user(&self, filter: &UserFilter) -> StoreResult<Option<User>>;

    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>>;

    /// Apply the patch to every matching row and return the first one.
    async fn update_user(&self, filter: &UserFilter, patch: UserPatch)
        -> StoreResult<Option<User>>;

    /// All users not in `status`, most recently updated first.
    async fn list_users_excluding_status(&self, status: PaymentStatus) -> StoreResult<Vec<User>>;

    async fn first_settings(&self) -> StoreResult<Option<GameSettings>>;

    async fn insert_settings(&self, record: SettingsRecord) -> StoreResult<Option<GameSettings>>;

    async fn update_settings(
        &self,
        id: &RowId,
        record: SettingsRecord,
    ) -> StoreResult<Option<GameSettings>>;
}
