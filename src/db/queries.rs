//! Database queries.
//!
//! Each function is one read or write against the store. There is no
//! status-transition checking: approving, denying and resubmitting are plain
//! overwrites of the current row.

use super::models::*;
use super::{Store, StoreResult};

/// Chances granted when an admin approves a payment.
pub const APPROVED_GAME_CHANCES: i64 = 3;

/// Create a new user with no chances and a pending payment.
pub async fn create_user(
    store: &dyn Store,
    name: &str,
    email: &str,
    password: &str,
    age_consent: Option<bool>,
) -> StoreResult<Option<User>> {
    let user = NewUser::new(
        name.to_string(),
        email.to_string(),
        password.to_string(),
        age_consent,
    );
    store.insert_user(user).await
}

/// Get a user by email.
pub async fn find_user_by_email(store: &dyn Store, email: &str) -> StoreResult<Option<User>> {
    store
        .find_user(&UserFilter::Email(email.to_string()))
        .await
}

/// Get a user by ID.
pub async fn find_user_by_id(store: &dyn Store, id: &RowId) -> StoreResult<Option<User>> {
    store.find_user(&UserFilter::Id(id.clone())).await
}

/// Overwrite a user's remaining game chances.
pub async fn update_game_chances(
    store: &dyn Store,
    id: &RowId,
    game_chances: i64,
) -> StoreResult<Option<User>> {
    store
        .update_user(
            &UserFilter::Id(id.clone()),
            UserPatch::new().game_chances(game_chances),
        )
        .await
}

/// Mark a user as a winner.
pub async fn record_win(store: &dyn Store, id: &RowId) -> StoreResult<Option<User>> {
    store
        .update_user(&UserFilter::Id(id.clone()), UserPatch::new().win(true))
        .await
}

/// Attach a payment reference and queue the user for review.
pub async fn submit_payment(
    store: &dyn Store,
    email: &str,
    upi_id: &str,
    utr_number: &str,
) -> StoreResult<Option<User>> {
    let patch = UserPatch::new()
        .payment_reference(upi_id.to_string(), utr_number.to_string())
        .payment_status(PaymentStatus::PendingApproval);
    store
        .update_user(&UserFilter::Email(email.to_string()), patch)
        .await
}

/// Every user who has entered the payment flow, newest activity first.
pub async fn list_payment_requests(store: &dyn Store) -> StoreResult<Vec<User>> {
    store
        .list_users_excluding_status(PaymentStatus::Pending)
        .await
}

/// Approve a payment and grant the standard number of chances.
pub async fn approve_payment(store: &dyn Store, id: &RowId) -> StoreResult<Option<User>> {
    let patch = UserPatch::new()
        .payment_status(PaymentStatus::Approved)
        .game_chances(APPROVED_GAME_CHANCES);
    store.update_user(&UserFilter::Id(id.clone()), patch).await
}

/// Deny a payment. Chances are left as they are.
pub async fn deny_payment(store: &dyn Store, id: &RowId) -> StoreResult<Option<User>> {
    store
        .update_user(
            &UserFilter::Id(id.clone()),
            UserPatch::new().payment_status(PaymentStatus::Denied),
        )
        .await
}

/// Get the current game settings row, if one was ever saved.
pub async fn get_settings(store: &dyn Store) -> StoreResult<Option<GameSettings>> {
    store.first_settings().await
}

/// Update the existing settings row, or create it on first save.
pub async fn save_settings(
    store: &dyn Store,
    values: SettingsValues,
) -> StoreResult<Option<GameSettings>> {
    match store.first_settings().await? {
        Some(existing) => {
            let record = SettingsRecord::update(values, chrono::Utc::now());
            store.update_settings(&existing.id, record).await
        }
        None => store.insert_settings(SettingsRecord::insert(values)).await,
    }
}
