//! In-process store backend.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::*;
use super::{Store, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    settings: BTreeMap<i64, GameSettings>,
    next_user_id: i64,
    next_settings_id: i64,
}

/// Keeps both tables in memory with sequential integer ids.
///
/// Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_user(&self, filter: &UserFilter) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| filter.matches(u)).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_user_id);
        let row = User {
            id: RowId::Number(id),
            name: user.name,
            email: user.email,
            password: user.password,
            age_consent: user.age_consent,
            game_chances: user.game_chances,
            payment_status: user.payment_status,
            upi_id: None,
            utr_number: None,
            win: None,
            created_at: Some(user.created_at),
            updated_at: Some(user.updated_at),
        };
        tables.users.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn update_user(
        &self,
        filter: &UserFilter,
        patch: UserPatch,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let mut first = None;
        for user in tables.users.values_mut().filter(|u| filter.matches(u)) {
            patch.apply(user);
            if first.is_none() {
                first = Some(user.clone());
            }
        }
        Ok(first)
    }

    async fn list_users_excluding_status(&self, status: PaymentStatus) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.payment_status != status)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(users)
    }

    async fn first_settings(&self) -> StoreResult<Option<GameSettings>> {
        let tables = self.tables.read().await;
        Ok(tables.settings.values().next().cloned())
    }

    async fn insert_settings(&self, record: SettingsRecord) -> StoreResult<Option<GameSettings>> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.next_settings_id);
        let row = GameSettings {
            id: RowId::Number(id),
            trial_speed: record.trial_speed,
            trial_precision: record.trial_precision,
            logged_in_speed: record.logged_in_speed,
            logged_in_precision: record.logged_in_precision,
            created_at: record.created_at,
            updated_at: Some(record.updated_at),
        };
        tables.settings.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn update_settings(
        &self,
        id: &RowId,
        record: SettingsRecord,
    ) -> StoreResult<Option<GameSettings>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.settings.values_mut().find(|s| s.id.same_as(id)) else {
            return Ok(None);
        };
        row.trial_speed = record.trial_speed;
        row.trial_precision = record.trial_precision;
        row.logged_in_speed = record.logged_in_speed;
        row.logged_in_precision = record.logged_in_precision;
        row.updated_at = Some(record.updated_at);
        Ok(Some(row.clone()))
    }
}
