//! Database models.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Primary key of a hosted table row.
///
/// Hosted tables may be keyed by integers or by UUID strings, and clients
/// send whichever they were given back, so both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Number(i64),
    Text(String),
}

impl RowId {
    /// True for `0` and `""`, which clients use to mean "no id".
    pub fn is_blank(&self) -> bool {
        match self {
            RowId::Number(n) => *n == 0,
            RowId::Text(s) => s.is_empty(),
        }
    }

    /// Compare ids by their rendered value, so `5` and `"5"` are the same row.
    pub fn same_as(&self, other: &RowId) -> bool {
        self.to_string() == other.to_string()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Number(n) => write!(f, "{}", n),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Number(value)
    }
}

/// Where a player is in the payment review flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Registered, no payment reference submitted yet.
    #[default]
    Pending,
    /// Payment reference submitted, waiting for an admin.
    PendingApproval,
    Approved,
    Denied,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PendingApproval => "pending_approval",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `users` table.
///
/// Rows written by older clients may hold nulls or zone-less timestamps, so
/// decoding is lenient: nulls fall back to defaults and naive timestamps are
/// read as UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: RowId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Stored as submitted; never sent back to clients.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub age_consent: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_chances: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub utr_number: Option<String>,
    #[serde(default)]
    pub win: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept RFC 3339 timestamps as well as Postgres `timestamp` and
/// `timestamptz` renderings. Values without an offset are taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// The subset of a user returned by registration, login, payment and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: RowId,
    pub name: String,
    pub email: String,
    pub game_chances: i64,
    pub payment_status: PaymentStatus,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            game_chances: user.game_chances,
            payment_status: user.payment_status,
        }
    }
}

/// Insert payload for a freshly registered user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age_consent: Option<bool>,
    pub game_chances: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    /// New players start with no chances until their payment is approved.
    pub fn new(name: String, email: String, password: String, age_consent: Option<bool>) -> Self {
        let now = Utc::now();
        Self {
            name,
            email,
            password,
            age_consent,
            game_chances: 0,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Selects the user rows an update applies to.
#[derive(Debug, Clone)]
pub enum UserFilter {
    Id(RowId),
    Email(String),
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Id(id) => user.id.same_as(id),
            UserFilter::Email(email) => user.email == *email,
        }
    }

    /// Column and PostgREST `eq` operand for this filter.
    pub fn column_eq(&self) -> (&'static str, String) {
        match self {
            UserFilter::Id(id) => ("id", format!("eq.{}", id)),
            UserFilter::Email(email) => ("email", format!("eq.{}", email)),
        }
    }
}

/// Partial update of a user row. `updated_at` is always written.
#[derive(Debug, Clone, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_chances: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utr_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for UserPatch {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPatch {
    pub fn new() -> Self {
        Self {
            game_chances: None,
            win: None,
            payment_status: None,
            upi_id: None,
            utr_number: None,
            updated_at: Utc::now(),
        }
    }

    pub fn game_chances(mut self, chances: i64) -> Self {
        self.game_chances = Some(chances);
        self
    }

    pub fn win(mut self, win: bool) -> Self {
        self.win = Some(win);
        self
    }

    pub fn payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn payment_reference(mut self, upi_id: String, utr_number: String) -> Self {
        self.upi_id = Some(upi_id);
        self.utr_number = Some(utr_number);
        self
    }

    /// Write the present fields onto an in-memory row.
    pub fn apply(&self, user: &mut User) {
        if let Some(chances) = self.game_chances {
            user.game_chances = chances;
        }
        if let Some(win) = self.win {
            user.win = Some(win);
        }
        if let Some(status) = self.payment_status {
            user.payment_status = status;
        }
        if let Some(upi_id) = &self.upi_id {
            user.upi_id = Some(upi_id.clone());
        }
        if let Some(utr_number) = &self.utr_number {
            user.utr_number = Some(utr_number.clone());
        }
        user.updated_at = Some(self.updated_at);
    }
}

/// A row of the `game_settings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    pub id: RowId,
    pub trial_speed: f64,
    pub trial_precision: f64,
    pub logged_in_speed: f64,
    pub logged_in_precision: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GameSettings {
    pub fn values(&self) -> SettingsValues {
        SettingsValues {
            trial_speed: self.trial_speed,
            trial_precision: self.trial_precision,
            logged_in_speed: self.logged_in_speed,
            logged_in_precision: self.logged_in_precision,
        }
    }
}

/// Game tuning numbers as exchanged with the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsValues {
    pub trial_speed: f64,
    pub trial_precision: f64,
    pub logged_in_speed: f64,
    pub logged_in_precision: f64,
}

impl Default for SettingsValues {
    /// Served when the settings table is still empty.
    fn default() -> Self {
        Self {
            trial_speed: 10.0,
            trial_precision: 1.0,
            logged_in_speed: 10.0,
            logged_in_precision: 1.0,
        }
    }
}

/// Write payload for the `game_settings` table.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsRecord {
    pub trial_speed: f64,
    pub trial_precision: f64,
    pub logged_in_speed: f64,
    pub logged_in_precision: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SettingsRecord {
    pub fn insert(values: SettingsValues) -> Self {
        let now = Utc::now();
        Self {
            created_at: Some(now),
            ..Self::update(values, now)
        }
    }

    pub fn update(values: SettingsValues, now: DateTime<Utc>) -> Self {
        Self {
            trial_speed: values.trial_speed,
            trial_precision: values.trial_precision,
            logged_in_speed: values.logged_in_speed,
            logged_in_precision: values.logged_in_precision,
            created_at: None,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_id_accepts_numbers_and_strings() {
        let n: RowId = serde_json::from_str("42").unwrap();
        let s: RowId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(n, RowId::Number(42));
        assert_eq!(s, RowId::Text("42".to_string()));
        assert!(n.same_as(&s));
        assert!(RowId::Number(0).is_blank());
        assert!(RowId::Text(String::new()).is_blank());
    }

    #[test]
    fn payment_status_wire_names() {
        let json = serde_json::to_string(&PaymentStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");
        let parsed: PaymentStatus = serde_json::from_str("\"denied\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Denied);
    }

    #[test]
    fn user_password_is_not_serialized() {
        let json = r#"{
            "id": 7, "name": "Asha", "email": "asha@example.com", "password": "hunter2",
            "age_consent": true, "game_chances": 3, "payment_status": "approved",
            "upi_id": null, "utr_number": null, "win": null,
            "created_at": "2024-05-01T10:00:00+00:00",
            "updated_at": "2024-05-01T10:00:00.123456+00:00"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.password, "hunter2");

        let out = serde_json::to_value(&user).unwrap();
        assert!(out.get("password").is_none());
        assert_eq!(out["payment_status"], "approved");
    }

    #[test]
    fn legacy_user_row_decodes_with_defaults() {
        let json = r#"{
            "id": "9", "name": null, "email": "old@example.com", "password": null,
            "game_chances": null, "payment_status": null,
            "created_at": "2024-05-01 10:00:00",
            "updated_at": "2024-05-01T10:00:00.123456"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.name, "");
        assert_eq!(user.game_chances, 0);
        assert_eq!(user.payment_status, PaymentStatus::Pending);
        assert_eq!(
            user.updated_at.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00.123456+00:00"
        );
        assert!(user.created_at.is_some());
    }

    #[test]
    fn timestamps_accept_postgres_offsets() {
        let ts = parse_timestamp("2024-05-01 12:00:00.5+02").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00.500+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn missing_timestamps_are_none() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "email": "a@example.com"}"#).unwrap();
        assert!(user.created_at.is_none());
        assert!(user.updated_at.is_none());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = UserPatch::new().win(true);
        let out = serde_json::to_value(&patch).unwrap();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(out["win"], true);
        assert!(out.get("updated_at").is_some());
    }

    #[test]
    fn settings_values_use_camel_case() {
        let out = serde_json::to_value(SettingsValues::default()).unwrap();
        assert_eq!(out["trialSpeed"], 10.0);
        assert_eq!(out["loggedInPrecision"], 1.0);
    }

    #[test]
    fn settings_insert_record_carries_created_at() {
        let record = SettingsRecord::insert(SettingsValues::default());
        assert!(record.created_at.is_some());
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["trial_speed"], 10.0);
    }
}
