//! Remote API wire types
//!
//! The PHP backend wraps most replies in `{ success, data?, message? }`.
//! Ids may arrive as numbers, and flags as 0/1.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Category, Currency, ShoppingList, ShoppingListItem, UserId};
use crate::store::{RemotePreferences, RemoteSnapshot};

use super::RemoteError;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    fn failure_message(&mut self) -> String {
        self.message
            .take()
            .or_else(|| self.error.take())
            .unwrap_or_else(|| "request failed".to_string())
    }

    /// `data` of a successful reply
    pub fn into_data(mut self) -> Result<T, RemoteError> {
        if !self.success {
            return Err(RemoteError::Rejected(self.failure_message()));
        }
        self.data.ok_or(RemoteError::MissingData)
    }

    /// Success check for replies without a payload
    pub fn into_unit(mut self) -> Result<(), RemoteError> {
        if !self.success {
            return Err(RemoteError::Rejected(self.failure_message()));
        }
        Ok(())
    }
}

/// Authenticated user as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "isPremium", deserialize_with = "flag_from_any")]
    pub is_premium: bool,
}

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.id.clone())
    }
}

/// Reply of `auth/session_status.php`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionStatus {
    #[serde(rename = "isAuthenticated", default, deserialize_with = "flag_from_any")]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Reply of `auth/login.php` and `auth/register.php`
#[derive(Debug, Deserialize)]
pub struct AuthReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest<'a> {
    pub currency_code: &'a str,
    pub user_id: &'a str,
}

/// Currency preference, either a bare code or a full record
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CurrencyPreference {
    Code(String),
    Full(Currency),
}

impl CurrencyPreference {
    fn resolve(self) -> Option<Currency> {
        match self {
            CurrencyPreference::Code(code) => Currency::for_code(&code),
            CurrencyPreference::Full(currency) => Some(currency),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub currency: Option<CurrencyPreference>,
    #[serde(default, deserialize_with = "optional_flag_from_any")]
    pub is_premium: Option<bool>,
}

/// Payload of `data/index.php`. Records stay raw until conversion so one
/// bad row does not sink the whole snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteData {
    #[serde(default)]
    pub lists: Vec<Value>,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub categories: Vec<Value>,
    #[serde(default)]
    pub user_preferences: UserPreferences,
}

impl From<RemoteData> for RemoteSnapshot {
    fn from(data: RemoteData) -> Self {
        RemoteSnapshot {
            lists: parse_rows::<ShoppingList>("list", data.lists),
            items: parse_rows::<ShoppingListItem>("item", data.items),
            categories: parse_rows::<Category>("category", data.categories),
            preferences: RemotePreferences {
                currency: data.user_preferences.currency.and_then(CurrencyPreference::resolve),
                is_premium: data.user_preferences.is_premium,
            },
        }
    }
}

fn parse_rows<T: DeserializeOwned>(kind: &'static str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(normalize_row(row)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(kind, error = %e, "skipping malformed remote row");
                None
            }
        })
        .collect()
}

const ID_KEYS: &[&str] = &["id", "userId", "user_id", "listId", "list_id", "category", "defaultCategory", "default_category"];
const NUMBER_KEYS: &[&str] = &["price", "quantity", "budgetLimit", "budget_limit"];
const FLAG_KEYS: &[&str] = &["checked"];
const DATE_KEYS: &[&str] = &["dateAdded", "date_added", "createdAt", "created_at"];

/// Coerce a database row into the shapes the entities expect: numeric ids
/// become strings, numeric strings become numbers, 0/1 become booleans and
/// SQL datetimes (`2024-03-02 10:00:00`, UTC) become RFC 3339.
fn normalize_row(mut row: Value) -> Value {
    if let Value::Object(map) = &mut row {
        normalize_fields(map);
    }
    row
}

fn normalize_fields(map: &mut serde_json::Map<String, Value>) {
    // NULL columns fall back to field defaults
    map.retain(|_, value| !value.is_null());

    for key in ID_KEYS {
        if let Some(Value::Number(n)) = map.get(*key) {
            let text = n.to_string();
            map.insert(key.to_string(), Value::String(text));
        }
    }
    for key in NUMBER_KEYS {
        if let Some(Value::String(s)) = map.get(*key) {
            let parsed = s.trim().parse::<f64>().ok().and_then(|n| {
                if *key == "quantity" {
                    Some(Value::from(n.max(0.0) as u64))
                } else {
                    serde_json::Number::from_f64(n).map(Value::Number)
                }
            });
            if let Some(value) = parsed {
                map.insert(key.to_string(), value);
            }
        }
    }
    for key in FLAG_KEYS {
        if let Some(flag) = map.get(*key).and_then(flag_value) {
            map.insert(key.to_string(), Value::Bool(flag));
        }
    }
    for key in DATE_KEYS {
        if let Some(Value::String(s)) = map.get(*key) {
            if is_sql_datetime(s) {
                let text = format!("{}Z", s.replacen(' ', "T", 1));
                map.insert(key.to_string(), Value::String(text));
            }
        }
    }
}

fn is_sql_datetime(s: &str) -> bool {
    s.len() == 19 && s.as_bytes().get(10) == Some(&b' ')
}

fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_i64().unwrap_or(0) != 0),
        Value::String(s) => Some(matches!(s.as_str(), "1" | "true")),
        _ => None,
    }
}

fn flag_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(flag_value(&Value::deserialize(deserializer)?).unwrap_or(false))
}

fn optional_flag_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(flag_value(&Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_failure_uses_message() {
        let env: Envelope<Value> = serde_json::from_str(r#"{"success":false,"message":"Not logged in"}"#).unwrap();
        match env.into_data() {
            Err(RemoteError::Rejected(msg)) => assert_eq!(msg, "Not logged in"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_envelope_success_without_data() {
        let env: Envelope<Value> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(env.into_data(), Err(RemoteError::MissingData)));
    }

    #[test]
    fn test_session_status_with_numeric_id() {
        let status: SessionStatus = serde_json::from_str(
            r#"{"isAuthenticated":true,"user":{"id":42,"email":"a@b.c","is_premium":1}}"#,
        )
        .unwrap();
        assert!(status.is_authenticated);
        let user = status.user.unwrap();
        assert_eq!(user.user_id(), UserId::from("42"));
        assert!(user.is_premium);
    }

    #[test]
    fn test_remote_data_conversion_skips_bad_rows() {
        let json = r#"{
            "lists": [
                {"id": 1, "user_id": 42, "name": "Weekly", "budget_limit": 50, "created_at": "2020-01-01 00:00:00"},
                {"name": "no id"}
            ],
            "items": [
                {"id": "i1", "list_id": 1, "user_id": 42, "name": "Tea", "quantity": "2", "price": "3.50",
                 "category": "beverages", "checked": 1, "date_added": "2024-03-02 10:00:00", "notes": null}
            ],
            "categories": [{"id": "c1", "name": "Snacks", "user_id": 42}],
            "user_preferences": {"currency": "INR", "is_premium": "1"}
        }"#;
        let data: RemoteData = serde_json::from_str(json).unwrap();
        let snapshot = RemoteSnapshot::from(data);

        assert_eq!(snapshot.lists.len(), 1);
        assert_eq!(snapshot.lists[0].id, "1");
        assert_eq!(snapshot.lists[0].budget_limit, 50.0);
        assert_eq!(snapshot.lists[0].created_at.to_rfc3339(), "2020-01-01T00:00:00+00:00");
        assert_eq!(snapshot.items[0].list_id, "1");
        assert_eq!(snapshot.items[0].quantity, 2);
        assert_eq!(snapshot.items[0].price, 3.5);
        assert!(snapshot.items[0].checked);
        assert_eq!(snapshot.items[0].date_added.to_rfc3339(), "2024-03-02T10:00:00+00:00");
        assert_eq!(snapshot.categories[0].user_id, Some(UserId::from("42")));
        assert_eq!(snapshot.preferences.currency.unwrap().code, "INR");
        assert_eq!(snapshot.preferences.is_premium, Some(true));
    }

    #[test]
    fn test_full_currency_preference() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"currency":{"code":"EUR","symbol":"€","name":"Euro"}}"#).unwrap();
        assert_eq!(prefs.currency.and_then(CurrencyPreference::resolve), Some(Currency::euro()));
        assert_eq!(prefs.is_premium, None);
    }
}
