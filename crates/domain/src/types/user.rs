//! User directory types
//!
//! Records managed through the REST backend's `/users/` collection and the
//! JSON envelope every endpoint answers with.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, UserDeskError};

/// Field name to validation messages, as returned in `errors`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// User record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable fields submitted on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl UserInput {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), email: email.into(), phone: phone.into() }
    }

    /// Client-side checks mirroring the form's required fields.
    ///
    /// # Errors
    /// Returns `UserDeskError::InvalidInput` when name or email is blank or
    /// the email has no `@`.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(UserDeskError::InvalidInput("name is required".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(UserDeskError::InvalidInput("email is required".to_string()));
        }
        if !email.contains('@') {
            return Err(UserDeskError::InvalidInput(format!("invalid email address: {email}")));
        }
        Ok(())
    }
}

impl From<&UserRecord> for UserInput {
    fn from(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        }
    }
}

/// Response envelope: `{ success, data, message, errors }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiEnvelope<T> {
    /// All field messages joined by single spaces, in field order.
    #[must_use]
    pub fn joined_errors(&self) -> Option<String> {
        let errors = self.errors.as_ref()?;
        let joined = errors.values().flatten().map(String::as_str).collect::<Vec<_>>().join(" ");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_list_payload() {
        let body = r#"{
            "success": true,
            "data": [
                {"id": 1, "name": "Ada", "email": "ada@example.com", "phone": "555-0100",
                 "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-02T10:00:00Z"}
            ],
            "message": "Users retrieved successfully"
        }"#;

        let envelope: ApiEnvelope<Vec<UserRecord>> = serde_json::from_str(body).unwrap();
        let users = envelope.data.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "ada@example.com");
        assert!(users[0].created_at.is_some());
        assert_eq!(envelope.message.as_deref(), Some("Users retrieved successfully"));
    }

    #[test]
    fn test_envelope_joins_field_errors() {
        let body = r#"{
            "success": false,
            "errors": {
                "email": ["A user with this email already exists."],
                "name": ["This field may not be blank."]
            },
            "message": "Failed to create user"
        }"#;

        let envelope: ApiEnvelope<UserRecord> = serde_json::from_str(body).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(
            envelope.joined_errors().as_deref(),
            Some("A user with this email already exists. This field may not be blank.")
        );
    }

    #[test]
    fn test_delete_envelope_without_data() {
        let body = r#"{"success": true, "message": "User deleted successfully"}"#;
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.joined_errors().is_none());
    }

    /// Payload types without a `Default` impl, parsed through a generic
    /// caller the way the REST client does.
    #[test]
    fn test_envelope_payload_needs_no_default() {
        #[derive(Debug, Deserialize)]
        struct Token {
            value: String,
        }

        fn parse<T: serde::de::DeserializeOwned>(body: &str) -> ApiEnvelope<T> {
            serde_json::from_str(body).unwrap()
        }

        let envelope: ApiEnvelope<Token> = parse(r#"{"data": {"value": "abc"}}"#);
        assert_eq!(envelope.data.unwrap().value, "abc");

        let envelope: ApiEnvelope<Token> = parse(r#"{"success": true}"#);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_user_input_validation() {
        assert!(UserInput::new("Ada", "ada@example.com", "").validate().is_ok());
        assert!(matches!(
            UserInput::new(" ", "ada@example.com", "").validate(),
            Err(UserDeskError::InvalidInput(_))
        ));
        assert!(matches!(
            UserInput::new("Ada", "not-an-email", "").validate(),
            Err(UserDeskError::InvalidInput(_))
        ));
    }
}
