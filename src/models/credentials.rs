//! Trello API credentials.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credential form fields, in entry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    /// Trello API key
    ApiKey,
    /// Trello API token
    ApiToken,
    /// Board identifier
    BoardId,
}

impl CredentialField {
    /// All fields in entry order.
    pub const ALL: [Self; 3] = [Self::ApiKey, Self::ApiToken, Self::BoardId];

    /// Human-readable field label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApiKey => "Trello API Key",
            Self::ApiToken => "Trello API Token",
            Self::BoardId => "Trello Board ID",
        }
    }

    /// The field after this one, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::ApiKey => Self::ApiToken,
            Self::ApiToken => Self::BoardId,
            Self::BoardId => Self::ApiKey,
        }
    }

    /// The field before this one, wrapping around.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::ApiKey => Self::BoardId,
            Self::ApiToken => Self::ApiKey,
            Self::BoardId => Self::ApiToken,
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A required credential was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The named field was empty
    #[error("{0} is required")]
    MissingField(CredentialField),
}

/// API key, token and board id used for every Trello request.
///
/// The values are opaque; the only check is that none is blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Trello API key
    pub api_key: String,
    /// Trello API token
    pub api_token: String,
    /// Board identifier from the board URL
    pub board_id: String,
}

impl Credentials {
    /// Creates credentials from the three raw values.
    pub fn new(
        api_key: impl Into<String>,
        api_token: impl Into<String>,
        board_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_token: api_token.into(),
            board_id: board_id.into(),
        }
    }

    /// Value of a single field.
    #[must_use]
    pub fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::ApiKey => &self.api_key,
            CredentialField::ApiToken => &self.api_token,
            CredentialField::BoardId => &self.board_id,
        }
    }

    /// Mutable access to a single field (used by the entry form).
    pub fn field_mut(&mut self, field: CredentialField) -> &mut String {
        match field {
            CredentialField::ApiKey => &mut self.api_key,
            CredentialField::ApiToken => &mut self.api_token,
            CredentialField::BoardId => &mut self.board_id,
        }
    }

    /// Returns a copy with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.api_key.trim(),
            self.api_token.trim(),
            self.board_id.trim(),
        )
    }

    /// Checks that no field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        CredentialField::ALL
            .into_iter()
            .find(|field| self.field(*field).trim().is_empty())
            .map_or(Ok(()), |field| Err(ValidationError::MissingField(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_complete() {
        let creds = Credentials::new("key", "token", "board");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let creds = Credentials::new("key", "  ", "");
        assert_eq!(
            creds.validate(),
            Err(ValidationError::MissingField(CredentialField::ApiToken))
        );
        assert_eq!(
            creds.validate().unwrap_err().to_string(),
            "Trello API Token is required"
        );
    }

    #[test]
    fn test_field_cycle() {
        let mut field = CredentialField::ApiKey;
        for _ in 0..3 {
            field = field.next();
        }
        assert_eq!(field, CredentialField::ApiKey);
        assert_eq!(CredentialField::ApiKey.previous(), CredentialField::BoardId);
    }

    #[test]
    fn test_serializes_camel_case() {
        let creds = Credentials::new("k", "t", "b");
        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains("\"apiKey\":\"k\""));
        assert!(json.contains("\"boardId\":\"b\""));
    }
}
