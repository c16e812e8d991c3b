use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const AUTH_FAILED: &str = "An error occurred during authentication";
pub const INVALID_JSON: &str = "Invalid JSON";
pub const CREATE_DB_FAILED: &str = "An error occurred while creating the database";
pub const SEEDING_FAILED: &str = "Database seeding error";

/// Request body for get-user-token. The password arrives already hashed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub hashed_password: String,
}

/// Login result; absent fields are omitted from the JSON.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LoginResponse {
    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            success: true,
            user_id: Some(user_id),
            error_message: None,
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            user_id: None,
            error_message: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

/// Result of reset-and-seed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
