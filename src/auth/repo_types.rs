use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub username: String,           // login name, unique
    #[serde(skip_serializing)]
    pub password_hash: String,      // opaque, compared verbatim
    pub created_at: OffsetDateTime, // insertion timestamp
}
