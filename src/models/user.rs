use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored user account.
///
/// Not `Serialize`: the record carries the password hash and must never reach a client.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    #[sqlx(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user that has not been stored yet. The store assigns its identifier.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_new(id: Uuid, user: NewUser) -> Self {
        Self {
            id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: user.created_at,
        }
    }
}
