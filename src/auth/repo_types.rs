use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::claims::Role;

/// User record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // login identifier, unique
    pub password_hash: String,      // Argon2 PHC string, never serialised
    pub role: Role,                 // USER unless promoted by an operator
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Row shape of the `users` table; `role` is a TEXT column.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

/// Fields supplied when a user is created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
