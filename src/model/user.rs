use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// argon2 PHC string, never the raw password
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
