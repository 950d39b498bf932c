use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub is_account_verified: bool,
    pub verify_otp: Option<String>,
    pub verify_otp_expire_at: i64,
    pub reset_otp: Option<String>,
    pub reset_otp_expire_at: i64,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Fresh, unverified account with a new identity and no pending OTPs.
    pub fn new_profile(name: String, email: String, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            is_account_verified: false,
            verify_otp: None,
            verify_otp_expire_at: 0,
            reset_otp: None,
            reset_otp_expire_at: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
