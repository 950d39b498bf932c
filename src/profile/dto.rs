use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;

/// Request body for registration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
    pub user_id: Uuid,
    pub is_account_verified: bool,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            name: u.name,
            email: u.email,
            user_id: u.user_id,
            is_account_verified: u.is_account_verified,
        }
    }
}
