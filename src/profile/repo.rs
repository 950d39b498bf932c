use std::collections::{hash_map::Entry, HashMap};
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence seam for user profiles.
///
/// `save` must reject a second record with the same email atomically;
/// `exists_by_email` alone is only a fast-path check.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    async fn save(&self, user: User) -> Result<User, StoreError>;
}

/// SQLSTATE 23505 is `unique_violation` in Postgres.
fn is_unique_violation_code(code: &str) -> bool {
    code == "23505"
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    let unique = match &e {
        sqlx::Error::Database(db) => db
            .code()
            .map(|c| is_unique_violation_code(c.as_ref()))
            .unwrap_or(false),
        _ => false,
    };
    if unique {
        StoreError::DuplicateEmail
    } else {
        StoreError::Backend(anyhow::Error::new(e).context("insert user"))
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)"#)
                .bind(email)
                .fetch_one(&self.db)
                .await
                .context("exists_by_email")?;
        Ok(exists)
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, name, email, password_hash, is_account_verified,
                               verify_otp, verify_otp_expire_at, reset_otp, reset_otp_expire_at,
                               created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING user_id, name, email, password_hash, is_account_verified,
                      verify_otp, verify_otp_expire_at, reset_otp, reset_otp_expire_at,
                      created_at
            "#,
        )
        .bind(user.user_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_account_verified)
        .bind(&user.verify_otp)
        .bind(user.verify_otp_expire_at)
        .bind(&user.reset_otp)
        .bind(user.reset_otp_expire_at)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;
        Ok(saved)
    }
}

/// Process-local store keyed by email; uniqueness is checked and applied under one lock.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, User>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("user store lock poisoned")))
    }

    #[cfg(test)]
    pub fn count_by_email(&self, email: &str) -> usize {
        self.users
            .lock()
            .map(|u| usize::from(u.contains_key(email)))
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .ok()
            .and_then(|u| u.get(email).cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.contains_key(email))
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.lock()?;
        match users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => Ok(slot.insert(user).clone()),
        }
    }
}
