use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{ProfileRequest, ProfileResponse},
    password::hash_password,
    repo::{StoreError, UserStore},
    repo_types::User,
};
use crate::error::AppError;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Registers a new, unverified profile.
    ///
    /// Fails with `Conflict` when the email is taken, whether that is seen by
    /// the existence check or by the store rejecting the insert.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn create_profile(&self, req: ProfileRequest) -> Result<ProfileResponse, AppError> {
        let ProfileRequest {
            name,
            email,
            password,
        } = req;

        if self.store.exists_by_email(&email).await.map_err(store_err)? {
            warn!("email already registered");
            return Err(AppError::email_exists());
        }

        // argon2 is CPU-bound; keep it off the async workers
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task")??;
        let candidate = User::new_profile(name, email, hash);
        debug!(user_id = %candidate.user_id, "saving new profile");

        let user = match self.store.save(candidate).await {
            Ok(u) => u,
            Err(StoreError::DuplicateEmail) => {
                warn!("email registered concurrently");
                return Err(AppError::email_exists());
            }
            Err(e) => return Err(store_err(e)),
        };

        info!(user_id = %user.user_id, "profile created");
        Ok(ProfileResponse::from(user))
    }
}

fn store_err(e: StoreError) -> AppError {
    match e {
        StoreError::DuplicateEmail => AppError::email_exists(),
        StoreError::Backend(e) => AppError::Internal(e),
    }
}
