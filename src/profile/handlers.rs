use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    mail,
    profile::dto::{ProfileRequest, ProfileResponse},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<ProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    let profile = state.profiles.create_profile(payload).await?;

    if state.config.mail.welcome_enabled {
        match mail::send_welcome(state.mailer.as_ref(), &state.config.mail.from, &profile).await {
            Ok(()) => info!(user_id = %profile.user_id, "welcome email sent"),
            Err(e) => warn!(error = %e, user_id = %profile.user_id, "welcome email failed"),
        }
    }

    Ok((StatusCode::CREATED, Json(profile)))
}
