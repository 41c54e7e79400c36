use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use tokio::task::spawn_blocking;

use super::{ApiResult, Session};
use crate::auth;
use crate::db::{NewUser, ProfileUpdate, StorageError, User};
use crate::server::AppState;

// Argon2 runs on the blocking pool, never while the store lock is held.

#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

pub async fn signup(State(state): State<Arc<AppState>>, Json(new_user): Json<NewUser>) -> ApiResult<Json<User>> {
    let password = new_user.password.clone();
    let hash = spawn_blocking(move || auth::hash_password(&password)).await??;

    let user = state.db()?.insert_user(new_user, hash)?;
    log::info!("Signed up {} as {}", user.username, user.role);
    Ok(Json(user))
}

pub async fn signin(State(state): State<Arc<AppState>>, Json(request): Json<SignInRequest>) -> ApiResult<Json<User>> {
    let found = state.db()?.credentials(&request.username)?;
    let Some((user, hash)) = found else {
        return Err(StorageError::InvalidCredentials.into());
    };

    let password = request.password;
    if spawn_blocking(move || auth::verify_password(&password, &hash)).await? {
        Ok(Json(user))
    } else {
        Err(StorageError::InvalidCredentials.into())
    }
}

pub async fn me(State(state): State<Arc<AppState>>, session: Session) -> ApiResult<Json<User>> {
    Ok(Json(state.db()?.get_user(session.user_id)?))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let password_hash = match update.password.clone() {
        Some(password) => Some(spawn_blocking(move || auth::hash_password(&password)).await??),
        None => None,
    };

    Ok(Json(state.db()?.apply_profile_update(session.user_id, update, password_hash)?))
}
