//! Per-request identity

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::error::ApiError;
use crate::db::{Role, StorageError};
use crate::server::AppState;

/// Header carrying the id returned by sign-in
pub const USER_ID_HEADER: &str = "x-user-id";

/// The signed-in user making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

impl Session {
    pub fn require_teacher(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Teacher => Ok(()),
            Role::Student => Err(ApiError::Forbidden("Only teachers can do this".to_string())),
        }
    }

    /// Teachers may only change what they own
    pub fn require_owner(&self, teacher_id: Uuid) -> Result<(), ApiError> {
        self.require_teacher()?;
        if self.user_id == teacher_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden("You do not own this resource".to_string()))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;

        let user_id = header
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| ApiError::Unauthorized("Invalid user id".to_string()))?;

        let user = match state.db()?.get_user(user_id) {
            Ok(user) => user,
            Err(StorageError::NotFound(_)) => {
                return Err(ApiError::Unauthorized("Unknown user".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Session {
            user_id: user.id,
            role: user.role,
        })
    }
}
