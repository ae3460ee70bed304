//! Session extractor
//!
//! Validates the bearer token and yields the caller's [`UserScope`].

use crate::error::ApiError;
use crate::gateway::UserScope;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

/// Authenticated caller extracted from the session token
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub scope: UserScope,
    pub email: Option<String>,
}

impl SessionUser {
    #[inline]
    pub fn user_id(&self) -> Uuid {
        self.scope.user_id()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        // Check Bearer prefix
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

        let claims = app_state
            .verifier()
            .verify(token)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        Ok(SessionUser {
            scope: UserScope::new(user_id, token.to_string()),
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let user = SessionUser {
            scope: UserScope::new(Uuid::new_v4(), "secret-token".to_string()),
            email: None,
        };
        let debug_str = format!("{:?}", user);
        assert!(debug_str.contains("SessionUser"));
        assert!(!debug_str.contains("secret-token"));
    }
}
