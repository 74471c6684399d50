//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};

use attenda_common::{AppError, AppResult};
use attenda_db::entities::user::{self, UserRole};

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Reject non-admin callers.
pub fn require_admin(user: &user::Model) -> AppResult<()> {
    if user.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Admin privileges required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(role: UserRole) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: None,
            password_hash: "x".to_string(),
            role,
            is_active: true,
            is_deleted: false,
            point: 0,
            fcm_token: None,
            image_url: None,
            is_event_approve_notify: true,
            is_new_event_notify: true,
            is_event_reminder: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&test_user(UserRole::Admin)).is_ok());
        assert!(require_admin(&test_user(UserRole::User)).is_err());
    }
}
