//! Authentication and account service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use validator::Validate;

use attenda_common::{AppError, AppResult, Config, IdGenerator};
use attenda_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use sea_orm::Set;

use crate::services::mail::{EmailMessage, MailService};
use crate::services::push::PushService;

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Username.
    pub username: String,
    /// Role string ("ADMIN" | "USER").
    pub role: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Access/refresh token pair issued on register, login and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// JWT signing keys and lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    /// Build signing keys from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.jwt.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.jwt.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.jwt.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.jwt.refresh_secret.as_bytes()),
            access_ttl: Duration::minutes(config.jwt.access_ttl_minutes),
            refresh_ttl: Duration::days(config.jwt.refresh_ttl_days),
        }
    }

    /// Sign an access/refresh pair for a user.
    pub fn sign_pair(&self, user: &user::Model) -> AppResult<TokenPair> {
        let access_token = self.sign(user, &self.access_encoding, self.access_ttl)?;
        let refresh_token = self.sign(user, &self.refresh_encoding, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign(
        &self,
        user: &user::Model,
        key: &EncodingKey,
        ttl: Duration,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: role_str(user.role).to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify an access token and return its claims.
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        decode(token, &self.access_decoding)
    }

    /// Verify a refresh token and return its claims.
    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        decode(token, &self.refresh_decoding)
    }
}

fn decode(token: &str, key: &DecodingKey) -> AppResult<Claims> {
    jsonwebtoken::decode::<Claims>(token, key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

/// Role as carried in JWT claims.
#[must_use]
pub const fn role_str(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "ADMIN",
        UserRole::User => "USER",
    }
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 128))]
    pub first_name: String,

    #[validate(length(min = 1, max = 128))]
    pub last_name: String,

    #[validate(email)]
    pub email: Option<String>,
}

/// Input for changing a password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub old_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Input for updating a profile.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 128))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub last_name: Option<String>,

    /// Profile image URL (set by the API layer after uploading the file).
    pub image_url: Option<String>,
}

/// Authentication service for business logic.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    keys: JwtKeys,
    push: PushService,
    mail: MailService,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        keys: JwtKeys,
        push: PushService,
        mail: MailService,
    ) -> Self {
        Self {
            user_repo,
            keys,
            push,
            mail,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user account. Accounts start inactive.
    pub async fn register(&self, input: RegisterInput) -> AppResult<(user::Model, TokenPair)> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Username is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            password_hash: Set(password_hash),
            role: Set(UserRole::User),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        let tokens = self.keys.sign_pair(&user)?;

        Ok((user, tokens))
    }

    /// Sign in with username and password.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(user::Model, TokenPair)> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_deleted {
            return Err(AppError::BadRequest("User is deleted".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Forbidden(
                "Your account is not active yet".to_string(),
            ));
        }
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.keys.sign_pair(&user)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.keys.verify_refresh(refresh_token)?;

        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        self.keys.sign_pair(&user)
    }

    /// Resolve an access token to its user, enforcing account state.
    pub async fn authenticate_token(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.keys.verify_access(token)?;

        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_deleted {
            return Err(AppError::Forbidden("Your account is not found".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Forbidden(
                "Your account is not active yet".to_string(),
            ));
        }

        Ok(user)
    }

    /// Change a user's password.
    pub async fn change_password(&self, user_id: &str, input: ChangePasswordInput) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        if user.is_deleted {
            return Err(AppError::BadRequest("The account is deleted".to_string()));
        }
        if !verify_password(&input.old_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Old password is incorrect".to_string()));
        }

        let new_hash = hash_password(&input.new_password)?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        Ok(())
    }

    /// Activate a registered account (admin action).
    pub async fn activate_account(&self, user_id: &str) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if user.is_deleted {
            return Err(AppError::BadRequest("User is deleted".to_string()));
        }

        let fcm_token = user.fcm_token.clone();
        let email = user.email.clone();
        let first_name = user.first_name.clone();

        let mut active: user::ActiveModel = user.into();
        active.is_active = Set(true);
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.user_repo.update(active).await?;

        // Activation side effects happen after the write and never fail it
        if let Some(token) = fcm_token {
            if let Err(e) = self
                .push
                .send_push(
                    &token,
                    "Registration Approved!",
                    "Your account has been approved. You can now log in.",
                    Some(serde_json::json!({ "status": "approved" })),
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to send activation push");
            }
        }

        if let Some(to) = email {
            let message = EmailMessage {
                to,
                subject: "Your account has been activated".to_string(),
                text_body: format!(
                    "Hi {first_name},\n\nYour account has been approved. You can now log in."
                ),
                html_body: None,
            };
            if let Err(e) = self.mail.enqueue(message).await {
                tracing::warn!(error = %e, "Failed to enqueue activation email");
            }
        }

        Ok(updated)
    }

    /// Update a user's profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attenda_common::config::{
        BootstrapConfig, DatabaseConfig, JwtConfig, RedisConfig, ServerConfig,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    use crate::services::mail::NoOpMailQueue;
    use crate::services::push::NoOpPush;

    fn create_test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                url: "https://example.com".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/attenda_test".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost".to_string(),
            },
            jwt: JwtConfig {
                access_secret: "access-secret-for-tests".to_string(),
                refresh_secret: "refresh-secret-for-tests".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 30,
            },
            bootstrap: BootstrapConfig {
                admin_username: "admin".to_string(),
                admin_password: "admin-password".to_string(),
                admin_first_name: "Admin".to_string(),
                admin_last_name: "Admin".to_string(),
            },
            fcm: attenda_common::config::FcmConfig::default(),
            smtp: attenda_common::config::SmtpConfig::default(),
            storage: attenda_common::config::StorageSettings::default(),
            scheduler: attenda_common::config::SchedulerSettings::default(),
        }
    }

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: None,
            password_hash: hash_password("password123").unwrap(),
            role: UserRole::User,
            is_active: true,
            is_deleted: false,
            point: 0,
            fcm_token: None,
            image_url: None,
            is_event_approve_notify: true,
            is_new_event_notify: true,
            is_event_reminder: true,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> AuthService {
        let keys = JwtKeys::from_config(&create_test_config());
        AuthService::new(
            UserRepository::new(db),
            keys,
            Arc::new(NoOpPush),
            Arc::new(NoOpMailQueue),
        )
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_token_pair_verifies_with_matching_secret() {
        let keys = JwtKeys::from_config(&create_test_config());
        let user = create_test_user("user1", "alice");

        let pair = keys.sign_pair(&user).unwrap();

        let access = keys.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.sub, "user1");
        assert_eq!(access.username, "alice");
        assert_eq!(access.role, "USER");

        let refresh = keys.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, "user1");
    }

    #[test]
    fn test_tokens_do_not_cross_verify() {
        let keys = JwtKeys::from_config(&create_test_config());
        let user = create_test_user("user1", "alice");

        let pair = keys.sign_pair(&user).unwrap();

        // Access token must not validate as a refresh token and vice versa
        assert!(keys.verify_refresh(&pair.access_token).is_err());
        assert!(keys.verify_access(&pair.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.login("nobody", "password123").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_account() {
        let mut user = create_test_user("user1", "alice");
        user.is_active = false;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.login("alice", "password123").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let user = create_test_user("user1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.login("alice", "not-the-password").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_token_rejects_deleted_account() {
        let keys = JwtKeys::from_config(&create_test_config());
        let mut user = create_test_user("user1", "alice");
        let token = keys.sign_pair(&user).unwrap().access_token;
        user.is_deleted = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.authenticate_token(&token).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            username: "alice".to_string(),
            password: "short".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            password: "password123".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: Some("alice@example.com".to_string()),
        };
        assert!(input.validate().is_ok());
    }
}
