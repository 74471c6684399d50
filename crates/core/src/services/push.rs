//! Push notification dispatch.
//!
//! Core services never talk to the push provider inside a transaction:
//! they collect [`PendingPush`] messages while mutating state and hand them
//! to a [`PushDispatcher`] only after the transaction has committed.
//! Dispatch failures are logged, never raised.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use attenda_common::{AppError, AppResult};

/// Outcome of a bulk push dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPushOutcome {
    /// Number of tokens the provider accepted.
    pub success_count: usize,
    /// Tokens the provider reported as failed (invalid or unregistered).
    pub failed_tokens: Vec<String>,
}

/// A notification accumulated during a transaction, dispatched after commit.
#[derive(Debug, Clone)]
pub struct PendingPush {
    /// Target device token.
    pub token: String,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Provider-specific data payload.
    pub data: Option<Value>,
}

/// Trait for push notification dispatch.
///
/// This allows the core services to fire notifications without depending on
/// the provider implementation.
#[async_trait]
pub trait PushDispatcher: Send + Sync {
    /// Send a notification to a single device token.
    async fn send_push(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> AppResult<()>;

    /// Send a notification to many device tokens, isolating per-token
    /// failures.
    async fn send_bulk_push(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> AppResult<BulkPushOutcome>;
}

/// Shared handle to the configured push dispatcher.
pub type PushService = Arc<dyn PushDispatcher>;

/// Dispatch a batch of pending notifications, logging failures.
pub async fn dispatch_after_commit(dispatcher: &PushService, pending: Vec<PendingPush>) {
    for push in pending {
        if let Err(e) = dispatcher
            .send_push(&push.token, &push.title, &push.body, push.data)
            .await
        {
            tracing::warn!(error = %e, title = %push.title, "Failed to send push notification");
        }
    }
}

/// FCM-backed push dispatcher.
#[derive(Clone)]
pub struct FcmDispatcher {
    http_client: reqwest::Client,
    server_key: String,
    endpoint: String,
}

/// Default FCM send endpoint.
const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// Provider error codes that mean the token is permanently dead.
const INVALID_TOKEN_ERRORS: [&str; 3] = [
    "NotRegistered",
    "InvalidRegistration",
    "MismatchSenderId",
];

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    error: Option<String>,
}

impl FcmDispatcher {
    /// Create a new FCM dispatcher.
    #[must_use]
    pub fn new(server_key: String, endpoint: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            server_key,
            endpoint: endpoint.unwrap_or_else(|| FCM_ENDPOINT.to_string()),
        }
    }

    async fn post(&self, payload: Value) -> AppResult<FcmResponse> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("FCM request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "FCM returned status {}",
                response.status()
            )));
        }

        response
            .json::<FcmResponse>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid FCM response: {e}")))
    }
}

#[async_trait]
impl PushDispatcher for FcmDispatcher {
    async fn send_push(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> AppResult<()> {
        if token.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Invalid FCM token: token is missing".to_string(),
            ));
        }

        let payload = serde_json::json!({
            "to": token,
            "notification": { "title": title, "body": body },
            "data": data,
        });

        let response = self.post(payload).await?;

        if let Some(error) = response.results.first().and_then(|r| r.error.as_deref()) {
            if INVALID_TOKEN_ERRORS.contains(&error) {
                return Err(AppError::BadRequest(
                    "Device token is invalid or no longer registered".to_string(),
                ));
            }
            return Err(AppError::ExternalService(format!(
                "Failed to send notification: {error}"
            )));
        }

        tracing::debug!(title = %title, "Push notification sent");
        Ok(())
    }

    async fn send_bulk_push(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> AppResult<BulkPushOutcome> {
        let valid_tokens: Vec<&String> = tokens.iter().filter(|t| !t.trim().is_empty()).collect();

        if valid_tokens.is_empty() {
            tracing::warn!("No valid FCM tokens provided for bulk notification");
            return Ok(BulkPushOutcome::default());
        }

        let payload = serde_json::json!({
            "registration_ids": valid_tokens,
            "notification": { "title": title, "body": body },
            "data": data,
        });

        let response = self.post(payload).await?;

        let mut failed_tokens = Vec::new();
        for (index, result) in response.results.iter().enumerate() {
            if let Some(error) = result.error.as_deref() {
                tracing::warn!(error = %error, "FCM rejected a token in bulk send");
                if let Some(token) = valid_tokens.get(index) {
                    failed_tokens.push((*token).clone());
                }
            }
        }

        let success_count = valid_tokens.len() - failed_tokens.len();
        tracing::info!(
            success = success_count,
            total = valid_tokens.len(),
            "Bulk push notification dispatched"
        );

        Ok(BulkPushOutcome {
            success_count,
            failed_tokens,
        })
    }
}

/// No-op dispatcher for deployments without push credentials and for tests.
#[derive(Debug, Clone, Default)]
pub struct NoOpPush;

#[async_trait]
impl PushDispatcher for NoOpPush {
    async fn send_push(
        &self,
        _token: &str,
        title: &str,
        _body: &str,
        _data: Option<Value>,
    ) -> AppResult<()> {
        tracing::debug!(title = %title, "Push dispatch disabled, dropping notification");
        Ok(())
    }

    async fn send_bulk_push(
        &self,
        tokens: &[String],
        title: &str,
        _body: &str,
        _data: Option<Value>,
    ) -> AppResult<BulkPushOutcome> {
        tracing::debug!(title = %title, count = tokens.len(), "Push dispatch disabled, dropping bulk notification");
        Ok(BulkPushOutcome {
            success_count: tokens.len(),
            failed_tokens: vec![],
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_bulk_reports_all_success() {
        let dispatcher = NoOpPush;
        let tokens = vec!["a".to_string(), "b".to_string()];
        let outcome = dispatcher
            .send_bulk_push(&tokens, "title", "body", None)
            .await
            .unwrap();
        assert_eq!(outcome.success_count, 2);
        assert!(outcome.failed_tokens.is_empty());
    }

    #[test]
    fn test_invalid_token_errors_cover_unregistered() {
        assert!(INVALID_TOKEN_ERRORS.contains(&"NotRegistered"));
        assert!(INVALID_TOKEN_ERRORS.contains(&"InvalidRegistration"));
    }
}
