//! API client for the ScriptHive REST backend.
//!
//! Every portal view is backed by one or two calls made through `ApiClient`.
//! Failures are returned as [`ApiError`]; nothing is retried automatically.

use std::path::Path;
use std::time::Duration;

use reqwest::{multipart, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::models::{
    DashboardStats, DataEnvelope, Envelope, FeeLimit, FeeLimitKind, FeeLimitRequest,
    ProfileUpdate, Project, Transaction, User, UserProfile,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default backend location. Overridable through configuration.
pub const DEFAULT_BASE_URL: &str = "https://onlinewriting.onrender.com/api/open";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Multipart field name the profile-picture endpoint expects.
const PICTURE_FIELD: &str = "file";

/// API client for ScriptHive.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ===== Response handling =====

    /// Map a non-2xx response to an error, preferring the server's message
    /// for client errors the status code alone does not explain.
    fn error_from_body(status: StatusCode, body: &str) -> ApiError {
        match status.as_u16() {
            401 | 403 | 404 | 429 | 500..=599 => ApiError::from_status(status, body),
            _ => match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
                Ok(envelope) if envelope.message.is_some() => {
                    ApiError::Rejected(envelope.message_or(""))
                }
                _ => ApiError::from_status(status, body),
            },
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Self::error_from_body(status, &body))
        }
    }

    /// Parse a `{status, message, body}` reply, requiring `status == "success"`.
    fn parse_envelope<T: DeserializeOwned>(text: &str, fallback: &str) -> Result<Envelope<T>, ApiError> {
        let envelope: Envelope<T> = serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", fallback, e)))?;
        if !envelope.is_success() {
            return Err(ApiError::Rejected(envelope.message_or(fallback)));
        }
        Ok(envelope)
    }

    async fn send_for_body<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = Self::check_response(builder.send().await?).await?;
        let text = response.text().await?;
        Self::parse_envelope::<T>(&text, fallback)?
            .body
            .ok_or_else(|| ApiError::InvalidResponse(format!("{}: missing body", fallback)))
    }

    /// Send a request whose reply only carries a message.
    async fn send_for_message(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<String, ApiError> {
        let response = Self::check_response(builder.send().await?).await?;
        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<Envelope<serde_json::Value>>(&text)
            .map(|e| e.message_or(fallback))
            .unwrap_or_else(|_| fallback.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = Self::check_response(self.request(Method::GET, path).send().await?).await?;
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = Self::check_response(
            self.request(Method::POST, path).json(body).send().await?,
        )
        .await?;
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    // ===== Authentication =====

    /// Exchange credentials for a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let builder = self
            .request(Method::POST, "/users/login")
            .json(&json!({ "email": email, "password": password }));

        let session: Session = self.send_for_body(builder, "Invalid credentials").await?;
        if !session.is_complete() {
            warn!(user_id = session.user_id, "Login response is missing identity fields");
            return Err(ApiError::InvalidResponse(
                "login response is missing identity fields".to_string(),
            ));
        }

        info!(user_id = session.user_id, "Authenticated");
        Ok(session)
    }

    /// Ask the backend to email a one-time password.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let builder = self
            .request(Method::POST, "/users/forgot-password")
            .json(&json!({ "email": email }));
        self.send_for_message(builder, "Check your email for the OTP").await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let builder = self
            .request(Method::POST, "/users/reset-password")
            .json(&json!({ "email": email, "otp": otp, "newPassword": new_password }));
        self.send_for_message(builder, "You can now log in with your new password")
            .await
    }

    // ===== Users =====

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let users: Vec<User> = self
            .send_for_body(self.request(Method::GET, "/users"), "Failed to fetch users")
            .await?;
        debug!(count = users.len(), "Fetched users");
        Ok(users)
    }

    pub async fn fetch_user_profile(&self, user_id: i64) -> Result<UserProfile, ApiError> {
        self.send_for_body(
            self.request(Method::GET, &format!("/users/{}", user_id)),
            "Failed to fetch profile",
        )
        .await
    }

    pub async fn update_user(&self, user_id: i64, update: &ProfileUpdate) -> Result<(), ApiError> {
        let response = Self::check_response(
            self.request(Method::PUT, &format!("/users/{}", user_id))
                .json(update)
                .send()
                .await?,
        )
        .await?;
        let text = response.text().await?;
        Self::parse_envelope::<serde_json::Value>(&text, "Failed to update profile")?;
        info!(user_id, "Profile updated");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        Self::check_response(
            self.request(Method::DELETE, &format!("/users/{}", user_id))
                .send()
                .await?,
        )
        .await?;
        info!(user_id, "User deleted");
        Ok(())
    }

    /// URL of the user's profile picture, if one has been uploaded.
    pub async fn fetch_profile_picture(&self, user_id: i64) -> Result<Option<String>, ApiError> {
        let response = self
            .request(Method::GET, &format!("/users/{}/profile-picture", user_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        match serde_json::from_str::<Envelope<String>>(&text) {
            Ok(envelope) if envelope.is_success() => {
                Ok(envelope.body.filter(|url| !url.trim().is_empty()))
            }
            Ok(_) => Ok(None),
            Err(e) => Err(ApiError::InvalidResponse(format!(
                "Failed to parse profile picture response: {}",
                e
            ))),
        }
    }

    pub async fn upload_profile_picture(&self, user_id: i64, path: &Path) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "profile-picture".to_string());
        debug!(size = bytes.len(), %file_name, "Uploading profile picture");

        let form = multipart::Form::new()
            .part(PICTURE_FIELD, multipart::Part::bytes(bytes).file_name(file_name));
        let builder = self
            .request(Method::POST, &format!("/users/{}/profile-picture", user_id))
            .multipart(form);
        self.send_for_message(builder, "Profile picture updated").await
    }

    // ===== Projects and payments =====

    pub async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError> {
        let envelope: DataEnvelope<Project> = self.get_json("/projects").await?;
        if !envelope.is_success() {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Failed to fetch projects".to_string()),
            ));
        }
        debug!(count = envelope.data.len(), "Fetched projects");
        Ok(envelope.data)
    }

    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        let envelope: DataEnvelope<Transaction> = self.get_json("/transactions").await?;
        debug!(count = envelope.data.len(), "Fetched transactions");
        Ok(envelope.data)
    }

    /// Fetch users, projects and transactions concurrently and aggregate them.
    pub async fn fetch_dashboard(&self) -> Result<DashboardStats, ApiError> {
        let (users, projects, transactions) = futures::try_join!(
            self.fetch_users(),
            self.fetch_projects(),
            self.fetch_transactions()
        )?;
        Ok(DashboardStats::compute(&users, &projects, &transactions))
    }

    // ===== Fee limits =====

    pub async fn fetch_fee_limits(&self, kind: FeeLimitKind) -> Result<Vec<FeeLimit>, ApiError> {
        let limits: Vec<FeeLimit> = self.get_json(kind.path()).await?;
        Ok(FeeLimit::without_placeholders(limits))
    }

    /// Create or replace the limit for a role.
    pub async fn save_fee_limit(
        &self,
        kind: FeeLimitKind,
        request: &FeeLimitRequest,
    ) -> Result<FeeLimit, ApiError> {
        let saved: FeeLimit = self.post_json(kind.path(), request).await?;
        if saved.id.is_empty() {
            return Err(ApiError::Rejected(format!(
                "Failed to save {}.",
                kind.title().to_lowercase()
            )));
        }
        info!(kind = ?kind, role = %saved.role, "Fee limit saved");
        Ok(saved)
    }

    pub async fn delete_fee_limit(&self, kind: FeeLimitKind, id: &str) -> Result<(), ApiError> {
        Self::check_response(
            self.request(Method::DELETE, &format!("{}/{}", kind.path(), id))
                .send()
                .await?,
        )
        .await?;
        info!(kind = ?kind, id, "Fee limit deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://api.example.com/open/").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/open");
        assert_eq!(client.url("/users"), "https://api.example.com/open/users");
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        let authed = client.with_token("abc123".to_string());
        assert_eq!(authed.base_url(), DEFAULT_BASE_URL);
        assert_eq!(authed.token.as_deref(), Some("abc123"));
        assert!(client.token.is_none());
    }

    #[test]
    fn test_error_from_body_prefers_server_message() {
        let err = ApiClient::error_from_body(
            StatusCode::BAD_REQUEST,
            r#"{"status":"error","message":"Invalid credentials"}"#,
        );
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Invalid credentials"));

        let err = ApiClient::error_from_body(StatusCode::BAD_REQUEST, "<html>");
        assert!(matches!(err, ApiError::InvalidResponse(_)));

        let err = ApiClient::error_from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"whatever"}"#,
        );
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_parse_envelope() {
        let parsed = ApiClient::parse_envelope::<Session>(
            r#"{"status":"success","message":"ok",
                "body":{"token":"abc123","userId":7,"fullName":"Ada Admin","userName":"ada"}}"#,
            "Invalid credentials",
        )
        .unwrap();
        let session = parsed.body.unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.token, "abc123");

        let rejected = ApiClient::parse_envelope::<Session>(
            r#"{"status":"error"}"#,
            "Invalid credentials",
        );
        assert!(matches!(rejected, Err(ApiError::Rejected(ref m)) if m == "Invalid credentials"));

        let garbage = ApiClient::parse_envelope::<Session>("nope", "Invalid credentials");
        assert!(matches!(garbage, Err(ApiError::InvalidResponse(_))));
    }
}
