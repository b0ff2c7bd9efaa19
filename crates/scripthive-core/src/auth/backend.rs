use crate::api::{ApiClient, ApiError};
use crate::models::UserProfile;

use super::Session;

/// The remote calls the session context depends on.
#[allow(async_fn_in_trait)]
pub trait AuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError>;

    async fn fetch_profile(&self, session: &Session) -> Result<UserProfile, ApiError>;
}

impl AuthBackend for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        ApiClient::login(self, email, password).await
    }

    async fn fetch_profile(&self, session: &Session) -> Result<UserProfile, ApiError> {
        self.with_token(session.token.clone())
            .fetch_user_profile(session.user_id)
            .await
    }
}
