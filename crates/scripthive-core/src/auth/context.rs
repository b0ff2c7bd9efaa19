//! The session context handed to every part of the UI that needs to know who
//! is signed in.
//!
//! `AuthContext` ties together the persisted [`SessionStore`], the
//! [`SessionGuard`] transition table and a memoized profile. It is created
//! once at startup and owned by the application; nothing here is global.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::forms::{LoginForm, ValidationError};
use crate::models::UserProfile;
use crate::requests::InFlight;

use super::backend::AuthBackend;
use super::guard::{GuardEvent, GuardState, Navigation, Route, SessionGuard};
use super::session::{Session, SessionStore};
use super::storage::KeyValueStorage;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("A sign-in request is already in progress")]
    InProgress,
}

impl LoginError {
    pub fn user_message(&self) -> String {
        match self {
            LoginError::Validation(e) => e.to_string(),
            LoginError::Api(e) => e.user_message(),
            LoginError::InProgress => self.to_string(),
        }
    }
}

pub struct AuthContext<B, S> {
    store: SessionStore<S>,
    guard: SessionGuard,
    backend: B,
    session: Option<Session>,
    profile: Option<UserProfile>,
    /// Bumped whenever the session changes; profile fetches started under an
    /// older generation are not memoized.
    generation: u64,
    login: InFlight,
}

impl<B: AuthBackend, S: KeyValueStorage> AuthContext<B, S> {
    pub fn new(backend: B, storage: S) -> Self {
        Self {
            store: SessionStore::new(storage),
            guard: SessionGuard::new(),
            backend,
            session: None,
            profile: None,
            generation: 0,
            login: InFlight::default(),
        }
    }

    /// Read the stored session and leave the `Unknown` state. Runs once;
    /// later calls just report the current state.
    pub fn bootstrap(&mut self) -> GuardState {
        if self.guard.state() != GuardState::Unknown {
            return self.guard.state();
        }

        self.session = self.store.load();
        let event = if self.session.is_some() {
            GuardEvent::SessionLoaded
        } else {
            GuardEvent::SessionMissing
        };
        let state = self.guard.apply(event);
        info!(?state, "Session bootstrap complete");
        state
    }

    pub fn state(&self) -> GuardState {
        self.guard.state()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.guard.state() == GuardState::Authenticated
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn resolve(&self, route: Route) -> Navigation {
        self.guard.resolve(route)
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        self.guard.resolve_path(path)
    }

    // =========================================================================
    // Login / logout
    // =========================================================================

    pub fn login_pending(&self) -> bool {
        self.login.is_pending()
    }

    /// Validate the form and mark a login as outstanding. No network call is
    /// made here; on error nothing changes.
    pub fn begin_login(&mut self, form: &LoginForm) -> Result<(), LoginError> {
        form.validate()?;
        if !self.login.try_begin() {
            return Err(LoginError::InProgress);
        }
        Ok(())
    }

    /// Adopt the session returned by a successful login.
    pub fn complete_login(&mut self, session: Session) -> Result<Route, LoginError> {
        self.login.finish();

        if !session.is_complete() {
            return Err(ApiError::InvalidResponse(
                "login response is missing identity fields".to_string(),
            )
            .into());
        }

        if let Err(e) = self.store.save(&session) {
            warn!(error = %e, "Failed to persist session");
        }

        info!(user_id = session.user_id, "Login successful");
        self.session = Some(session);
        self.profile = None;
        self.generation += 1;

        if self.guard.state() == GuardState::Unknown {
            self.guard.apply(GuardEvent::SessionMissing);
        }
        self.guard.apply(GuardEvent::LoggedIn);
        Ok(Route::LANDING)
    }

    /// Release the in-flight flag after a failed login. The session, if
    /// any, is left untouched.
    pub fn fail_login(&mut self) {
        self.login.finish();
    }

    /// Validate, call the backend and adopt the session.
    pub async fn login(&mut self, form: &LoginForm) -> Result<Route, LoginError> {
        self.begin_login(form)?;

        match self.backend.login(form.email.trim(), &form.password).await {
            Ok(session) => self.complete_login(session),
            Err(e) => {
                self.fail_login();
                warn!(error = %e, "Login failed");
                Err(e.into())
            }
        }
    }

    /// Drop the session everywhere and return the route to show next.
    pub fn logout(&mut self) -> Route {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.session = None;
        self.profile = None;
        self.generation += 1;
        self.guard.apply(GuardEvent::LoggedOut);
        info!("Logged out");
        Route::Login
    }

    // =========================================================================
    // Profile memo
    // =========================================================================

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cached_profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Read-through accessor: fetched once per session, failures not cached.
    pub async fn profile(&mut self) -> Result<UserProfile, ApiError> {
        if let Some(ref profile) = self.profile {
            return Ok(profile.clone());
        }
        let session = self.session.as_ref().ok_or(ApiError::Unauthorized)?;

        let profile = self.backend.fetch_profile(session).await?;
        self.profile = Some(profile.clone());
        Ok(profile)
    }

    /// Memoize a profile fetched elsewhere, provided the session it was
    /// fetched for is still the current one.
    pub fn remember_profile(&mut self, generation: u64, profile: UserProfile) -> bool {
        if generation != self.generation || self.session.is_none() {
            debug!(generation, current = self.generation, "Dropping profile from old session");
            return false;
        }
        self.profile = Some(profile);
        true
    }

    pub fn invalidate_profile(&mut self) {
        self.profile = None;
    }
}

impl<S: KeyValueStorage> AuthContext<ApiClient, S> {
    /// Client carrying the current session's token.
    pub fn api(&self) -> ApiClient {
        match self.session {
            Some(ref session) => self.backend.with_token(session.token.clone()),
            None => self.backend.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::session::SESSION_KEY;
    use crate::auth::storage::MemoryStorage;

    enum LoginReply {
        Accept(Session),
        Reject(&'static str),
    }

    struct MockBackend {
        login_reply: LoginReply,
        profile_ok: bool,
        login_calls: AtomicUsize,
        profile_calls: AtomicUsize,
    }

    impl MockBackend {
        fn accepting() -> Self {
            Self {
                login_reply: LoginReply::Accept(ada()),
                profile_ok: true,
                login_calls: AtomicUsize::new(0),
                profile_calls: AtomicUsize::new(0),
            }
        }

        fn rejecting() -> Self {
            Self {
                login_reply: LoginReply::Reject("Invalid credentials"),
                ..Self::accepting()
            }
        }
    }

    impl AuthBackend for MockBackend {
        async fn login(&self, _email: &str, _password: &str) -> Result<Session, ApiError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            match self.login_reply {
                LoginReply::Accept(ref session) => Ok(session.clone()),
                LoginReply::Reject(message) => Err(ApiError::Rejected(message.to_string())),
            }
        }

        async fn fetch_profile(&self, session: &Session) -> Result<UserProfile, ApiError> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            if self.profile_ok {
                Ok(UserProfile {
                    full_name: session.full_name.clone(),
                    username: session.user_name.clone(),
                    email: "admin@scripthive.com".to_string(),
                    role: "admin".to_string(),
                    phone: String::new(),
                })
            } else {
                Err(ApiError::ServerError("boom".to_string()))
            }
        }
    }

    fn ada() -> Session {
        Session {
            token: "abc123".to_string(),
            user_id: 7,
            full_name: "Ada Admin".to_string(),
            user_name: "ada".to_string(),
        }
    }

    fn context(backend: MockBackend) -> (AuthContext<MockBackend, MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (AuthContext::new(backend, storage.clone()), storage)
    }

    fn logged_in() -> (AuthContext<MockBackend, MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        SessionStore::new(storage.clone()).save(&ada()).unwrap();
        let mut ctx = AuthContext::new(MockBackend::accepting(), storage.clone());
        ctx.bootstrap();
        (ctx, storage)
    }

    #[test]
    fn test_unknown_until_bootstrap() {
        let (ctx, _) = context(MockBackend::accepting());
        assert_eq!(ctx.state(), GuardState::Unknown);
        assert_eq!(ctx.resolve(Route::Dashboard), Navigation::Loading);
        assert_eq!(ctx.navigate("/login"), Navigation::Loading);
    }

    #[test]
    fn test_bootstrap_with_stored_session() {
        let (ctx, _) = logged_in();
        assert_eq!(ctx.state(), GuardState::Authenticated);
        assert_eq!(ctx.session(), Some(&ada()));
        assert_eq!(ctx.navigate("/login").destination(), Some(Route::Dashboard));
    }

    #[test]
    fn test_bootstrap_with_garbage_purges() {
        let (mut ctx, storage) = context(MockBackend::accepting());
        storage.set(SESSION_KEY, "not-json").unwrap();

        assert_eq!(ctx.bootstrap(), GuardState::Unauthenticated);
        assert!(!storage.contains(SESSION_KEY));
        assert_eq!(ctx.navigate("/users").destination(), Some(Route::Login));
    }

    #[test]
    fn test_bootstrap_runs_once() {
        let (mut ctx, storage) = context(MockBackend::accepting());
        assert_eq!(ctx.bootstrap(), GuardState::Unauthenticated);

        SessionStore::new(storage).save(&ada()).unwrap();
        assert_eq!(ctx.bootstrap(), GuardState::Unauthenticated);
        assert!(ctx.session().is_none());
    }

    #[tokio::test]
    async fn test_login_scenario() {
        let (mut ctx, storage) = context(MockBackend::accepting());
        ctx.bootstrap();

        let route = ctx
            .login(&LoginForm::new("admin@scripthive.com", "secret"))
            .await
            .unwrap();

        assert_eq!(route, Route::Dashboard);
        assert_eq!(ctx.state(), GuardState::Authenticated);
        assert_eq!(ctx.session(), Some(&ada()));
        assert_eq!(SessionStore::new(storage).load(), Some(ada()));
        assert_eq!(ctx.backend().login_calls.load(Ordering::SeqCst), 1);
        assert!(!ctx.login_pending());
    }

    #[tokio::test]
    async fn test_empty_password_makes_no_call() {
        let (mut ctx, storage) = context(MockBackend::accepting());
        ctx.bootstrap();

        let err = ctx
            .login(&LoginForm::new("admin@scripthive.com", ""))
            .await
            .unwrap_err();

        assert!(matches!(err, LoginError::Validation(ValidationError::MissingCredentials)));
        assert_eq!(err.user_message(), "Please fill in all fields");
        assert_eq!(ctx.backend().login_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.state(), GuardState::Unauthenticated);
        assert!(!storage.contains(SESSION_KEY));
    }

    #[tokio::test]
    async fn test_bad_credentials_leave_session_untouched() {
        let (mut ctx, storage) = context(MockBackend::rejecting());
        ctx.bootstrap();

        let err = ctx
            .login(&LoginForm::new("admin@scripthive.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(ctx.state(), GuardState::Unauthenticated);
        assert!(ctx.session().is_none());
        assert!(!storage.contains(SESSION_KEY));
        assert!(!ctx.login_pending());
    }

    #[test]
    fn test_second_submit_while_pending_is_refused() {
        let (mut ctx, _) = context(MockBackend::accepting());
        ctx.bootstrap();
        let form = LoginForm::new("admin@scripthive.com", "secret");

        ctx.begin_login(&form).unwrap();
        assert!(matches!(ctx.begin_login(&form), Err(LoginError::InProgress)));

        ctx.fail_login();
        assert!(ctx.begin_login(&form).is_ok());
    }

    #[test]
    fn test_incomplete_login_response_rejected() {
        let (mut ctx, storage) = context(MockBackend::accepting());
        ctx.bootstrap();
        ctx.begin_login(&LoginForm::new("a@x.com", "pw")).unwrap();

        let mut partial = ada();
        partial.token.clear();
        assert!(ctx.complete_login(partial).is_err());
        assert_eq!(ctx.state(), GuardState::Unauthenticated);
        assert!(!storage.contains(SESSION_KEY));
        assert!(!ctx.login_pending());
    }

    #[test]
    fn test_logout_scenario() {
        let (mut ctx, storage) = logged_in();

        assert_eq!(ctx.logout(), Route::Login);
        assert!(ctx.session().is_none());
        assert_eq!(ctx.state(), GuardState::Unauthenticated);
        assert!(!storage.contains(SESSION_KEY));
        assert_eq!(
            ctx.resolve(Route::Profile),
            Navigation::Redirect {
                from: Route::Profile,
                to: Route::Login
            }
        );
    }

    #[tokio::test]
    async fn test_profile_is_memoized_per_session() {
        let (mut ctx, _) = logged_in();

        let first = ctx.profile().await.unwrap();
        let second = ctx.profile().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.backend().profile_calls.load(Ordering::SeqCst), 1);

        ctx.logout();
        assert!(ctx.cached_profile().is_none());
        assert!(matches!(ctx.profile().await, Err(ApiError::Unauthorized)));
        assert_eq!(ctx.backend().profile_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_session() {
        let storage = MemoryStorage::new();
        SessionStore::new(storage.clone()).save(&ada()).unwrap();
        let backend = MockBackend {
            profile_ok: false,
            ..MockBackend::accepting()
        };
        let mut ctx = AuthContext::new(backend, storage.clone());
        ctx.bootstrap();

        assert!(ctx.profile().await.is_err());
        assert_eq!(ctx.state(), GuardState::Authenticated);
        assert!(storage.contains(SESSION_KEY));
        assert!(ctx.cached_profile().is_none());
    }

    #[test]
    fn test_remember_profile_ignores_old_generation() {
        let (mut ctx, _) = logged_in();
        let generation = ctx.generation();
        let profile = UserProfile {
            full_name: "Ada Admin".to_string(),
            ..Default::default()
        };

        ctx.logout();
        assert!(!ctx.remember_profile(generation, profile.clone()));
        assert!(ctx.cached_profile().is_none());

        let (mut ctx, _) = logged_in();
        assert!(ctx.remember_profile(ctx.generation(), profile));
        assert!(ctx.cached_profile().is_some());
        ctx.invalidate_profile();
        assert!(ctx.cached_profile().is_none());
    }
}
