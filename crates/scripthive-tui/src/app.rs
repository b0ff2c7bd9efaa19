//! Application state management for the ScriptHive admin portal.
//!
//! This module contains the core `App` struct that owns the session context,
//! the per-view data and form state, and the channel background requests
//! report back on.

use std::future::Future;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use scripthive_core::api::{ApiClient, ApiError};
use scripthive_core::auth::{AuthContext, Navigation, Route, Session, Storage};
use scripthive_core::config::Config;
use scripthive_core::forms::{FeeLimitForm, ForgotPasswordForm, LoginForm, ResetPasswordForm};
use scripthive_core::models::{
    DashboardStats, FeeLimit, FeeLimitKind, ProfileUpdate, Project, Transaction, User,
    UserProfile,
};
use scripthive_core::requests::{InFlight, Tagged, ViewEpoch};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Environment variables that pre-fill the login form.
const EMAIL_ENV: &str = "SCRIPTHIVE_EMAIL";
const PASSWORD_ENV: &str = "SCRIPTHIVE_PASSWORD";

/// The session context as wired up by the binary.
pub type Context = AuthContext<ApiClient, Storage>;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ResettingPassword,
    ShowingHelp,
    EnteringPath,
    EditingLimit,
    EditingProfile,
    EnteringPicturePath,
    ConfirmingDelete,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
    Forgot,
}

/// Which half of the password reset dialog is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    RequestOtp,
    EnterOtp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetFocus {
    Email,
    Otp,
    NewPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitFocus {
    Role,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    Username,
    Email,
    Phone,
}

impl ProfileField {
    pub const ALL: [ProfileField; 4] = [
        ProfileField::FullName,
        ProfileField::Username,
        ProfileField::Email,
        ProfileField::Phone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::FullName => "Full name",
            ProfileField::Username => "Username",
            ProfileField::Email => "Email",
            ProfileField::Phone => "Phone",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ProfileField::FullName => ProfileField::Username,
            ProfileField::Username => ProfileField::Email,
            ProfileField::Email => ProfileField::Phone,
            ProfileField::Phone => ProfileField::FullName,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ProfileField::FullName => ProfileField::Phone,
            ProfileField::Username => ProfileField::FullName,
            ProfileField::Email => ProfileField::Username,
            ProfileField::Phone => ProfileField::Email,
        }
    }

    pub fn value<'a>(&self, update: &'a ProfileUpdate) -> &'a str {
        match self {
            ProfileField::FullName => &update.full_name,
            ProfileField::Username => &update.username,
            ProfileField::Email => &update.email,
            ProfileField::Phone => &update.phone,
        }
    }

    pub fn value_mut<'a>(&self, update: &'a mut ProfileUpdate) -> &'a mut String {
        match self {
            ProfileField::FullName => &mut update.full_name,
            ProfileField::Username => &mut update.username,
            ProfileField::Email => &mut update.email,
            ProfileField::Phone => &mut update.phone,
        }
    }
}

/// Row awaiting delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    User { id: String, name: String },
    FeeLimit { kind: FeeLimitKind, id: String, role: String },
}

impl DeleteTarget {
    pub fn describe(&self) -> String {
        match self {
            DeleteTarget::User { name, .. } => format!("user {}", name),
            DeleteTarget::FeeLimit { kind, role, .. } => {
                format!("the {} limit for {}", kind.title().to_lowercase(), role)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Transient message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results that belong to the view that requested them. Sent tagged with the
/// view epoch and dropped if that view has been unmounted since.
#[derive(Debug)]
pub enum ViewResult {
    Dashboard(Result<DashboardStats, ApiError>),
    ProfilePicture(Result<Option<String>, ApiError>),
    Users(Result<Vec<User>, ApiError>),
    Projects(Result<Vec<Project>, ApiError>),
    Transactions(Result<Vec<Transaction>, ApiError>),
    FeeLimits(FeeLimitKind, Result<Vec<FeeLimit>, ApiError>),
}

/// Outcome of a change the user asked for. Always reported, even if the
/// view that asked has been remounted; the epoch only decides whether the
/// listed rows are patched.
#[derive(Debug)]
pub enum ChangeResult {
    UserDeleted(String, Result<(), ApiError>),
    FeeLimitSaved {
        kind: FeeLimitKind,
        /// Row the form was editing, replaced by the saved one.
        replaces: Option<String>,
        result: Result<FeeLimit, ApiError>,
    },
    FeeLimitDeleted(FeeLimitKind, String, Result<(), ApiError>),
    PictureUploaded(Result<String, ApiError>),
}

/// Everything background tasks send back to the UI loop.
#[derive(Debug)]
pub enum Message {
    Login(Result<Session, ApiError>),
    ForgotPassword(Result<String, ApiError>),
    ResetPassword(Result<String, ApiError>),
    /// Profile fetched for the given session generation.
    Profile(u64, Result<UserProfile, ApiError>),
    /// Profile update for the given session generation.
    ProfileSaved(u64, ProfileUpdate, Result<(), ApiError>),
    View(Tagged<ViewResult>),
    Change(Tagged<ChangeResult>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub ctx: Context,

    // Navigation
    pub state: AppState,
    pub navigation: Navigation,
    pub route: Route,
    pub epoch: ViewEpoch,
    pub path_input: String,
    pub view_loading: bool,
    pub notice: Option<Notice>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Password reset dialog
    pub reset_form: ResetPasswordForm,
    pub reset_step: ResetStep,
    pub reset_focus: ResetFocus,
    pub reset_message: Option<Notice>,
    reset_request: InFlight,

    // Dashboard
    pub stats: Option<DashboardStats>,
    pub picture_url: Option<String>,
    profile_loading: bool,

    // Users
    pub users: Vec<User>,
    pub users_selection: usize,

    // Scripts and payments
    pub projects: Vec<Project>,
    pub scripts_selection: usize,
    pub transactions: Vec<Transaction>,
    pub payments_selection: usize,

    // Registration limits
    pub registration_fees: Vec<FeeLimit>,
    pub budget_limits: Vec<FeeLimit>,
    pub limits_kind: FeeLimitKind,
    pub limits_selection: usize,
    pub limit_form: FeeLimitForm,
    pub limit_form_kind: FeeLimitKind,
    pub limit_focus: LimitFocus,
    pub limit_error: Option<String>,

    // Profile editor
    pub profile_form: ProfileUpdate,
    pub profile_focus: ProfileField,
    pub picture_path: String,

    pub pending_delete: Option<DeleteTarget>,

    // Background task channel
    rx: mpsc::Receiver<Message>,
    tx: mpsc::Sender<Message>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, ctx: Context) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Get credentials from env vars or config
        let login_email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let login_password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        Self {
            config,
            ctx,

            state: AppState::Normal,
            navigation: Navigation::Loading,
            route: Route::Root,
            epoch: ViewEpoch::new(),
            path_input: String::new(),
            view_loading: false,
            notice: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            reset_form: ResetPasswordForm::default(),
            reset_step: ResetStep::RequestOtp,
            reset_focus: ResetFocus::Email,
            reset_message: None,
            reset_request: InFlight::default(),

            stats: None,
            picture_url: None,
            profile_loading: false,

            users: Vec::new(),
            users_selection: 0,

            projects: Vec::new(),
            scripts_selection: 0,
            transactions: Vec::new(),
            payments_selection: 0,

            registration_fees: Vec::new(),
            budget_limits: Vec::new(),
            limits_kind: FeeLimitKind::Registration,
            limits_selection: 0,
            limit_form: FeeLimitForm::default(),
            limit_form_kind: FeeLimitKind::Registration,
            limit_focus: LimitFocus::Role,
            limit_error: None,

            profile_form: ProfileUpdate::default(),
            profile_focus: ProfileField::FullName,
            picture_path: String::new(),

            pending_delete: None,

            rx,
            tx,
        }
    }

    /// Read the stored session, then show the requested start path.
    pub fn bootstrap(&mut self, start_path: &str) {
        let state = self.ctx.bootstrap();
        debug!(?state, start_path, "Bootstrapped");
        self.navigate(start_path);
    }

    pub fn session(&self) -> Option<&Session> {
        self.ctx.session()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.ctx.cached_profile()
    }

    /// Name to greet the admin by. The fetched profile wins over the name
    /// stored at login, since it reflects profile edits.
    pub fn display_name(&self) -> &str {
        match self.profile() {
            Some(profile) if !profile.full_name.trim().is_empty() => &profile.full_name,
            _ => self.session().map(|s| s.display_name()).unwrap_or("Admin"),
        }
    }

    pub fn set_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
    }

    fn notify_error(&mut self, what: &str, e: &ApiError) {
        if e.is_auth_failure() {
            info!(error = %e, "{} refused", what);
        } else {
            warn!(error = %e, "{} failed", what);
        }
        let mut text = format!("{}: {}", what, e.user_message());
        if e.is_network() {
            text.push_str(" Press r to retry.");
        }
        self.set_notice(NoticeKind::Error, text);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to a path, as typed at the `:` prompt.
    pub fn navigate(&mut self, path: &str) {
        let navigation = self.ctx.navigate(path);
        self.apply_navigation(navigation);
    }

    pub fn go_to(&mut self, route: Route) {
        let navigation = self.ctx.resolve(route);
        self.apply_navigation(navigation);
    }

    fn apply_navigation(&mut self, navigation: Navigation) {
        self.navigation = navigation;
        if let Navigation::Redirect { from, to } = navigation {
            debug!(from = from.path(), to = to.path(), "Redirecting");
        }
        if let Some(route) = navigation.destination() {
            self.mount(route);
        }
    }

    /// Unmount whatever is showing and mount `route`. Responses still in
    /// flight for the old view are dropped when they arrive.
    fn mount(&mut self, route: Route) {
        self.epoch.advance();
        self.route = route;
        self.state = AppState::Normal;
        self.view_loading = false;
        self.pending_delete = None;
        info!(route = route.path(), "Showing view");

        match route {
            Route::Login => self.start_login(),
            Route::Dashboard => self.load_dashboard(),
            Route::Users => self.load_users(),
            Route::Scripts => self.load_projects(),
            Route::Payments => self.load_transactions(),
            Route::RegistrationLimits => self.load_fee_limits(),
            Route::Profile => self.load_profile_view(),
            Route::Root | Route::NotFound => {}
        }
    }

    /// Remount the current view, fetching its data again.
    pub fn refresh(&mut self) {
        self.notice = None;
        self.go_to(self.route);
    }

    pub fn open_path_prompt(&mut self) {
        self.path_input.clear();
        self.state = AppState::EnteringPath;
    }

    pub fn submit_path_prompt(&mut self) {
        let path = std::mem::take(&mut self.path_input);
        self.state = AppState::Normal;
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self.navigate(&path);
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Reset the login screen for a fresh attempt.
    pub fn start_login(&mut self) {
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    pub fn login_pending(&self) -> bool {
        self.ctx.login_pending()
    }

    /// Validate the login form and send it. Nothing is sent while a previous
    /// attempt is outstanding or when a field is empty.
    pub fn submit_login(&mut self) {
        let form = LoginForm::new(self.login_email.clone(), self.login_password.clone());
        if let Err(e) = self.ctx.begin_login(&form) {
            self.login_error = Some(e.user_message());
            return;
        }

        self.login_error = None;
        let api = self.ctx.backend().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.login(form.email.trim(), &form.password).await;
            Self::send(&tx, Message::Login(result)).await;
        });
    }

    fn finish_login(&mut self, result: Result<Session, ApiError>) {
        let outcome = match result {
            Ok(session) => self.ctx.complete_login(session),
            Err(e) => {
                self.ctx.fail_login();
                error!(error = %e, "Login failed");
                Err(e.into())
            }
        };

        match outcome {
            Ok(route) => {
                self.login_password.clear();
                self.config.last_email = Some(self.login_email.trim().to_string());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.go_to(route);
            }
            Err(e) => {
                self.login_error = Some(e.user_message());
            }
        }
    }

    pub fn logout(&mut self) {
        let route = self.ctx.logout();
        self.clear_view_data();
        self.notice = None;
        self.go_to(route);
    }

    fn clear_view_data(&mut self) {
        self.stats = None;
        self.picture_url = None;
        self.profile_loading = false;
        self.users.clear();
        self.projects.clear();
        self.transactions.clear();
        self.registration_fees.clear();
        self.budget_limits.clear();
        self.profile_form = ProfileUpdate::default();
        self.picture_path.clear();
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    pub fn open_reset_dialog(&mut self) {
        self.reset_form.clear();
        self.reset_form.email = self.login_email.trim().to_string();
        self.reset_step = ResetStep::RequestOtp;
        self.reset_focus = ResetFocus::Email;
        self.reset_message = None;
        self.state = AppState::ResettingPassword;
    }

    pub fn close_reset_dialog(&mut self) {
        self.reset_form.clear();
        self.reset_message = None;
        self.state = AppState::Normal;
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_request.is_pending()
    }

    pub fn submit_reset_step(&mut self) {
        match self.reset_step {
            ResetStep::RequestOtp => self.request_otp(),
            ResetStep::EnterOtp => self.submit_new_password(),
        }
    }

    fn request_otp(&mut self) {
        let form = ForgotPasswordForm {
            email: self.reset_form.email.clone(),
        };
        if let Err(e) = form.validate() {
            self.reset_message = Some(Notice {
                kind: NoticeKind::Error,
                text: e.to_string(),
            });
            return;
        }
        if !self.reset_request.try_begin() {
            return;
        }

        let api = self.ctx.backend().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.forgot_password(form.email.trim()).await;
            Self::send(&tx, Message::ForgotPassword(result)).await;
        });
    }

    fn submit_new_password(&mut self) {
        if let Err(e) = self.reset_form.validate() {
            self.reset_message = Some(Notice {
                kind: NoticeKind::Error,
                text: e.to_string(),
            });
            return;
        }
        if !self.reset_request.try_begin() {
            return;
        }

        let form = self.reset_form.clone();
        let api = self.ctx.backend().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api
                .reset_password(form.email.trim(), form.otp.trim(), &form.new_password)
                .await;
            Self::send(&tx, Message::ResetPassword(result)).await;
        });
    }

    // =========================================================================
    // View loading
    // =========================================================================

    /// Helper to send results, logging any channel errors
    async fn send(tx: &mpsc::Sender<Message>, message: Message) {
        if let Err(e) = tx.send(message).await {
            error!(error = %e, "Failed to send result - channel closed");
        }
    }

    /// Run a request for the current view in the background. The result is
    /// tagged with the view's epoch.
    fn spawn_view<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = ViewResult> + Send + 'static,
    {
        self.spawn_tagged(request, Message::View);
    }

    /// Run a user-requested change in the background.
    fn spawn_change<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = ChangeResult> + Send + 'static,
    {
        self.spawn_tagged(request, Message::Change);
    }

    fn spawn_tagged<T, F, Fut>(&mut self, request: F, wrap: fn(Tagged<T>) -> Message)
    where
        T: Send + 'static,
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let epoch = self.epoch.current();
        let tx = self.tx.clone();
        let fut = request(self.ctx.api());
        tokio::spawn(async move {
            let value = fut.await;
            Self::send(&tx, wrap(Tagged { epoch, value })).await;
        });
    }

    fn load_dashboard(&mut self) {
        self.view_loading = true;
        self.spawn_view(|api| async move { ViewResult::Dashboard(api.fetch_dashboard().await) });
        self.load_picture();
        self.ensure_profile();
    }

    fn load_picture(&mut self) {
        let Some(user_id) = self.session().map(|s| s.user_id) else {
            return;
        };
        self.spawn_view(move |api| async move {
            ViewResult::ProfilePicture(api.fetch_profile_picture(user_id).await)
        });
    }

    /// Fetch the signed-in user's profile unless it is already memoized.
    pub fn ensure_profile(&mut self) {
        if self.profile_loading || self.ctx.cached_profile().is_some() {
            return;
        }
        let Some(user_id) = self.session().map(|s| s.user_id) else {
            return;
        };

        self.profile_loading = true;
        let generation = self.ctx.generation();
        let api = self.ctx.api();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_user_profile(user_id).await;
            Self::send(&tx, Message::Profile(generation, result)).await;
        });
    }

    fn load_users(&mut self) {
        self.view_loading = true;
        self.spawn_view(|api| async move { ViewResult::Users(api.fetch_users().await) });
    }

    fn load_projects(&mut self) {
        self.view_loading = true;
        self.spawn_view(|api| async move { ViewResult::Projects(api.fetch_projects().await) });
    }

    fn load_transactions(&mut self) {
        self.view_loading = true;
        self.spawn_view(|api| async move {
            ViewResult::Transactions(api.fetch_transactions().await)
        });
    }

    fn load_fee_limits(&mut self) {
        self.view_loading = true;
        for kind in [FeeLimitKind::Registration, FeeLimitKind::ProjectBudget] {
            self.spawn_view(move |api| async move {
                ViewResult::FeeLimits(kind, api.fetch_fee_limits(kind).await)
            });
        }
    }

    fn load_profile_view(&mut self) {
        self.ensure_profile();
        self.load_picture();
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.users_selection)
    }

    pub fn confirm_delete_user(&mut self) {
        let Some((id, name)) = self
            .selected_user()
            .map(|u| (u.id.clone(), u.full_name.clone()))
        else {
            return;
        };
        let Some(id) = id else {
            self.set_notice(NoticeKind::Error, "This user has no id and cannot be deleted");
            return;
        };
        self.pending_delete = Some(DeleteTarget::User { id, name });
        self.state = AppState::ConfirmingDelete;
    }

    /// Carry out the delete awaiting confirmation.
    pub fn delete_confirmed(&mut self) {
        self.state = AppState::Normal;
        let Some(target) = self.pending_delete.take() else {
            return;
        };

        match target {
            DeleteTarget::User { id, .. } => {
                self.spawn_change(move |api| async move {
                    let result = api.delete_user(&id).await;
                    ChangeResult::UserDeleted(id, result)
                });
            }
            DeleteTarget::FeeLimit { kind, id, .. } => {
                self.spawn_change(move |api| async move {
                    let result = api.delete_fee_limit(kind, &id).await;
                    ChangeResult::FeeLimitDeleted(kind, id, result)
                });
            }
        }
    }

    // =========================================================================
    // Registration limits
    // =========================================================================

    pub fn limits(&self, kind: FeeLimitKind) -> &[FeeLimit] {
        match kind {
            FeeLimitKind::Registration => &self.registration_fees,
            FeeLimitKind::ProjectBudget => &self.budget_limits,
        }
    }

    fn limits_mut(&mut self, kind: FeeLimitKind) -> &mut Vec<FeeLimit> {
        match kind {
            FeeLimitKind::Registration => &mut self.registration_fees,
            FeeLimitKind::ProjectBudget => &mut self.budget_limits,
        }
    }

    pub fn selected_limit(&self) -> Option<&FeeLimit> {
        self.limits(self.limits_kind).get(self.limits_selection)
    }

    pub fn switch_limits_table(&mut self) {
        self.limits_kind = self.limits_kind.other();
        self.limits_selection = 0;
    }

    /// Open the add form for the focused table.
    pub fn start_add_limit(&mut self) {
        self.limit_form.clear();
        self.limit_form_kind = self.limits_kind;
        self.limit_focus = LimitFocus::Role;
        self.limit_error = None;
        self.state = AppState::EditingLimit;
    }

    /// Open the edit form on the selected registration fee.
    pub fn start_edit_limit(&mut self) {
        if self.limits_kind != FeeLimitKind::Registration {
            self.set_notice(NoticeKind::Info, "Project budget limits can only be added");
            return;
        }
        let Some(limit) = self.selected_limit() else {
            return;
        };
        self.limit_form = FeeLimitForm::editing(limit);
        self.limit_form_kind = FeeLimitKind::Registration;
        self.limit_focus = LimitFocus::Amount;
        self.limit_error = None;
        self.state = AppState::EditingLimit;
    }

    pub fn cancel_limit_form(&mut self) {
        self.limit_form.clear();
        self.limit_error = None;
        self.state = AppState::Normal;
    }

    pub fn submit_limit_form(&mut self) {
        let kind = self.limit_form_kind;
        let unique_roles = kind == FeeLimitKind::Registration;
        let request = match self.limit_form.validate(self.limits(kind), unique_roles) {
            Ok(request) => request,
            Err(e) => {
                self.limit_error = Some(e.to_string());
                return;
            }
        };

        self.limit_error = None;
        self.state = AppState::Normal;
        let replaces = self.limit_form.editing_id.clone();
        self.spawn_change(move |api| async move {
            let result = api.save_fee_limit(kind, &request).await;
            ChangeResult::FeeLimitSaved {
                kind,
                replaces,
                result,
            }
        });
        self.set_notice(NoticeKind::Info, format!("Saving {}...", kind.title()));
    }

    pub fn confirm_delete_limit(&mut self) {
        let kind = self.limits_kind;
        let Some(limit) = self.selected_limit() else {
            return;
        };
        self.pending_delete = Some(DeleteTarget::FeeLimit {
            kind,
            id: limit.id.clone(),
            role: limit.role.clone(),
        });
        self.state = AppState::ConfirmingDelete;
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub fn start_edit_profile(&mut self) {
        let Some(profile) = self.profile() else {
            self.set_notice(NoticeKind::Info, "Profile is still loading");
            return;
        };
        self.profile_form = profile.to_update();
        self.profile_focus = ProfileField::FullName;
        self.state = AppState::EditingProfile;
    }

    /// Drop unsaved edits, restoring the last loaded profile.
    pub fn cancel_edit_profile(&mut self) {
        self.profile_form = self
            .profile()
            .map(UserProfile::to_update)
            .unwrap_or_default();
        self.state = AppState::Normal;
    }

    pub fn save_profile(&mut self) {
        let Some(user_id) = self.session().map(|s| s.user_id) else {
            return;
        };
        self.state = AppState::Normal;

        let update = self.profile_form.clone();
        let generation = self.ctx.generation();
        let api = self.ctx.api();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.update_user(user_id, &update).await;
            Self::send(&tx, Message::ProfileSaved(generation, update, result)).await;
        });
        self.set_notice(NoticeKind::Info, "Saving profile...");
    }

    pub fn start_picture_upload(&mut self) {
        self.picture_path.clear();
        self.state = AppState::EnteringPicturePath;
    }

    pub fn submit_picture_upload(&mut self) {
        self.state = AppState::Normal;
        let Some(user_id) = self.session().map(|s| s.user_id) else {
            return;
        };
        let path = PathBuf::from(self.picture_path.trim());
        if path.as_os_str().is_empty() {
            self.set_notice(NoticeKind::Error, "Select a file to upload");
            return;
        }

        self.spawn_change(move |api| async move {
            ChangeResult::PictureUploaded(api.upload_profile_picture(user_id, &path).await)
        });
        self.set_notice(NoticeKind::Info, "Uploading picture...");
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selection index and row count for the list on the current view.
    fn selection_mut(&mut self) -> Option<(&mut usize, usize)> {
        match self.route {
            Route::Users => Some((&mut self.users_selection, self.users.len())),
            Route::Scripts => Some((&mut self.scripts_selection, self.projects.len())),
            Route::Payments => Some((&mut self.payments_selection, self.transactions.len())),
            Route::RegistrationLimits => {
                let len = self.limits(self.limits_kind).len();
                Some((&mut self.limits_selection, len))
            }
            _ => None,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if let Some((selection, len)) = self.selection_mut() {
            if len == 0 {
                *selection = 0;
                return;
            }
            let next = (*selection as isize + delta).clamp(0, len as isize - 1);
            *selection = next as usize;
        }
    }

    pub fn select_first(&mut self) {
        if let Some((selection, _)) = self.selection_mut() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        if let Some((selection, len)) = self.selection_mut() {
            *selection = len.saturating_sub(1);
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        for message in messages {
            self.process_message(message);
        }
    }

    pub fn process_message(&mut self, message: Message) {
        match message {
            Message::Login(result) => self.finish_login(result),
            Message::ForgotPassword(result) => {
                self.reset_request.finish();
                match result {
                    Ok(message) => {
                        self.reset_step = ResetStep::EnterOtp;
                        self.reset_focus = ResetFocus::Otp;
                        self.reset_message = Some(Notice {
                            kind: NoticeKind::Success,
                            text: message,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Forgot password request failed");
                        self.reset_message = Some(Notice {
                            kind: NoticeKind::Error,
                            text: e.user_message(),
                        });
                    }
                }
            }
            Message::ResetPassword(result) => {
                self.reset_request.finish();
                match result {
                    Ok(message) => {
                        self.close_reset_dialog();
                        self.login_password.clear();
                        self.login_focus = LoginFocus::Password;
                        self.set_notice(NoticeKind::Success, message);
                    }
                    Err(e) => {
                        warn!(error = %e, "Password reset failed");
                        self.reset_message = Some(Notice {
                            kind: NoticeKind::Error,
                            text: e.user_message(),
                        });
                    }
                }
            }
            Message::Profile(generation, result) => {
                if generation != self.ctx.generation() {
                    debug!(generation, "Dropping profile from old session");
                    return;
                }
                self.profile_loading = false;
                match result {
                    Ok(profile) => {
                        self.ctx.remember_profile(generation, profile);
                    }
                    Err(e) => self.notify_error("Loading profile", &e),
                }
            }
            Message::ProfileSaved(generation, update, result) => {
                if generation != self.ctx.generation() {
                    return;
                }
                match result {
                    Ok(()) => {
                        self.ctx.invalidate_profile();
                        self.profile_form = update;
                        self.set_notice(NoticeKind::Success, "Profile updated successfully");
                        self.ensure_profile();
                    }
                    Err(e) => self.notify_error("Saving profile", &e),
                }
            }
            Message::View(tagged) => {
                if !self.epoch.is_current(tagged.epoch) {
                    debug!(epoch = tagged.epoch, current = self.epoch.current(), "Dropping stale result");
                    return;
                }
                self.process_view_result(tagged.value);
            }
            Message::Change(tagged) => {
                let current = self.epoch.is_current(tagged.epoch);
                self.process_change_result(tagged.value, current);
            }
        }
    }

    fn process_view_result(&mut self, result: ViewResult) {
        match result {
            ViewResult::Dashboard(result) => {
                self.view_loading = false;
                match result {
                    Ok(stats) => self.stats = Some(stats),
                    Err(e) => self.notify_error("Loading dashboard", &e),
                }
            }
            ViewResult::ProfilePicture(result) => match result {
                Ok(url) => self.picture_url = url,
                Err(e) => debug!(error = %e, "Profile picture unavailable"),
            },
            ViewResult::Users(result) => {
                self.view_loading = false;
                match result {
                    Ok(users) => {
                        self.users = users;
                        self.users_selection = 0;
                    }
                    Err(e) => self.notify_error("Loading users", &e),
                }
            }
            ViewResult::Projects(result) => {
                self.view_loading = false;
                match result {
                    Ok(projects) => {
                        self.projects = projects;
                        self.scripts_selection = 0;
                    }
                    Err(e) => self.notify_error("Loading scripts", &e),
                }
            }
            ViewResult::Transactions(result) => {
                self.view_loading = false;
                match result {
                    Ok(transactions) => {
                        self.transactions = transactions;
                        self.payments_selection = 0;
                    }
                    Err(e) => self.notify_error("Loading transactions", &e),
                }
            }
            ViewResult::FeeLimits(kind, result) => {
                self.view_loading = false;
                match result {
                    Ok(limits) => {
                        *self.limits_mut(kind) = limits;
                        if kind == self.limits_kind {
                            self.limits_selection = 0;
                        }
                    }
                    Err(e) => self.notify_error(&format!("Loading {}", kind.title()), &e),
                }
            }
        }
    }

    /// Report a change's outcome. Rows are patched only while the view that
    /// asked for the change is still mounted; otherwise its refetch has them.
    fn process_change_result(&mut self, result: ChangeResult, current: bool) {
        match result {
            ChangeResult::UserDeleted(id, result) => match result {
                Ok(()) => {
                    if current {
                        self.users.retain(|u| u.id.as_deref() != Some(id.as_str()));
                        self.users_selection =
                            self.users_selection.min(self.users.len().saturating_sub(1));
                    }
                    self.set_notice(NoticeKind::Success, "User deleted");
                }
                Err(e) => self.notify_error("Deleting user", &e),
            },
            ChangeResult::FeeLimitSaved {
                kind,
                replaces,
                result,
            } => match result {
                Ok(saved) => {
                    if current {
                        let target = replaces.unwrap_or_else(|| saved.id.clone());
                        let limits = self.limits_mut(kind);
                        match limits.iter().position(|l| l.id == target) {
                            Some(i) => limits[i] = saved,
                            None => limits.push(saved),
                        }
                    }
                    self.limit_form.clear();
                    self.set_notice(NoticeKind::Success, format!("{} saved", kind.title()));
                }
                Err(e) => self.notify_error(&format!("Saving {}", kind.title()), &e),
            },
            ChangeResult::FeeLimitDeleted(kind, id, result) => match result {
                Ok(()) => {
                    if current {
                        self.limits_mut(kind).retain(|l| l.id != id);
                        let len = self.limits(self.limits_kind).len();
                        self.limits_selection = self.limits_selection.min(len.saturating_sub(1));
                    }
                    self.set_notice(NoticeKind::Success, "Limit deleted");
                }
                Err(e) => self.notify_error("Deleting limit", &e),
            },
            ChangeResult::PictureUploaded(result) => match result {
                Ok(message) => {
                    self.picture_path.clear();
                    self.set_notice(NoticeKind::Success, message);
                    if current {
                        self.load_picture();
                    }
                }
                Err(e) => self.notify_error("Uploading picture", &e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scripthive_core::auth::{GuardState, MemoryStorage, SessionStore};

    fn ada() -> Session {
        Session {
            token: "abc123".to_string(),
            user_id: 7,
            full_name: "Ada Admin".to_string(),
            user_name: "ada".to_string(),
        }
    }

    fn app_with(storage: MemoryStorage) -> App {
        // Nothing listens here; background requests fail fast.
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let ctx = AuthContext::new(api, Storage::Memory(storage));
        let config_path = std::env::temp_dir()
            .join(format!("scripthive-app-test-{}", std::process::id()))
            .join("config.json");
        App::new(Config::at(config_path), ctx)
    }

    fn logged_in_app() -> App {
        let storage = MemoryStorage::new();
        SessionStore::new(storage.clone()).save(&ada()).unwrap();
        let mut app = app_with(storage);
        app.bootstrap("/");
        app
    }

    fn user(id: &str) -> User {
        User {
            id: Some(id.to_string()),
            full_name: format!("User {}", id),
            ..Default::default()
        }
    }

    #[test]
    fn test_loading_before_bootstrap() {
        let app = app_with(MemoryStorage::new());
        assert_eq!(app.navigation, Navigation::Loading);
        assert_eq!(app.ctx.state(), GuardState::Unknown);
    }

    #[tokio::test]
    async fn test_unauthenticated_start_shows_login() {
        let mut app = app_with(MemoryStorage::new());
        app.bootstrap("/users");
        assert_eq!(app.route, Route::Login);
        assert_eq!(
            app.navigation,
            Navigation::Redirect {
                from: Route::Users,
                to: Route::Login
            }
        );
    }

    #[tokio::test]
    async fn test_root_redirects_to_dashboard_when_logged_in() {
        let app = logged_in_app();
        assert_eq!(app.route, Route::Dashboard);
        assert!(app.view_loading);
    }

    #[tokio::test]
    async fn test_empty_login_form_shows_validation() {
        let mut app = app_with(MemoryStorage::new());
        app.bootstrap("/login");
        app.login_email = "admin@scripthive.com".to_string();
        app.login_password.clear();

        app.submit_login();
        assert_eq!(app.login_error.as_deref(), Some("Please fill in all fields"));
        assert!(!app.login_pending());
    }

    #[tokio::test]
    async fn test_login_result_navigates_to_dashboard() {
        let mut app = app_with(MemoryStorage::new());
        app.bootstrap("/login");
        app.login_email = "admin@scripthive.com".to_string();
        app.login_password = "secret".to_string();

        app.submit_login();
        assert!(app.login_pending());
        app.process_message(Message::Login(Ok(ada())));

        assert_eq!(app.route, Route::Dashboard);
        assert!(app.login_password.is_empty());
        assert_eq!(app.session().map(|s| s.user_id), Some(7));
        assert!(!app.login_pending());
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_login() {
        let mut app = app_with(MemoryStorage::new());
        app.bootstrap("/login");
        app.login_email = "admin@scripthive.com".to_string();
        app.login_password = "wrong".to_string();

        app.submit_login();
        app.process_message(Message::Login(Err(ApiError::Rejected(
            "Invalid credentials".to_string(),
        ))));

        assert_eq!(app.route, Route::Login);
        assert_eq!(app.login_error.as_deref(), Some("Invalid credentials"));
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn test_stale_view_result_is_dropped() {
        let mut app = logged_in_app();
        app.go_to(Route::Users);
        let users_epoch = app.epoch.current();

        app.go_to(Route::Scripts);
        app.process_message(Message::View(Tagged {
            epoch: users_epoch,
            value: ViewResult::Users(Ok(vec![user("1")])),
        }));
        assert!(app.users.is_empty());

        app.go_to(Route::Users);
        let current = app.epoch.current();
        app.process_message(Message::View(Tagged {
            epoch: current,
            value: ViewResult::Users(Ok(vec![user("1"), user("2")])),
        }));
        assert_eq!(app.users.len(), 2);
        assert!(!app.view_loading);
    }

    #[tokio::test]
    async fn test_user_deleted_removes_row() {
        let mut app = logged_in_app();
        app.go_to(Route::Users);
        app.users = vec![user("1"), user("2")];
        app.users_selection = 1;

        let epoch = app.epoch.current();
        app.process_message(Message::Change(Tagged {
            epoch,
            value: ChangeResult::UserDeleted("2".to_string(), Ok(())),
        }));
        assert_eq!(app.users.len(), 1);
        assert_eq!(app.users_selection, 0);
    }

    #[tokio::test]
    async fn test_change_result_after_remount_still_notifies() {
        let mut app = logged_in_app();
        app.go_to(Route::Users);
        app.users = vec![user("1"), user("2")];
        let epoch = app.epoch.current();

        app.refresh();
        app.users = vec![user("1"), user("2")];
        app.process_message(Message::Change(Tagged {
            epoch,
            value: ChangeResult::UserDeleted(
                "2".to_string(),
                Err(ApiError::ServerError("boom".to_string())),
            ),
        }));
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.text.starts_with("Deleting user"));

        app.go_to(Route::Profile);
        app.picture_path = "/tmp/me.png".to_string();
        app.set_notice(NoticeKind::Info, "Uploading picture...");
        app.go_to(Route::Dashboard);
        app.process_message(Message::Change(Tagged {
            epoch,
            value: ChangeResult::PictureUploaded(Ok("Picture updated".to_string())),
        }));
        assert_eq!(
            app.notice,
            Some(Notice {
                kind: NoticeKind::Success,
                text: "Picture updated".to_string(),
            })
        );
        assert!(app.picture_path.is_empty());

        // Rows belong to the new mount and are left for its own fetch.
        app.go_to(Route::Users);
        app.users = vec![user("1"), user("2")];
        app.process_message(Message::Change(Tagged {
            epoch,
            value: ChangeResult::UserDeleted("2".to_string(), Ok(())),
        }));
        assert_eq!(app.users.len(), 2);
        assert_eq!(app.notice.map(|n| n.text).as_deref(), Some("User deleted"));
    }

    #[tokio::test]
    async fn test_edited_limit_replaces_row_even_if_id_changes() {
        let mut app = logged_in_app();
        app.go_to(Route::RegistrationLimits);
        app.registration_fees = vec![FeeLimit {
            id: "1".to_string(),
            role: "writer".to_string(),
            amount: "500".to_string(),
            created_at: None,
        }];

        let epoch = app.epoch.current();
        app.process_message(Message::Change(Tagged {
            epoch,
            value: ChangeResult::FeeLimitSaved {
                kind: FeeLimitKind::Registration,
                replaces: Some("1".to_string()),
                result: Ok(FeeLimit {
                    id: "2".to_string(),
                    role: "writer".to_string(),
                    amount: "750".to_string(),
                    created_at: None,
                }),
            },
        }));

        assert_eq!(app.registration_fees.len(), 1);
        assert_eq!(app.registration_fees[0].id, "2");
        assert_eq!(app.registration_fees[0].amount, "750");
        assert_eq!(
            app.notice.as_ref().map(|n| n.kind),
            Some(NoticeKind::Success)
        );
    }

    #[tokio::test]
    async fn test_network_error_notice_offers_retry() {
        let mut app = logged_in_app();
        let err = app.ctx.api().fetch_users().await.unwrap_err();
        assert!(err.is_network());
        app.notify_error("Loading users", &err);
        let text = app.notice.clone().map(|n| n.text).unwrap_or_default();
        assert!(text.ends_with("Press r to retry."));

        app.notify_error("Deleting user", &ApiError::AccessDenied("admin only".to_string()));
        let text = app.notice.map(|n| n.text).unwrap_or_default();
        assert_eq!(text, "Deleting user: You do not have access to this resource");
    }

    #[tokio::test]
    async fn test_logout_returns_to_login_and_guards_views() {
        let mut app = logged_in_app();
        app.users = vec![user("1")];

        app.logout();
        assert_eq!(app.route, Route::Login);
        assert!(app.users.is_empty());
        assert!(app.session().is_none());

        app.navigate("/profile");
        assert_eq!(app.route, Route::Login);
    }

    #[tokio::test]
    async fn test_profile_from_previous_session_ignored() {
        let mut app = logged_in_app();
        let generation = app.ctx.generation();
        app.logout();

        app.process_message(Message::Profile(
            generation,
            Ok(UserProfile {
                full_name: "Ada Admin".to_string(),
                ..Default::default()
            }),
        ));
        assert!(app.profile().is_none());
    }

    #[tokio::test]
    async fn test_display_name_follows_saved_profile() {
        let mut app = logged_in_app();
        assert_eq!(app.display_name(), "Ada Admin");

        let generation = app.ctx.generation();
        app.process_message(Message::ProfileSaved(
            generation,
            ProfileUpdate {
                full_name: "Ada Lovelace".to_string(),
                ..Default::default()
            },
            Ok(()),
        ));
        app.process_message(Message::Profile(
            generation,
            Ok(UserProfile {
                full_name: "Ada Lovelace".to_string(),
                ..Default::default()
            }),
        ));
        assert_eq!(app.display_name(), "Ada Lovelace");
        assert_eq!(app.session().map(|s| s.full_name.as_str()), Some("Ada Admin"));
    }

    #[tokio::test]
    async fn test_duplicate_registration_role_rejected() {
        let mut app = logged_in_app();
        app.go_to(Route::RegistrationLimits);
        app.registration_fees = vec![FeeLimit {
            id: "1".to_string(),
            role: "writer".to_string(),
            amount: "500".to_string(),
            created_at: None,
        }];

        app.start_add_limit();
        app.limit_form.cycle_role();
        app.limit_form.amount = "300".to_string();
        app.submit_limit_form();

        assert_eq!(app.state, AppState::EditingLimit);
        assert_eq!(
            app.limit_error.as_deref(),
            Some("A limit for this role already exists.")
        );
    }

    #[tokio::test]
    async fn test_path_prompt_handles_unknown_paths() {
        let mut app = logged_in_app();
        app.open_path_prompt();
        app.path_input = "nowhere".to_string();
        app.submit_path_prompt();
        assert_eq!(app.route, Route::NotFound);
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_move_selection_clamps() {
        let mut app = logged_in_app();
        app.go_to(Route::Users);
        app.users = vec![user("1"), user("2"), user("3")];

        app.move_selection(PAGE_SCROLL_SIZE as isize);
        assert_eq!(app.users_selection, 2);
        app.move_selection(-1);
        assert_eq!(app.users_selection, 1);
        app.select_first();
        assert_eq!(app.users_selection, 0);
        app.select_last();
        assert_eq!(app.users_selection, 2);
    }

    #[test]
    fn test_profile_field_cycle() {
        let mut field = ProfileField::FullName;
        for _ in 0..ProfileField::ALL.len() {
            field = field.next();
        }
        assert_eq!(field, ProfileField::FullName);
        assert_eq!(ProfileField::FullName.prev(), ProfileField::Phone);
    }
}
