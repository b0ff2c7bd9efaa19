//! Route guard: the single authority deciding which view a navigation
//! request actually lands on.

use tracing::debug;

/// Navigable views and their paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    Users,
    Scripts,
    Payments,
    Profile,
    RegistrationLimits,
    NotFound,
}

impl Route {
    /// Views reachable from the navigation bar, in display order.
    pub const NAVIGABLE: [Route; 6] = [
        Route::Dashboard,
        Route::Users,
        Route::Scripts,
        Route::Payments,
        Route::RegistrationLimits,
        Route::Profile,
    ];

    /// Where an authenticated user lands by default.
    pub const LANDING: Route = Route::Dashboard;

    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        match normalized {
            "" => Route::Root,
            "/login" => Route::Login,
            "/dashboard" => Route::Dashboard,
            "/users" => Route::Users,
            "/scripts" => Route::Scripts,
            "/payments" => Route::Payments,
            "/profile" => Route::Profile,
            "/registration-limits" => Route::RegistrationLimits,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Users => "/users",
            Route::Scripts => "/scripts",
            Route::Payments => "/payments",
            Route::Profile => "/profile",
            Route::RegistrationLimits => "/registration-limits",
            Route::NotFound => "/404",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Root => "Home",
            Route::Login => "Sign In",
            Route::Dashboard => "Dashboard",
            Route::Users => "Manage Users",
            Route::Scripts => "Posted Scripts",
            Route::Payments => "Payments",
            Route::Profile => "Profile",
            Route::RegistrationLimits => "Limit Registrations",
            Route::NotFound => "Not Found",
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Root | Route::Login | Route::NotFound)
    }

    /// Next navigable view (wrapping around).
    pub fn next(&self) -> Self {
        Self::step(*self, 1)
    }

    /// Previous navigable view (wrapping around).
    pub fn prev(&self) -> Self {
        Self::step(*self, Self::NAVIGABLE.len() - 1)
    }

    fn step(from: Route, offset: usize) -> Self {
        let len = Self::NAVIGABLE.len();
        match Self::NAVIGABLE.iter().position(|r| *r == from) {
            Some(i) => Self::NAVIGABLE[(i + offset) % len],
            None => Self::LANDING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Stored session not yet checked.
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    SessionLoaded,
    SessionMissing,
    LoggedIn,
    LoggedOut,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Session check pending; show a neutral loading indicator.
    Loading,
    Render(Route),
    /// Replace the requested route with another (no history entry).
    Redirect { from: Route, to: Route },
}

impl Navigation {
    /// The route that should end up on screen, if any.
    pub fn destination(&self) -> Option<Route> {
        match self {
            Navigation::Loading => None,
            Navigation::Render(route) => Some(*route),
            Navigation::Redirect { to, .. } => Some(*to),
        }
    }
}

#[derive(Debug)]
pub struct SessionGuard {
    state: GuardState,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGuard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Unknown,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Apply an event. Events that make no sense in the current state are
    /// ignored.
    pub fn apply(&mut self, event: GuardEvent) -> GuardState {
        use GuardEvent::*;
        use GuardState::*;

        let next = match (self.state, event) {
            (Unknown, SessionLoaded) => Authenticated,
            (Unknown, SessionMissing) => Unauthenticated,
            (Authenticated, LoggedOut) => Unauthenticated,
            (Unauthenticated, LoggedIn) => Authenticated,
            (state, event) => {
                debug!(?state, ?event, "Ignoring guard event");
                state
            }
        };

        if next != self.state {
            debug!(from = ?self.state, to = ?next, "Guard transition");
        }
        self.state = next;
        next
    }

    pub fn resolve(&self, requested: Route) -> Navigation {
        match self.state {
            GuardState::Unknown => Navigation::Loading,
            GuardState::Authenticated => match requested {
                Route::Login | Route::Root => Navigation::Redirect {
                    from: requested,
                    to: Route::LANDING,
                },
                route => Navigation::Render(route),
            },
            GuardState::Unauthenticated => {
                if requested.is_protected() || requested == Route::Root {
                    Navigation::Redirect {
                        from: requested,
                        to: Route::Login,
                    }
                } else {
                    Navigation::Render(requested)
                }
            }
        }
    }

    pub fn resolve_path(&self, path: &str) -> Navigation {
        self.resolve(Route::from_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROUTES: [Route; 9] = [
        Route::Root,
        Route::Login,
        Route::Dashboard,
        Route::Users,
        Route::Scripts,
        Route::Payments,
        Route::Profile,
        Route::RegistrationLimits,
        Route::NotFound,
    ];

    fn guard_in(state: GuardState) -> SessionGuard {
        SessionGuard { state }
    }

    #[test]
    fn test_unknown_never_renders() {
        let guard = SessionGuard::new();
        for route in ALL_ROUTES {
            assert_eq!(guard.resolve(route), Navigation::Loading);
        }
    }

    #[test]
    fn test_unauthenticated_redirects_protected_to_login() {
        let guard = guard_in(GuardState::Unauthenticated);
        for route in Route::NAVIGABLE {
            assert_eq!(
                guard.resolve(route),
                Navigation::Redirect {
                    from: route,
                    to: Route::Login
                }
            );
        }
        assert_eq!(guard.resolve(Route::Login), Navigation::Render(Route::Login));
        assert_eq!(
            guard.resolve(Route::NotFound),
            Navigation::Render(Route::NotFound)
        );
        assert_eq!(guard.resolve(Route::Root).destination(), Some(Route::Login));
    }

    #[test]
    fn test_authenticated_redirects_login_to_dashboard() {
        let guard = guard_in(GuardState::Authenticated);
        assert_eq!(
            guard.resolve(Route::Login),
            Navigation::Redirect {
                from: Route::Login,
                to: Route::Dashboard
            }
        );
        assert_eq!(guard.resolve(Route::Root).destination(), Some(Route::Dashboard));
        for route in Route::NAVIGABLE {
            assert_eq!(guard.resolve(route), Navigation::Render(route));
        }
    }

    #[test]
    fn test_transition_table() {
        let mut guard = SessionGuard::new();
        assert_eq!(guard.apply(GuardEvent::SessionLoaded), GuardState::Authenticated);
        assert_eq!(guard.apply(GuardEvent::LoggedOut), GuardState::Unauthenticated);
        assert_eq!(guard.apply(GuardEvent::LoggedIn), GuardState::Authenticated);

        let mut guard = SessionGuard::new();
        assert_eq!(guard.apply(GuardEvent::SessionMissing), GuardState::Unauthenticated);
    }

    #[test]
    fn test_out_of_order_events_ignored() {
        let mut guard = SessionGuard::new();
        assert_eq!(guard.apply(GuardEvent::LoggedOut), GuardState::Unknown);

        let mut guard = guard_in(GuardState::Authenticated);
        assert_eq!(guard.apply(GuardEvent::SessionMissing), GuardState::Authenticated);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::from_path("/"), Route::Root);
        assert_eq!(Route::from_path(""), Route::Root);
        assert_eq!(Route::from_path("/users/"), Route::Users);
        assert_eq!(Route::from_path("/registration-limits"), Route::RegistrationLimits);
        assert_eq!(Route::from_path("/settings"), Route::NotFound);
        for route in Route::NAVIGABLE {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_route_cycle() {
        assert_eq!(Route::Dashboard.next(), Route::Users);
        assert_eq!(Route::Profile.next(), Route::Dashboard);
        assert_eq!(Route::Dashboard.prev(), Route::Profile);
        assert_eq!(Route::Login.next(), Route::Dashboard);
    }

    #[test]
    fn test_resolve_path() {
        let guard = guard_in(GuardState::Unauthenticated);
        assert_eq!(
            guard.resolve_path("/payments").destination(),
            Some(Route::Login)
        );
    }
}
