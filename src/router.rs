use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Upload,
    Jobs,
    Analyze,
    History,
}

impl Route {
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Register => "Create Account",
            Route::Dashboard => "Dashboard",
            Route::Upload => "Upload CV",
            Route::Jobs => "Job Descriptions",
            Route::Analyze => "Analyze",
            Route::History => "History",
        }
    }

    /// Entries of the navigation sidebar, in display order.
    pub const NAV: [Route; 5] = [
        Route::Dashboard,
        Route::Upload,
        Route::Jobs,
        Route::Analyze,
        Route::History,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Hydrating,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    pub fn of(store: &SessionStore) -> Self {
        if store.is_loading() {
            AuthState::Hydrating
        } else if store.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Session not known yet; show a neutral placeholder and decide later.
    Loading,
    Redirect { to: Route, from: Option<Route> },
    Render { route: Route, layout: bool },
}

pub fn guard(route: Route, auth: AuthState) -> Guard {
    match (auth, route.is_public()) {
        (AuthState::Hydrating, _) => Guard::Loading,
        (AuthState::Authenticated, true) => Guard::Redirect {
            to: Route::Dashboard,
            from: None,
        },
        (AuthState::Authenticated, false) => Guard::Render { route, layout: true },
        (AuthState::Unauthenticated, true) => Guard::Render { route, layout: false },
        (AuthState::Unauthenticated, false) => Guard::Redirect {
            to: Route::Login,
            from: Some(route),
        },
    }
}

/// Tracks the current screen and the route a redirect to login interrupted.
#[derive(Debug)]
pub struct Router {
    current: Route,
    return_to: Option<Route>,
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            return_to: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn return_to(&self) -> Option<Route> {
        self.return_to
    }

    /// Resolves `target` through the guard and returns the screen to show, or
    /// `None` while the session is still hydrating.
    pub fn navigate(&mut self, target: Route, auth: AuthState) -> Option<Route> {
        match guard(target, auth) {
            Guard::Loading => None,
            Guard::Render { route, .. } => {
                self.current = route;
                Some(route)
            }
            Guard::Redirect { to, from } => {
                if from.is_some() {
                    self.return_to = from;
                }
                self.current = to;
                Some(to)
            }
        }
    }

    /// Where to go once the user has logged in.
    pub fn after_login(&mut self) -> Route {
        let target = self.return_to.take().unwrap_or(Route::Dashboard);
        self.current = target;
        target
    }

    pub fn after_logout(&mut self) -> Route {
        self.return_to = None;
        self.current = Route::Login;
        Route::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_defers_while_hydrating() {
        assert_eq!(guard(Route::History, AuthState::Hydrating), Guard::Loading);
        assert_eq!(guard(Route::Login, AuthState::Hydrating), Guard::Loading);
    }

    #[test]
    fn test_protected_route_redirects_to_login_and_remembers_target() {
        assert_eq!(
            guard(Route::History, AuthState::Unauthenticated),
            Guard::Redirect {
                to: Route::Login,
                from: Some(Route::History)
            }
        );

        let mut router = Router::new(Route::Login);
        assert_eq!(router.navigate(Route::History, AuthState::Unauthenticated), Some(Route::Login));
        assert_eq!(router.return_to(), Some(Route::History));
        assert_eq!(router.after_login(), Route::History);
        assert_eq!(router.current(), Route::History);
        assert_eq!(router.return_to(), None);
    }

    #[test]
    fn test_after_login_defaults_to_dashboard() {
        let mut router = Router::new(Route::Login);
        assert_eq!(router.after_login(), Route::Dashboard);
    }

    #[test]
    fn test_public_routes_redirect_authenticated_users() {
        assert_eq!(
            guard(Route::Login, AuthState::Authenticated),
            Guard::Redirect {
                to: Route::Dashboard,
                from: None
            }
        );
        assert_eq!(
            guard(Route::Register, AuthState::Unauthenticated),
            Guard::Render {
                route: Route::Register,
                layout: false
            }
        );
    }

    #[test]
    fn test_authenticated_routes_render_with_layout() {
        assert_eq!(
            guard(Route::Analyze, AuthState::Authenticated),
            Guard::Render {
                route: Route::Analyze,
                layout: true
            }
        );
    }

    #[test]
    fn test_navigate_while_hydrating_keeps_current() {
        let mut router = Router::new(Route::Login);
        assert_eq!(router.navigate(Route::Upload, AuthState::Hydrating), None);
        assert_eq!(router.current(), Route::Login);
    }

    #[test]
    fn test_auth_state_follows_session_store() {
        use crate::models::Session;
        use crate::storage::LocalStorage;

        let mut store = SessionStore::new(LocalStorage::open_in_memory().unwrap());
        assert_eq!(AuthState::of(&store), AuthState::Hydrating);
        store.hydrate().unwrap();
        assert_eq!(AuthState::of(&store), AuthState::Unauthenticated);
        store
            .login(Session {
                id: 1,
                email: "a@b.com".to_string(),
            })
            .unwrap();
        assert_eq!(AuthState::of(&store), AuthState::Authenticated);
    }
}
