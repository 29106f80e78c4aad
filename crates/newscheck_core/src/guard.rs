//! crates/newscheck_core/src/guard.rs
//!
//! Navigation destinations and the guard consulted before entering them.

use std::fmt;
use tracing::info;

use crate::ports::Navigator;
use crate::session::SessionValidator;

/// Every destination of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Check,
    History,
    HistoryDetail(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/auth/login".to_string(),
            Route::Register => "/auth/register".to_string(),
            Route::Check => "/check".to_string(),
            Route::History => "/history".to_string(),
            Route::HistoryDetail(id) => format!("/history/{}", id),
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny,
}

/// Gates protected destinations on a locally valid session. Never touches the network.
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionValidator,
}

impl RouteGuard {
    pub fn new(session: SessionValidator) -> Self {
        Self { session }
    }

    pub fn can_activate(&self, route: &Route, navigator: &dyn Navigator) -> GuardDecision {
        if !route.is_protected() || self.session.is_authenticated() {
            return GuardDecision::Allow;
        }
        info!("Blocked navigation to {}; redirecting to login.", route);
        navigator.navigate(Route::Login);
        GuardDecision::Deny
    }

    /// Where the login entry point should land: authenticated users skip the form.
    pub fn entry_route(&self) -> Route {
        if self.session.is_authenticated() {
            Route::Check
        } else {
            Route::Login
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCredentialStore;
    use crate::ports::CredentialStore;
    use crate::session::tests::token_expiring_in;
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: Route) {
            self.visited.lock().unwrap().push(route);
        }
    }

    fn guard_with(store: Arc<MemoryCredentialStore>) -> RouteGuard {
        RouteGuard::new(SessionValidator::new(store))
    }

    #[test]
    fn route_table_paths() {
        assert_eq!(Route::Login.path(), "/auth/login");
        assert_eq!(Route::Register.path(), "/auth/register");
        assert_eq!(Route::HistoryDetail("r1".into()).path(), "/history/r1");
        assert!(!Route::Register.is_protected());
        assert!(Route::HistoryDetail("r1".into()).is_protected());
    }

    #[test]
    fn allows_protected_route_with_valid_session() {
        let guard = guard_with(Arc::new(MemoryCredentialStore::with_token(
            token_expiring_in(Duration::hours(1)),
        )));
        let nav = RecordingNavigator::default();

        assert_eq!(guard.can_activate(&Route::History, &nav), GuardDecision::Allow);
        assert!(nav.visited.lock().unwrap().is_empty());
        assert_eq!(guard.entry_route(), Route::Check);
    }

    #[test]
    fn denies_and_redirects_with_expired_session() {
        let store = Arc::new(MemoryCredentialStore::with_token(token_expiring_in(-Duration::hours(1))));
        let guard = guard_with(store.clone());
        let nav = RecordingNavigator::default();

        assert_eq!(guard.can_activate(&Route::Check, &nav), GuardDecision::Deny);
        assert_eq!(*nav.visited.lock().unwrap(), vec![Route::Login]);
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn public_routes_are_always_allowed() {
        let guard = guard_with(Arc::new(MemoryCredentialStore::new()));
        let nav = RecordingNavigator::default();

        assert_eq!(guard.can_activate(&Route::Login, &nav), GuardDecision::Allow);
        assert_eq!(guard.can_activate(&Route::Register, &nav), GuardDecision::Allow);
        assert!(nav.visited.lock().unwrap().is_empty());
        assert_eq!(guard.entry_route(), Route::Login);
    }
}
