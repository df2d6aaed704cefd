//! Where the tab goes after a session transition.

use std::fmt;
use std::sync::Mutex;

use crate::config::{DASHBOARD_PREFIX, LOGIN_SELECTION_PATH};
use crate::models::Role;

/// A view path inside the app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route(String);

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Fixed entry point after logout or expiry.
    pub fn login_selection() -> Self {
        Self::new(LOGIN_SELECTION_PATH)
    }

    /// Role dashboard: `/dashboard/<role>`.
    pub fn dashboard(role: Role) -> Self {
        Self(format!("{DASHBOARD_PREFIX}/{}", role.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Navigation primitive supplied by the host.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Navigator that only records where it was sent.
#[derive(Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: &Route) {
        tracing::debug!(route = %route, "Navigating");
        if let Ok(mut history) = self.history.lock() {
            history.push(route.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_is_prefix_joined_with_role() {
        assert_eq!(Route::dashboard(Role::Pharmacy).as_str(), "/dashboard/pharmacy");
        assert_eq!(Route::dashboard(Role::Radiologist).as_str(), "/dashboard/radiologist");
    }

    #[test]
    fn every_role_has_a_distinct_dashboard() {
        let routes: std::collections::HashSet<Route> =
            Role::ALL.iter().map(|r| Route::dashboard(*r)).collect();
        assert_eq!(routes.len(), Role::ALL.len());
        assert!(routes.iter().all(|r| r.as_str().starts_with(DASHBOARD_PREFIX)));
    }

    #[test]
    fn history_navigator_records_in_order() {
        let nav = HistoryNavigator::new();
        assert!(nav.current().is_none());

        nav.navigate(&Route::dashboard(Role::Doctor));
        nav.navigate(&Route::login_selection());

        assert_eq!(nav.current(), Some(Route::login_selection()));
        assert_eq!(
            nav.history(),
            vec![Route::dashboard(Role::Doctor), Route::login_selection()]
        );
    }
}
