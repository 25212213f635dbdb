//! Client-side navigation guard.
//!
//! Every navigation attempt is intercepted before it completes: the guard resolves the
//! current authentication state and decides whether to allow the navigation, redirect to
//! the login page, or redirect to the dashboard.
//!
//! The decision itself is a pure function ([`decide`]) over the target route's metadata
//! and the resolved auth state. [`Navigator`] wraps it with the asynchronous parts:
//! querying an [`AuthStateProvider`], cancelling a pending check when a newer navigation
//! supersedes it, and applying a timeout so a stalled provider can never hang navigation.
//!
//! On timeout or provider failure the guard fails closed: it treats the user as
//! unauthenticated, so protected routes redirect to login and public routes still render.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Where the login redirect lands.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated users are sent away from guest-only pages.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Static metadata for a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub path: &'static str,
    /// Route is only rendered with a valid session
    pub requires_auth: bool,
    /// Route is for anonymous users; authenticated visitors are sent to the dashboard
    pub guest_only: bool,
}

/// The route table. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteMeta>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: vec![
                RouteMeta {
                    path: "/",
                    requires_auth: false,
                    guest_only: false,
                },
                RouteMeta {
                    path: "/home",
                    requires_auth: false,
                    guest_only: false,
                },
                RouteMeta {
                    path: LOGIN_PATH,
                    requires_auth: false,
                    guest_only: true,
                },
                RouteMeta {
                    path: "/register",
                    requires_auth: false,
                    guest_only: true,
                },
                RouteMeta {
                    path: "/forgot-password",
                    requires_auth: false,
                    guest_only: false,
                },
                RouteMeta {
                    path: DASHBOARD_PATH,
                    requires_auth: true,
                    guest_only: false,
                },
            ],
        }
    }
}

impl RouteTable {
    /// Look up a route by exact path. Unknown paths have no metadata; the navigator
    /// treats them as a wildcard redirect to the login page.
    pub fn resolve(&self, path: &str) -> Option<&RouteMeta> {
        self.routes.iter().find(|r| r.path == path)
    }
}

/// The three possible guard decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    RedirectToLogin,
    RedirectToDashboard,
}

/// Decide a navigation given the target route and the resolved auth state.
///
/// | requires_auth | authenticated | guest_only | outcome |
/// |---|---|---|---|
/// | true  | false | -     | redirect to login |
/// | true  | true  | -     | allow |
/// | false | true  | true  | redirect to dashboard |
/// | false | true  | false | allow |
/// | false | false | -     | allow |
pub fn decide(route: &RouteMeta, authenticated: bool) -> GuardOutcome {
    if route.requires_auth && !authenticated {
        GuardOutcome::RedirectToLogin
    } else if !route.requires_auth && route.guest_only && authenticated {
        GuardOutcome::RedirectToDashboard
    } else {
        GuardOutcome::Allow
    }
}

/// Source of the current authentication state.
///
/// The guard never inspects tokens itself; it asks the provider, which typically holds
/// the session token and checks it against the backend.
#[async_trait]
pub trait AuthStateProvider: Send + Sync {
    async fn is_authenticated(&self) -> anyhow::Result<bool>;
}

/// [`AuthStateProvider`] backed by the HTTP API.
///
/// Holds the bearer token and resolves auth state with a profile request. A 401 response
/// clears the held token, forcing the Anonymous state for subsequent checks.
pub struct ApiAuthProvider {
    client: reqwest::Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl ApiAuthProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: Mutex::new(None),
        }
    }

    /// Store the token issued at login.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().await = Some(token.into());
    }

    /// Drop the held token, e.g. after logout.
    pub async fn clear_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl AuthStateProvider for ApiAuthProvider {
    #[instrument(skip(self))]
    async fn is_authenticated(&self) -> anyhow::Result<bool> {
        let token = match self.token.lock().await.clone() {
            Some(token) => token,
            None => return Ok(false),
        };

        let response = self
            .client
            .get(format!("{}/auth/profile", self.base_url))
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("Session rejected by backend, dropping token");
            self.clear_token().await;
            return Ok(false);
        }

        Ok(response.status().is_success())
    }
}

/// Drives guard evaluations for successive navigation events.
///
/// Each call to [`navigate`](Self::navigate) cancels the previous pending check, so a
/// rapid second navigation can never be overtaken by a stale decision.
pub struct Navigator {
    routes: RouteTable,
    provider: Arc<dyn AuthStateProvider>,
    timeout: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Navigator {
    pub fn new(routes: RouteTable, provider: Arc<dyn AuthStateProvider>, timeout: Duration) -> Self {
        Self {
            routes,
            provider,
            timeout,
            pending: Mutex::new(None),
        }
    }

    /// Evaluate a navigation to `path`.
    ///
    /// Returns `None` if this evaluation was superseded by a newer navigation before it
    /// resolved; a superseded decision must not be applied.
    #[instrument(skip(self))]
    pub async fn navigate(&self, path: &str) -> Option<GuardOutcome> {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        // Wildcard fallback: unknown paths go to the login page
        let Some(route) = self.routes.resolve(path) else {
            debug!("Unknown path {path}, falling back to login");
            return Some(GuardOutcome::RedirectToLogin);
        };

        // Routes with no auth-dependent behavior don't wait on the provider at all
        if !route.requires_auth && !route.guest_only {
            return Some(GuardOutcome::Allow);
        }

        let authenticated = tokio::select! {
            _ = token.cancelled() => {
                debug!("Navigation to {path} superseded");
                return None;
            }
            _ = tokio::time::sleep(self.timeout) => {
                warn!("Auth state check timed out after {:?}, treating as unauthenticated", self.timeout);
                false
            }
            result = self.provider.is_authenticated() => match result {
                Ok(authenticated) => authenticated,
                Err(e) => {
                    warn!("Auth state check failed: {e:#}, treating as unauthenticated");
                    false
                }
            }
        };

        Some(decide(route, authenticated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider(bool);

    #[async_trait]
    impl AuthStateProvider for StaticProvider {
        async fn is_authenticated(&self) -> anyhow::Result<bool> {
            Ok(self.0)
        }
    }

    struct StalledProvider;

    #[async_trait]
    impl AuthStateProvider for StalledProvider {
        async fn is_authenticated(&self) -> anyhow::Result<bool> {
            std::future::pending().await
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl AuthStateProvider for FailingProvider {
        async fn is_authenticated(&self) -> anyhow::Result<bool> {
            anyhow::bail!("network unreachable")
        }
    }

    /// Resolves slowly, counting how many checks actually completed.
    struct SlowProvider {
        delay: Duration,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl AuthStateProvider for SlowProvider {
        async fn is_authenticated(&self) -> anyhow::Result<bool> {
            tokio::time::sleep(self.delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn navigator(provider: Arc<dyn AuthStateProvider>) -> Navigator {
        Navigator::new(RouteTable::default(), provider, Duration::from_secs(5))
    }

    #[test]
    fn test_decision_table() {
        let protected = RouteMeta {
            path: "/dashboard",
            requires_auth: true,
            guest_only: false,
        };
        let guest_only = RouteMeta {
            path: "/login",
            requires_auth: false,
            guest_only: true,
        };
        let public = RouteMeta {
            path: "/home",
            requires_auth: false,
            guest_only: false,
        };

        assert_eq!(decide(&protected, false), GuardOutcome::RedirectToLogin);
        assert_eq!(decide(&protected, true), GuardOutcome::Allow);
        assert_eq!(decide(&guest_only, true), GuardOutcome::RedirectToDashboard);
        assert_eq!(decide(&guest_only, false), GuardOutcome::Allow);
        assert_eq!(decide(&public, true), GuardOutcome::Allow);
        assert_eq!(decide(&public, false), GuardOutcome::Allow);
    }

    #[test]
    fn test_every_protected_route_redirects_anonymous_visitors() {
        let table = RouteTable::default();
        for route in table.routes.iter().filter(|r| r.requires_auth) {
            assert_eq!(decide(route, false), GuardOutcome::RedirectToLogin, "route {}", route.path);
        }
    }

    #[tokio::test]
    async fn test_dashboard_without_session_redirects_to_login() {
        let nav = navigator(Arc::new(StaticProvider(false)));
        assert_eq!(nav.navigate("/dashboard").await, Some(GuardOutcome::RedirectToLogin));
    }

    #[tokio::test]
    async fn test_login_with_session_redirects_to_dashboard() {
        let nav = navigator(Arc::new(StaticProvider(true)));
        assert_eq!(nav.navigate("/login").await, Some(GuardOutcome::RedirectToDashboard));
        assert_eq!(nav.navigate("/register").await, Some(GuardOutcome::RedirectToDashboard));
    }

    #[tokio::test]
    async fn test_public_routes_always_allow() {
        for authenticated in [false, true] {
            let nav = navigator(Arc::new(StaticProvider(authenticated)));
            for path in ["/", "/home", "/forgot-password"] {
                assert_eq!(nav.navigate(path).await, Some(GuardOutcome::Allow), "path {path}");
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_login() {
        let nav = navigator(Arc::new(StaticProvider(true)));
        assert_eq!(nav.navigate("/no-such-page").await, Some(GuardOutcome::RedirectToLogin));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_provider_times_out_closed() {
        let nav = Navigator::new(RouteTable::default(), Arc::new(StalledProvider), Duration::from_secs(5));

        // Protected route fails closed to the login page
        assert_eq!(nav.navigate("/dashboard").await, Some(GuardOutcome::RedirectToLogin));
        // Guest-only route is treated as anonymous and still renders
        assert_eq!(nav.navigate("/login").await, Some(GuardOutcome::Allow));
    }

    #[tokio::test]
    async fn test_provider_failure_treated_as_unauthenticated() {
        let nav = navigator(Arc::new(FailingProvider));
        assert_eq!(nav.navigate("/dashboard").await, Some(GuardOutcome::RedirectToLogin));
        assert_eq!(nav.navigate("/login").await, Some(GuardOutcome::Allow));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseding_navigation_cancels_pending_check() {
        let provider = Arc::new(SlowProvider {
            delay: Duration::from_secs(1),
            completed: AtomicUsize::new(0),
        });
        let nav = Arc::new(Navigator::new(RouteTable::default(), provider.clone(), Duration::from_secs(5)));

        let first = tokio::spawn({
            let nav = nav.clone();
            async move { nav.navigate("/dashboard").await }
        });
        // Let the first navigation reach its provider check
        tokio::task::yield_now().await;

        let second = nav.navigate("/login").await;
        assert_eq!(second, Some(GuardOutcome::RedirectToDashboard));

        // The first evaluation was superseded; its decision must not surface
        assert_eq!(first.await.unwrap(), None);
        assert_eq!(provider.completed.load(Ordering::SeqCst), 1);
    }
}
