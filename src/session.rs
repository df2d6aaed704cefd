//! Per-tab session manager.
//!
//! Owns the ordering of every identity transition in a tab so the query
//! cache only ever holds data for the token currently in tab storage:
//!
//! login:  submit → clear cache → store token → seed profile → reconcile → navigate → notify
//! logout: remove token → clear cache → navigate → notify
//!
//! All failures stop here and become notifications; callers get a
//! `SessionError` for control flow only.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::api::{ApiError, HealthApi, LoginResponse};
use crate::capability::verify_provider;
use crate::config::DEFAULT_STALE_SECS;
use crate::messages::{text, Locale, MessageKey};
use crate::models::{AuthToken, Credentials, MedicalRecord, ProviderProfile, ProviderRole, Session, UserProfile};
use crate::navigation::{HistoryNavigator, Navigator, Route};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::query_cache::{MemoryQueryCache, QueryCache, QueryCacheExt, QueryKey};
use crate::tab_storage::{MemoryTabStorage, StorageError, TabStorage, AUTH_TOKEN_KEY};

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Identifier and password are required")]
    InvalidCredentials,
    #[error("A login is already in progress for this tab")]
    LoginInFlight,
    #[error("Session changed while the request was in flight")]
    Superseded,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),
}

// ═══════════════════════════════════════════════════════════
// Provider lookup state
// ═══════════════════════════════════════════════════════════

/// Result of a provider lookup, including the transient loading phase.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderState {
    Loading,
    Found(ProviderProfile),
    Error(String),
}

impl ProviderState {
    pub fn provider(&self) -> Option<&ProviderProfile> {
        match self {
            Self::Found(provider) => Some(provider),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

// ═══════════════════════════════════════════════════════════
// Single-flight guard
// ═══════════════════════════════════════════════════════════

/// Held for the whole login; released on drop, including when the login
/// future is dropped mid-flight.
struct LoginGuard<'a>(&'a AtomicBool);

impl<'a> LoginGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoginGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ═══════════════════════════════════════════════════════════
// SessionManager
// ═══════════════════════════════════════════════════════════

/// Session and cache lifecycle for one tab.
///
/// The `HealthApi` must read its bearer token from the same `TabStorage`
/// this manager writes to.
pub struct SessionManager {
    api: Arc<dyn HealthApi>,
    storage: Arc<dyn TabStorage>,
    cache: Arc<dyn QueryCache>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    locale: Locale,
    stale_after: Duration,
    login_in_flight: AtomicBool,
    /// Bumped on every identity transition (token stored or removed).
    generation: AtomicU64,
}

impl SessionManager {
    pub fn builder(api: Arc<dyn HealthApi>) -> SessionManagerBuilder {
        SessionManagerBuilder::new(api)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    // ── Login / logout ──────────────────────────────────────

    /// Authenticate this tab.
    ///
    /// Cache eviction happens strictly before the token and profile are
    /// written. A failed reconciliation keeps the profile from the login
    /// response.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        if !credentials.is_complete() {
            self.notify_error(MessageKey::InvalidCredentials);
            return Err(SessionError::InvalidCredentials);
        }

        let Some(_guard) = LoginGuard::acquire(&self.login_in_flight) else {
            tracing::warn!(role = %credentials.role, "Login rejected, another login in flight");
            self.notify_error(MessageKey::LoginInProgress);
            return Err(SessionError::LoginInFlight);
        };

        // 1. Submit credentials
        let started = self.generation();
        let LoginResponse { token, user } = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(role = %credentials.role, "Login failed: {e}");
                self.notify(Notification::error(
                    self.failure_message(&e, MessageKey::LoginFailed),
                ));
                return Err(e.into());
            }
        };
        if self.generation() != started {
            return Err(self.superseded("credential exchange"));
        }

        // 2. Drop everything the previous identity cached
        self.cache.clear();

        // 3. Persist token
        if let Err(e) = self.storage.set(AUTH_TOKEN_KEY, token.expose()) {
            tracing::error!("Failed to persist auth token: {e}");
            if let Err(e) = self.storage.remove(AUTH_TOKEN_KEY) {
                tracing::warn!("Failed to remove previous auth token: {e}");
            }
            self.bump_generation();
            self.cache.clear();
            self.notify_error(MessageKey::LoginFailed);
            return Err(e.into());
        }
        let established = self.bump_generation();

        // 4. Seed profile from the login response
        self.write_profile(&user);

        // 5. Reconcile with the canonical profile
        let reconciled = self.api.get_profile().await;
        if self.generation() != established {
            return Err(self.superseded("profile reconciliation"));
        }
        let user = match reconciled {
            Ok(fresh) => {
                self.write_profile(&fresh);
                fresh
            }
            Err(e) => {
                tracing::warn!("Profile reconciliation failed, keeping login profile: {e}");
                user
            }
        };

        // 6. Role destination
        self.navigator.navigate(&Route::dashboard(user.role));

        // 7. Success
        self.notify(Notification::success(text(self.locale, MessageKey::LoginSucceeded)));
        tracing::info!(role = %user.role, "Login succeeded");

        Ok(Session { token, user })
    }

    /// Sign the tab out. Safe to call without a session.
    pub fn logout(&self) {
        self.end_session();
        self.notify(Notification::info(text(self.locale, MessageKey::LoggedOut)));
        tracing::info!("Logged out, query cache cleared");
    }

    /// Same teardown as logout, reported as an expiry.
    fn expire(&self) {
        self.end_session();
        self.notify_error(MessageKey::SessionExpired);
        tracing::info!("Session expired, query cache cleared");
    }

    fn end_session(&self) {
        self.bump_generation();
        if let Err(e) = self.storage.remove(AUTH_TOKEN_KEY) {
            tracing::warn!("Failed to remove auth token: {e}");
        }
        self.cache.clear();
        self.navigator.navigate(&Route::login_selection());
    }

    // ── Session reads ───────────────────────────────────────

    pub fn token(&self) -> Result<Option<AuthToken>, SessionError> {
        Ok(self.storage.get(AUTH_TOKEN_KEY)?.map(AuthToken::new))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// Profile from the cache only; never touches the network.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.cache.get_typed(&QueryKey::user_profile())
    }

    /// Fetch the current user and cache it.
    ///
    /// An auth failure while a token is stored ends the session.
    pub async fn refresh_profile(&self) -> Result<UserProfile, SessionError> {
        let started = self.generation();
        let had_token = self.token()?.is_some();
        let fetched = self.api.get_profile().await;
        if self.generation() != started {
            return Err(self.superseded("profile refresh"));
        }
        match fetched {
            Ok(profile) => {
                self.write_profile(&profile);
                Ok(profile)
            }
            Err(e) => Err(self.handle_authenticated_failure(had_token, e)),
        }
    }

    /// Resume a tab that already has a token stored.
    pub async fn restore(&self) -> Result<Option<UserProfile>, SessionError> {
        if self.token()?.is_none() {
            return Ok(None);
        }
        if let Some(user) = self.current_user() {
            return Ok(Some(user));
        }
        self.refresh_profile().await.map(Some)
    }

    /// Assigned requests, served from the cache while fresh.
    pub async fn assigned_requests(&self) -> Result<Vec<MedicalRecord>, SessionError> {
        let key = QueryKey::assigned_requests();
        if !self.cache.is_stale(&key, self.stale_after) {
            if let Some(records) = self.cache.get_typed::<Vec<MedicalRecord>>(&key) {
                return Ok(records);
            }
        }

        let started = self.generation();
        let had_token = self.token()?.is_some();
        let fetched = self.api.get_assigned_requests().await;
        if self.generation() != started {
            return Err(self.superseded("assigned requests"));
        }
        let records = fetched.map_err(|e| self.handle_authenticated_failure(had_token, e))?;

        if let Err(e) = self.cache.set_typed(key, &records) {
            tracing::warn!("Failed to cache assigned requests: {e}");
        }
        Ok(records)
    }

    // ── Provider capability ─────────────────────────────────

    /// Fetch the current profile and check it as a provider of `expected`.
    pub async fn get_provider(&self, expected: ProviderRole) -> ProviderState {
        match self.api.get_profile().await {
            Ok(profile) => match verify_provider(&profile, expected) {
                Ok(provider) => ProviderState::Found(provider),
                Err(reason) => {
                    tracing::debug!(expected = %expected, "Provider check rejected profile: {reason}");
                    ProviderState::Error(text(self.locale, MessageKey::ProviderNotFound).to_string())
                }
            },
            Err(e) => {
                tracing::warn!(expected = %expected, "Provider lookup failed: {e}");
                ProviderState::Error(self.failure_message(&e, MessageKey::ProviderNotFound))
            }
        }
    }

    /// Run `get_provider` in the background. The receiver starts at `Loading`.
    pub fn watch_provider(self: &Arc<Self>, expected: ProviderRole) -> watch::Receiver<ProviderState> {
        let (tx, rx) = watch::channel(ProviderState::Loading);
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let state = manager.get_provider(expected).await;
            // Receiver may be gone if the view closed
            let _ = tx.send(state);
        });
        rx
    }

    // ── Helpers ─────────────────────────────────────────────

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Superseded requests stay silent: the transition that replaced them
    /// already notified.
    fn superseded(&self, stage: &'static str) -> SessionError {
        tracing::info!(stage, "Tab session changed while request was in flight, discarding result");
        SessionError::Superseded
    }

    fn write_profile(&self, profile: &UserProfile) {
        tracing::debug!(role = %profile.role, "Seeding cached profile");
        if let Err(e) = self.cache.set_typed(QueryKey::user_profile(), profile) {
            tracing::warn!("Failed to cache profile: {e}");
        }
    }

    /// Callers check the generation first, so `had_token` still describes
    /// the current session.
    fn handle_authenticated_failure(&self, had_token: bool, e: ApiError) -> SessionError {
        if had_token && e.is_auth_failure() {
            self.expire();
        }
        e.into()
    }

    fn failure_message(&self, e: &ApiError, fallback: MessageKey) -> String {
        e.user_message()
            .unwrap_or_else(|| text(self.locale, fallback))
            .to_string()
    }

    fn notify_error(&self, key: MessageKey) {
        self.notify(Notification::error(text(self.locale, key)));
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}

// ═══════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════

pub struct SessionManagerBuilder {
    api: Arc<dyn HealthApi>,
    storage: Option<Arc<dyn TabStorage>>,
    cache: Option<Arc<dyn QueryCache>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    locale: Locale,
    stale_after: Duration,
}

impl SessionManagerBuilder {
    fn new(api: Arc<dyn HealthApi>) -> Self {
        Self {
            api,
            storage: None,
            cache: None,
            navigator: None,
            notifier: None,
            locale: Locale::default(),
            stale_after: Duration::from_secs(DEFAULT_STALE_SECS),
        }
    }

    pub fn storage(mut self, storage: Arc<dyn TabStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn build(self) -> SessionManager {
        SessionManager {
            api: self.api,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryTabStorage::new())),
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryQueryCache::new())),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(HistoryNavigator::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            locale: self.locale,
            stale_after: self.stale_after,
            login_in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
