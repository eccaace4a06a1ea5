//! `SessionCoordinator`: the one entry point for authenticated API calls.
//!
//! This is where the layers meet: transport → protocol → session. Every
//! request the dashboard makes goes through
//! [`SessionCoordinator::authenticated_request`], which attaches the stored
//! access token, refreshes it when it is about to expire (proactive) or
//! when the server says `401` (reactive), and retries once.
//!
//! # Single-flight refresh
//!
//! Refresh tokens rotate: each one is good for exactly one refresh. Two
//! refresh calls racing with the same refresh token would make the second
//! fail and log the user out. So the coordinator memoizes the in-flight
//! refresh as a [`Shared`] future:
//!
//! ```text
//!   task A ── refresh() ──┐ creates the flight      ┌── Ok(Some(A2/R2))
//!   task B ── refresh() ──┼── awaits the same ──────┼── Ok(Some(A2/R2))
//!   task C ── refresh() ──┘   POST /api/auth/refresh └── Ok(Some(A2/R2))
//!                             (exactly one call)
//! ```
//!
//! The flight clears its own memo when it settles, so the next expiry
//! starts a fresh refresh that re-reads storage.
//!
//! # Ending a session
//!
//! Logout and the idle guard bump a generation counter before they queue
//! for the writer lock. A refresh that was already talking to the server
//! sees the bump and throws its grant away instead of saving it, so an
//! ended session stays ended.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use banquet_idle::{IdleConfig, IdleGuard, IdleHandle, SessionEnd};
use banquet_protocol::endpoints::{LOGIN_PATH, LOGOUT_PATH, ME_PATH, REFRESH_PATH};
use banquet_protocol::{
    Codec, ErrorBody, JsonCodec, LoginRequest, RefreshRequest, TokenGrant,
};
use banquet_session::{
    AuthSession, SessionConfig, SessionError, SessionState, SessionStore, token,
};
use banquet_transport::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::BanquetError;
use crate::error::RefreshFailure;

type RefreshOutcome = Result<Option<AuthSession>, RefreshFailure>;
type RefreshFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Result of [`SessionCoordinator::verify_session`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    /// Nothing stored; the caller should send the user to login.
    NoSession,
    /// The server accepted the token. Carries the `/api/auth/me` body.
    Active(serde_json::Value),
    /// The server rejected the token; storage has been cleared.
    Rejected,
    /// No verdict on the stored session. Either the server could not be
    /// reached, or the record was replaced while the check was out.
    /// Storage is left alone.
    Unknown,
}

/// Shared state behind every clone of a [`SessionCoordinator`].
struct Inner<T: HttpTransport, S: SessionStore> {
    transport: T,
    store: Arc<S>,
    config: SessionConfig,
    codec: JsonCodec,
    /// The refresh currently in flight, if any.
    pending: Mutex<Option<RefreshFlight>>,
    /// Held by whichever routine rewrites or clears the stored record:
    /// refresh, login, logout, idle expiry.
    writer: tokio::sync::Mutex<()>,
    /// Bumped whenever a session is ended on purpose.
    generation: AtomicU64,
}

/// Owns the client session and issues authenticated requests.
///
/// Construct one per application and clone it into every task that talks
/// to the API; clones share the store and the single-flight refresh.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use banquet::prelude::*;
///
/// # async fn run() -> Result<(), BanquetError> {
/// let transport = ReqwestTransport::new("https://admin.example.com")?;
/// let store = Arc::new(MemoryStore::new());
/// let session = SessionCoordinator::new(transport, store, SessionConfig::default());
///
/// session.login("ada", "correct horse").await?;
/// let users = session.authenticated_request(ApiRequest::get("/api/users")).await?;
/// println!("{}", users.status);
/// # Ok(())
/// # }
/// ```
pub struct SessionCoordinator<T: HttpTransport, S: SessionStore> {
    inner: Arc<Inner<T, S>>,
}

impl<T: HttpTransport, S: SessionStore> Clone for SessionCoordinator<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: HttpTransport, S: SessionStore> SessionCoordinator<T, S> {
    /// Creates a coordinator over the given transport and store.
    pub fn new(transport: T, store: Arc<S>, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                config: config.validated(),
                codec: JsonCodec,
                pending: Mutex::new(None),
                writer: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The store this coordinator reads and writes.
    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    /// The (validated) session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// A snapshot of the stored session.
    pub fn session(&self) -> Option<AuthSession> {
        self.inner.store.load()
    }

    /// The session state as observed right now.
    pub fn state(&self) -> SessionState {
        if self.inner.pending().is_some() {
            return SessionState::Refreshing;
        }
        match self.inner.store.load() {
            None => SessionState::Unauthenticated,
            Some(session) if self.inner.near_expiry(&session) => {
                SessionState::ExpiredPendingRefresh
            }
            Some(_) => SessionState::Authenticated,
        }
    }

    /// Starts an idle guard that ends this coordinator's session after
    /// `config.timeout` without activity.
    ///
    /// The idle logout takes the same writer lock as refresh and login, and
    /// a refresh in flight when it fires does not bring the session back.
    /// Must be called inside a Tokio runtime.
    pub fn start_idle_guard(&self, config: IdleConfig) -> (IdleGuard, IdleHandle) {
        IdleGuard::start(
            config,
            IdleLogout {
                inner: Arc::clone(&self.inner),
            },
        )
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Issues `request` with the stored access token attached.
    ///
    /// 1. If the stored token expires within the refresh margin, refresh
    ///    first and use whatever the refresh produced.
    /// 2. Send, with a bearer credential if a session exists.
    /// 3. On `401`, refresh once. If that yields a session, resend once with
    ///    the new token and return that response. Otherwise return the
    ///    original `401`.
    ///
    /// A request for an absolute URL leaves the API's origin, so it is sent
    /// as-is: no bearer token and no refresh.
    ///
    /// # Errors
    /// Only when no response could be obtained at all (including a refresh
    /// call that failed to reach the server), or the session store failed.
    /// Rejected credentials come back as ordinary responses.
    pub async fn authenticated_request(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, BanquetError> {
        if request.is_absolute() {
            debug!(url = %request.path, "absolute URL, sending without credentials");
            return Ok(self.inner.transport.send(request).await?);
        }

        let mut session = self.inner.store.load();

        if let Some(current) = session.as_ref().filter(|s| self.inner.near_expiry(s)) {
            debug!(path = %request.path, "access token near expiry, refreshing first");
            let stale = current.access_token.clone();
            session = self.refresh_replacing(Some(&stale)).await?;
        }

        let response = self.send_with(&request, session.as_ref()).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        debug!(path = %request.path, "request unauthorized, refreshing");
        let rejected = session.map(|s| s.access_token);
        match self.refresh_replacing(rejected.as_deref()).await? {
            Some(renewed) => Ok(self.send_with(&request, Some(&renewed)).await?),
            None => Ok(response),
        }
    }

    /// Exchanges the stored refresh token for a new pair.
    ///
    /// Concurrent callers share one network call and one outcome.
    /// Returns `Ok(None)` when there is no session to refresh or the server
    /// refused; in both cases storage has been cleared.
    ///
    /// # Errors
    /// Transport failure of the refresh call (storage untouched), or a
    /// store that could not be written.
    pub async fn refresh(&self) -> Result<Option<AuthSession>, BanquetError> {
        self.refresh_replacing(None).await
    }

    /// Joins the in-flight refresh, or starts one.
    ///
    /// With `stale` set, a stored access token that differs from it means
    /// another task already rotated the pair after the caller read it; that
    /// session is returned as-is instead of spending the new refresh token.
    /// The check runs under the memo lock, and a flight saves before it
    /// clears the memo, so no caller can miss both the flight and its
    /// result.
    async fn refresh_replacing(
        &self,
        stale: Option<&str>,
    ) -> Result<Option<AuthSession>, BanquetError> {
        let flight = {
            let mut pending = self.inner.lock_pending();
            match pending.as_ref() {
                Some(flight) => {
                    debug!("joining in-flight refresh");
                    flight.clone()
                }
                None => {
                    if let Some(stale) = stale {
                        let rotated = self
                            .inner
                            .store
                            .load()
                            .filter(|stored| stored.access_token != stale);
                        if rotated.is_some() {
                            debug!("token already rotated, skipping refresh");
                            return Ok(rotated);
                        }
                    }

                    let inner = Arc::clone(&self.inner);
                    let flight = async move {
                        let _settled = FlightSettled(&*inner);
                        inner.run_refresh().await
                    }
                    .boxed()
                    .shared();
                    *pending = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await.map_err(BanquetError::from)
    }

    // -----------------------------------------------------------------------
    // Login / logout / liveness
    // -----------------------------------------------------------------------

    /// Signs in and stores the granted session.
    ///
    /// # Errors
    /// - [`SessionError::LoginRejected`] for a non-2xx answer, carrying the
    ///   server's message or `"Login failed with status: N"`.
    /// - [`BanquetError::Protocol`] if the 2xx body is not a token grant.
    /// - [`SessionError::InvalidGrant`] if the grant lacks a token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, BanquetError> {
        let body = LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        let request = ApiRequest::post(LOGIN_PATH).json(&body)?;
        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            let status = response.status.as_u16();
            let message = self
                .inner
                .codec
                .decode::<ErrorBody>(&response.body)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("Login failed with status: {status}"));
            warn!(username, status, "login rejected");
            return Err(SessionError::LoginRejected { status, message }.into());
        }

        let grant: TokenGrant = self.inner.codec.decode(&response.body)?;
        grant
            .validate()
            .map_err(|e| SessionError::InvalidGrant(e.to_string()))?;

        let session = AuthSession::from_grant(&grant, &self.inner.config);
        {
            let _writer = self.inner.writer.lock().await;
            self.inner
                .store
                .save(&session, self.inner.config.session_max_age(&grant))?;
        }

        info!(username, access_ttl_secs = session.access_ttl_secs, "login succeeded");
        Ok(session)
    }

    /// Tells the server the session is over and clears it locally.
    ///
    /// The server call is best-effort: its failure is logged and ignored.
    /// Local state is always cleared, and a refresh in flight will not save.
    pub async fn logout(&self) {
        if let Some(session) = self.inner.store.load() {
            match self.notify_logout(&session).await {
                Ok(response) if !response.is_success() => {
                    debug!(status = response.status.as_u16(), "logout call not acknowledged");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "logout call failed"),
            }
        }

        self.inner.end_session("logout").await;
    }

    /// Asks the server whether the stored token is still good.
    pub async fn verify_session(&self) -> SessionCheck {
        let Some(session) = self.inner.store.load() else {
            return SessionCheck::NoSession;
        };

        let response = match self.send_with(&ApiRequest::get(ME_PATH), Some(&session)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "session check could not reach the server");
                return SessionCheck::Unknown;
            }
        };

        if !response.is_success() {
            let _writer = self.inner.writer.lock().await;
            let unchanged = self
                .inner
                .store
                .load()
                .is_some_and(|stored| stored.access_token == session.access_token);
            if !unchanged {
                debug!("session replaced during check, keeping it");
                return SessionCheck::Unknown;
            }
            self.inner.clear("session check rejected");
            return SessionCheck::Rejected;
        }

        SessionCheck::Active(response.json().unwrap_or(serde_json::Value::Null))
    }

    async fn notify_logout(
        &self,
        session: &AuthSession,
    ) -> Result<ApiResponse, TransportError> {
        let request = ApiRequest::post(LOGOUT_PATH).bearer(&session.access_token)?;
        self.inner.transport.send(request).await
    }

    async fn send_with(
        &self,
        request: &ApiRequest,
        session: Option<&AuthSession>,
    ) -> Result<ApiResponse, TransportError> {
        let mut request = request.clone();
        if let Some(session) = session {
            request = request.bearer(&session.access_token)?;
        }
        self.inner.transport.send(request).await
    }
}

impl<T: HttpTransport, S: SessionStore> Inner<T, S> {
    fn lock_pending(&self) -> MutexGuard<'_, Option<RefreshFlight>> {
        // Nothing panics while holding this lock; a poisoned memo is still
        // a valid `Option`.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> Option<RefreshFlight> {
        self.lock_pending().clone()
    }

    fn near_expiry(&self, session: &AuthSession) -> bool {
        token::needs_refresh(
            &session.access_token,
            SystemTime::now(),
            self.config.refresh_margin(),
        )
    }

    /// Ends the session on purpose: any refresh already in flight will not
    /// save, then the record is cleared under the writer lock.
    async fn end_session(&self, why: &'static str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _writer = self.writer.lock().await;
        self.clear(why);
    }

    /// Removes the stored record. Callers hold `writer`.
    fn clear(&self, why: &'static str) {
        match self.store.clear() {
            Ok(()) => info!(reason = why, "session cleared"),
            Err(e) => warn!(reason = why, error = %e, "failed to clear session"),
        }
    }

    /// The refresh itself. Only ever run inside the shared flight.
    async fn run_refresh(&self) -> RefreshOutcome {
        let generation = self.generation.load(Ordering::SeqCst);
        let _writer = self.writer.lock().await;

        // Re-read under the writer lock: a login or logout may have landed
        // since the caller looked.
        let Some(current) = self.store.load() else {
            debug!("no refresh token stored");
            self.store.clear()?;
            return Ok(None);
        };

        info!("refreshing access token");
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest {
            refresh_token: current.refresh_token,
        })?;
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "refresh call failed, keeping stored session");
                return Err(e.into());
            }
        };

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "refresh rejected");
            self.store.clear()?;
            info!(reason = "refresh rejected", "session cleared");
            return Ok(None);
        }

        let grant = self
            .codec
            .decode::<TokenGrant>(&response.body)
            .and_then(|grant| grant.validate().map(|()| grant));
        let grant = match grant {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "refresh returned an unusable grant");
                self.store.clear()?;
                info!(reason = "unusable refresh grant", "session cleared");
                return Ok(None);
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            info!("session ended during refresh, discarding new tokens");
            self.store.clear()?;
            return Ok(None);
        }

        let session = AuthSession::from_grant(&grant, &self.config);
        self.store.save(&session, self.config.session_max_age(&grant))?;
        info!(access_ttl_secs = session.access_ttl_secs, "refresh succeeded");
        Ok(Some(session))
    }
}

/// Clears the refresh memo when the flight settles, including by panic,
/// so a failed flight is never joined again.
struct FlightSettled<'a, T: HttpTransport, S: SessionStore>(&'a Inner<T, S>);

impl<T: HttpTransport, S: SessionStore> Drop for FlightSettled<'_, T, S> {
    fn drop(&mut self) {
        self.0.lock_pending().take();
    }
}

/// The idle guard's way into the coordinator.
struct IdleLogout<T: HttpTransport, S: SessionStore> {
    inner: Arc<Inner<T, S>>,
}

impl<T: HttpTransport, S: SessionStore> SessionEnd for IdleLogout<T, S> {
    async fn end_session(&self) {
        self.inner.end_session("idle timeout").await;
    }
}
