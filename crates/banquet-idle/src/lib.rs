//! Idle-timeout guard for Banquet sessions.
//!
//! Forces a logout after a period with no user interaction. Every
//! qualifying [`Activity`] (pointer movement, pointer press, key press,
//! scroll, touch) resets the countdown to its full length. When the
//! countdown runs out the guard ends the session (see [`SessionEnd`]) and
//! resolves [`IdleGuard::expired`] with [`LogoutReason::Inactive`], which
//! the navigation layer turns into a redirect to `/login?reason=inactive`.
//!
//! # Integration
//!
//! The guard owns one background task. Input sources report activity
//! through cloneable [`IdleHandle`]s; the page awaits the guard:
//!
//! ```ignore
//! let (mut guard, handle) = IdleGuard::start(IdleConfig::default(), store);
//! ui.on_input(move |_| handle.record(Activity::PointerMove));
//! tokio::select! {
//!     reason = guard.expired() => navigate(login_redirect(Some(reason), None)),
//!     _ = page_closed => {} // dropping the guard cancels the timer
//! }
//! ```
//!
//! Dropping the guard aborts the task, so a torn-down page never leaks a
//! timer that later logs the user out.

use std::sync::Arc;
use std::time::Duration;

use banquet_session::{LogoutReason, SessionStore};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A user interaction that counts as "still here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    PointerMove,
    PointerDown,
    KeyPress,
    Scroll,
    Touch,
}

/// Configuration for the idle guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    /// Seconds without activity before the session is cleared.
    pub timeout_secs: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl IdleConfig {
    /// The one canonical default: 10 minutes.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10 * 60;

    /// Shortest accepted timeout.
    pub const MIN_TIMEOUT_SECS: u64 = 1;

    /// Longest accepted timeout: one year.
    pub const MAX_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

    /// Create a config with the given timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_secs: timeout.as_secs(),
        }
    }

    /// Clamp out-of-range values. A zero timeout would log the user out
    /// the instant the page opens, so it becomes [`Self::MIN_TIMEOUT_SECS`].
    /// Deadlines must fit in an [`Instant`], so anything above
    /// [`Self::MAX_TIMEOUT_SECS`] is cut down to it.
    pub fn validated(mut self) -> Self {
        if self.timeout_secs < Self::MIN_TIMEOUT_SECS {
            warn!(
                timeout_secs = self.timeout_secs,
                min = Self::MIN_TIMEOUT_SECS,
                "idle timeout below minimum, clamping"
            );
            self.timeout_secs = Self::MIN_TIMEOUT_SECS;
        }
        if self.timeout_secs > Self::MAX_TIMEOUT_SECS {
            warn!(
                timeout_secs = self.timeout_secs,
                max = Self::MAX_TIMEOUT_SECS,
                "idle timeout exceeds maximum, clamping"
            );
            self.timeout_secs = Self::MAX_TIMEOUT_SECS;
        }
        self
    }

    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// SessionEnd
// ---------------------------------------------------------------------------

/// What the guard does to the session when the countdown runs out.
///
/// Any `Arc<S>` over a [`SessionStore`] clears the store directly. An owner
/// that serializes writes to the session record implements this itself so
/// the idle logout goes through the same writer as everything else.
pub trait SessionEnd: Send + Sync + 'static {
    /// Ends the session. Failures are logged, not returned.
    fn end_session(&self) -> impl std::future::Future<Output = ()> + Send;
}

impl<S: SessionStore> SessionEnd for Arc<S> {
    async fn end_session(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "failed to clear session after idle timeout");
        }
    }
}

// ---------------------------------------------------------------------------
// IdleHandle
// ---------------------------------------------------------------------------

/// Reports user activity to an [`IdleGuard`]. Cheap to clone.
///
/// Recording only overwrites a "last seen" instant, so a flood of pointer
/// moves costs nothing beyond a timestamp write.
#[derive(Debug, Clone)]
pub struct IdleHandle {
    last_activity: Arc<watch::Sender<Instant>>,
}

impl IdleHandle {
    /// Resets the countdown to its full length.
    pub fn record(&self, activity: Activity) {
        trace!(?activity, "user activity");
        self.last_activity.send_replace(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// IdleGuard
// ---------------------------------------------------------------------------

/// Owns the idle countdown for one page/session view.
pub struct IdleGuard {
    task: JoinHandle<()>,
    expired: watch::Receiver<Option<LogoutReason>>,
    timeout: Duration,
}

impl IdleGuard {
    /// Starts the countdown.
    ///
    /// On expiry `session` is ended (for a plain store: cleared). Must be
    /// called inside a Tokio runtime.
    pub fn start<E: SessionEnd>(
        config: IdleConfig,
        session: E,
    ) -> (Self, IdleHandle) {
        let config = config.validated();
        let timeout = config.timeout();

        let (activity_tx, activity_rx) = watch::channel(Instant::now());
        let (expired_tx, expired_rx) = watch::channel(None);

        let task = tokio::spawn(run_countdown(
            timeout,
            activity_rx,
            expired_tx,
            session,
        ));

        debug!(timeout_secs = timeout.as_secs(), "idle guard started");

        let guard = Self {
            task,
            expired: expired_rx,
            timeout,
        };
        let handle = IdleHandle {
            last_activity: Arc::new(activity_tx),
        };
        (guard, handle)
    }

    /// Resolves once the countdown has run out and the session was ended.
    ///
    /// Pends forever if the guard never expires.
    pub async fn expired(&mut self) -> LogoutReason {
        let fired = self
            .expired
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|reason| *reason);
        match fired {
            Some(reason) => reason,
            // The countdown task is gone without firing (aborted).
            None => std::future::pending().await,
        }
    }

    /// `true` once the guard has fired.
    pub fn is_expired(&self) -> bool {
        self.expired.borrow().is_some()
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cancels the countdown. Same as dropping the guard.
    pub fn stop(self) {}
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.task.abort();
            debug!("idle guard stopped");
        }
    }
}

async fn run_countdown<E: SessionEnd>(
    timeout: Duration,
    mut activity: watch::Receiver<Instant>,
    expired: watch::Sender<Option<LogoutReason>>,
    session: E,
) {
    loop {
        let deadline = *activity.borrow_and_update() + timeout;
        tokio::select! {
            changed = activity.changed() => {
                if changed.is_err() {
                    // Every handle is gone; nothing can reset the countdown
                    // any more, so just wait it out.
                    time::sleep_until(deadline).await;
                    break;
                }
            }
            _ = time::sleep_until(deadline) => break,
        }
    }

    session.end_session().await;
    info!(timeout_secs = timeout.as_secs(), "session cleared after inactivity");
    expired.send_replace(Some(LogoutReason::Inactive));
}
