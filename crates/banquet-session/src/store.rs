//! Where the session lives between requests.
//!
//! The browser dashboard keeps its three session fields in cookies that
//! share one `max-age`. [`SessionStore`] is that cookie jar as an injected
//! interface: the coordinator only ever loads, saves, or clears the whole
//! record, so a reader can never observe a new access token next to an old
//! refresh token.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{AuthSession, SessionError};

/// Persistent storage for the session record.
///
/// # Contract
///
/// - `save` replaces all three fields in one step.
/// - A record saved with a non-zero `max_age` loads as `None` once that
///   age has passed. A zero `max_age` never expires (like a cookie without
///   `max-age`, it lives as long as its store does), and neither does one
///   that overflows the clock.
/// - `clear` removes the record. Clearing an empty store is not an error.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the stored session, if one exists and has not expired.
    fn load(&self) -> Option<AuthSession>;

    /// Stores `session`, replacing whatever was there.
    fn save(
        &self,
        session: &AuthSession,
        max_age: Duration,
    ) -> Result<(), SessionError>;

    /// Removes the stored session.
    fn clear(&self) -> Result<(), SessionError>;
}

/// A max age too large to represent as a point in time never expires.
fn expiry_for(max_age: Duration, now: SystemTime) -> Option<SystemTime> {
    if max_age.is_zero() {
        None
    } else {
        now.checked_add(max_age)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    session: AuthSession,
    expires_at: Option<SystemTime>,
}

/// An in-process [`SessionStore`].
///
/// Backed by a `std::sync::RwLock` rather than a Tokio lock: every
/// operation is a quick swap of one small value and never held across an
/// `.await`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entry: RwLock<Option<Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `session` with no expiry.
    pub fn with_session(session: AuthSession) -> Self {
        Self {
            entry: RwLock::new(Some(Entry {
                session,
                expires_at: None,
            })),
        }
    }

    fn load_at(&self, now: SystemTime) -> Option<AuthSession> {
        let guard = self.entry.read().unwrap_or_else(|e| e.into_inner());
        let entry = guard.as_ref()?;
        match entry.expires_at {
            Some(at) if at <= now => None,
            _ => Some(entry.session.clone()),
        }
    }

    fn save_at(&self, session: &AuthSession, max_age: Duration, now: SystemTime) {
        let mut guard = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Entry {
            session: session.clone(),
            expires_at: expiry_for(max_age, now),
        });
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Option<AuthSession> {
        self.load_at(SystemTime::now())
    }

    fn save(
        &self,
        session: &AuthSession,
        max_age: Duration,
    ) -> Result<(), SessionError> {
        self.save_at(session, max_age, SystemTime::now());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// On-disk layout. Field names and the string-encoded TTL follow the
/// cookie names the dashboard uses, so a session file reads the same as the
/// browser's cookie jar.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    auth_token: String,
    refresh_token: String,
    auth_token_ttl: String,
    /// Unix seconds; absent means "no expiry".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

/// A [`SessionStore`] that keeps the record in one JSON file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-write leaves either the old record or the new one, never half
/// of each. A file that cannot be read or parsed loads as "no session".
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_at(&self, now: SystemTime) -> Option<AuthSession> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return None;
            }
        };

        let file: SessionFile = match serde_json::from_slice(&raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file malformed");
                return None;
            }
        };

        let expires_at = file
            .expires_at
            .and_then(|secs| UNIX_EPOCH.checked_add(Duration::from_secs(secs)));
        if let Some(at) = expires_at {
            if at <= now {
                tracing::debug!(path = %self.path.display(), "stored session past its max age");
                return None;
            }
        }

        if file.auth_token.is_empty() || file.refresh_token.is_empty() {
            return None;
        }

        let access_ttl_secs = file
            .auth_token_ttl
            .parse()
            .unwrap_or(banquet_protocol::DEFAULT_ACCESS_TTL_SECS);

        Some(AuthSession {
            access_token: file.auth_token,
            refresh_token: file.refresh_token,
            access_ttl_secs,
        })
    }

    fn save_at(
        &self,
        session: &AuthSession,
        max_age: Duration,
        now: SystemTime,
    ) -> Result<(), SessionError> {
        let expires_at = expiry_for(max_age, now).map(|at| {
            at.duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        });
        let file = SessionFile {
            auth_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            auth_token_ttl: session.access_ttl_secs.to_string(),
            expires_at,
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| SessionError::Store(e.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(store_err)?;
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut out = open_private(&tmp).map_err(store_err)?;
            out.write_all(&bytes).map_err(store_err)?;
            out.sync_all().map_err(store_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(store_err)
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Option<AuthSession> {
        self.load_at(SystemTime::now())
    }

    fn save(
        &self,
        session: &AuthSession,
        max_age: Duration,
    ) -> Result<(), SessionError> {
        self.save_at(session, max_age, SystemTime::now())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_err(e)),
        }
    }
}

fn store_err(e: std::io::Error) -> SessionError {
    SessionError::Store(e.to_string())
}

/// Session files hold credentials: owner read/write only where the
/// platform supports it.
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

// =========================================================================
// Tests
// =========================================================================
