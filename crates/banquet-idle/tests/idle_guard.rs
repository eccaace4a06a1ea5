//! Integration tests for the idle-timeout guard.
//!
//! Uses `start_paused = true` so Tokio's clock only moves when every task
//! is idle; sleeping ten minutes in a test takes no wall-clock time and
//! timer ordering is deterministic.

use std::sync::Arc;
use std::time::Duration;

use banquet_idle::{Activity, IdleConfig, IdleGuard};
use banquet_session::{AuthSession, LogoutReason, MemoryStore, SessionStore};

// =========================================================================
// Helpers
// =========================================================================

const MINUTE: Duration = Duration::from_secs(60);

fn store_with_session() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_session(AuthSession {
        access_token: "A1".into(),
        refresh_token: "R1".into(),
        access_ttl_secs: 900,
    }))
}

fn ten_minutes() -> IdleConfig {
    IdleConfig::with_timeout(10 * MINUTE)
}

// =========================================================================
// IdleConfig
// =========================================================================

#[test]
fn test_default_timeout_is_ten_minutes() {
    assert_eq!(IdleConfig::default().timeout(), 10 * MINUTE);
}

#[test]
fn test_validated_clamps_zero_timeout() {
    let cfg = IdleConfig { timeout_secs: 0 }.validated();
    assert_eq!(cfg.timeout_secs, IdleConfig::MIN_TIMEOUT_SECS);
}

#[test]
fn test_validated_clamps_huge_timeout() {
    let cfg = IdleConfig { timeout_secs: u64::MAX }.validated();
    assert_eq!(cfg.timeout_secs, IdleConfig::MAX_TIMEOUT_SECS);
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_guard_with_huge_timeout_keeps_counting() {
    let store = store_with_session();
    let (mut guard, handle) =
        IdleGuard::start(IdleConfig { timeout_secs: u64::MAX }, Arc::clone(&store));

    assert_eq!(guard.timeout(), Duration::from_secs(IdleConfig::MAX_TIMEOUT_SECS));
    tokio::time::sleep(60 * MINUTE).await;
    handle.record(Activity::KeyPress);

    let fired = tokio::time::timeout(MINUTE, guard.expired()).await;
    assert!(fired.is_err(), "guard should still be counting");
    assert!(store.load().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_guard_fires_after_timeout_and_clears_store() {
    let store = store_with_session();
    let (mut guard, _handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));

    let reason = guard.expired().await;

    assert_eq!(reason, LogoutReason::Inactive);
    assert!(guard.is_expired());
    assert!(store.load().is_none(), "session should be cleared");
}

#[tokio::test(start_paused = true)]
async fn test_guard_does_not_fire_before_timeout() {
    let store = store_with_session();
    let (guard, _handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));

    tokio::time::sleep(9 * MINUTE).await;

    assert!(!guard.is_expired());
    assert!(store.load().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_activity_resets_countdown_to_full_length() {
    let store = store_with_session();
    let (guard, handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));

    // 9 minutes in, the user moves the mouse: a fresh 10 minutes starts.
    tokio::time::sleep(9 * MINUTE).await;
    handle.record(Activity::PointerMove);

    // 18 minutes after start, 9 after the activity: still logged in.
    tokio::time::sleep(9 * MINUTE).await;
    assert!(!guard.is_expired());
    assert!(store.load().is_some());

    // 20 minutes after start, 11 after the activity: logged out.
    tokio::time::sleep(2 * MINUTE).await;
    assert!(guard.is_expired());
    assert!(store.load().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_every_activity_kind_resets_countdown() {
    let store = store_with_session();
    let (guard, handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));

    for activity in [
        Activity::PointerMove,
        Activity::PointerDown,
        Activity::KeyPress,
        Activity::Scroll,
        Activity::Touch,
    ] {
        tokio::time::sleep(8 * MINUTE).await;
        handle.record(activity);
    }

    // 40 minutes have passed but no gap was longer than 8.
    tokio::time::sleep(MINUTE).await;
    assert!(!guard.is_expired());
    assert!(store.load().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_cloned_handles_share_one_countdown() {
    let store = store_with_session();
    let (guard, handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));
    let keyboard = handle.clone();
    drop(handle);

    tokio::time::sleep(9 * MINUTE).await;
    keyboard.record(Activity::KeyPress);
    tokio::time::sleep(9 * MINUTE).await;

    assert!(!guard.is_expired());
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_dropping_guard_cancels_timer() {
    let store = store_with_session();
    let (guard, _handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));

    drop(guard);
    tokio::time::sleep(30 * MINUTE).await;

    assert!(
        store.load().is_some(),
        "a torn-down guard must never log the user out"
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_timer() {
    let store = store_with_session();
    let (guard, handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));

    guard.stop();
    // Reporting activity after teardown is harmless.
    handle.record(Activity::Scroll);
    tokio::time::sleep(30 * MINUTE).await;

    assert!(store.load().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_guard_fires_even_when_all_handles_dropped() {
    let store = store_with_session();
    let (mut guard, handle) = IdleGuard::start(ten_minutes(), Arc::clone(&store));
    drop(handle);

    assert_eq!(guard.expired().await, LogoutReason::Inactive);
    assert!(store.load().is_none());
}
