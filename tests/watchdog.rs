use std::error::Error;
use std::time::Duration;

use tokio::time::Instant;

use sidepipe::invoke::watchdog::{Expiry, Watchdog};

type TestResult = Result<(), Box<dyn Error>>;

const POLL: Duration = Duration::from_millis(100);

#[test]
fn unbounded_watchdog_never_fires() -> TestResult {
    let start = Instant::now();
    let mut wd = Watchdog::starting_at(None, None, start);

    assert!(wd.is_unbounded());
    assert_eq!(wd.remaining_at(start + Duration::from_secs(3600)), None);
    assert_eq!(wd.next_wait_at(start, POLL), POLL);
    assert_eq!(wd.check_at(start + Duration::from_secs(3600)), None);
    Ok(())
}

#[test]
fn next_wait_is_capped_by_remaining_budget() -> TestResult {
    let start = Instant::now();
    let wd = Watchdog::starting_at(Some(Duration::from_millis(250)), None, start);

    assert_eq!(wd.next_wait_at(start, POLL), POLL);
    assert_eq!(
        wd.next_wait_at(start + Duration::from_millis(200), POLL),
        Duration::from_millis(50)
    );
    assert_eq!(
        wd.next_wait_at(start + Duration::from_secs(1), POLL),
        Duration::ZERO
    );
    Ok(())
}

#[test]
fn progress_resets_stall_budget() -> TestResult {
    let start = Instant::now();
    let mut wd = Watchdog::starting_at(Some(Duration::from_millis(300)), None, start);

    wd.record_progress_at(start + Duration::from_millis(250));
    assert_eq!(wd.check_at(start + Duration::from_millis(400)), None);
    assert_eq!(
        wd.remaining_at(start + Duration::from_millis(400)),
        Some(Duration::from_millis(150))
    );

    assert_eq!(
        wd.check_at(start + Duration::from_millis(550)),
        Some(Expiry::Stalled)
    );
    Ok(())
}

#[test]
fn max_runtime_ignores_progress() -> TestResult {
    let start = Instant::now();
    let mut wd = Watchdog::starting_at(
        Some(Duration::from_secs(10)),
        Some(Duration::from_millis(500)),
        start,
    );

    for ms in [100, 200, 300, 400, 500] {
        wd.record_progress_at(start + Duration::from_millis(ms));
    }
    assert_eq!(
        wd.remaining_at(start + Duration::from_millis(450)),
        Some(Duration::from_millis(50))
    );
    assert_eq!(
        wd.check_at(start + Duration::from_millis(500)),
        Some(Expiry::MaxRuntime)
    );
    Ok(())
}

#[test]
fn first_expiry_is_latched() -> TestResult {
    let start = Instant::now();
    let mut wd = Watchdog::starting_at(
        Some(Duration::from_millis(100)),
        Some(Duration::from_secs(1)),
        start,
    );

    assert_eq!(
        wd.check_at(start + Duration::from_millis(150)),
        Some(Expiry::Stalled)
    );
    assert_eq!(
        wd.check_at(start + Duration::from_secs(5)),
        Some(Expiry::Stalled)
    );
    assert_eq!(wd.fired(), Some(Expiry::Stalled));
    Ok(())
}

#[test]
fn stalls_are_counted() -> TestResult {
    let mut wd = Watchdog::new(Some(Duration::from_secs(1)), None);
    assert_eq!(wd.stalls(), 0);
    wd.record_stall();
    wd.record_stall();
    assert_eq!(wd.stalls(), 2);
    assert_eq!(wd.fired(), None);
    Ok(())
}
