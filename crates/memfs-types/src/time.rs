//! FILETIME conversions.
//!
//! Timestamps are kept as Windows FILETIME values: 100ns ticks since
//! 1601-01-01 UTC.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// FILETIME of 1970-01-01 UTC.
const UNIX_EPOCH_FILETIME: u64 = 116_444_736_000_000_000;

const TICKS_PER_SECOND: u64 = 10_000_000;

/// Current time as a FILETIME.
pub fn filetime_now() -> u64 {
    filetime_from_system_time(SystemTime::now())
}

pub fn filetime_from_system_time(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => UNIX_EPOCH_FILETIME.saturating_add(ticks(since)),
        Err(e) => UNIX_EPOCH_FILETIME.saturating_sub(ticks(e.duration())),
    }
}

pub fn system_time_from_filetime(filetime: u64) -> SystemTime {
    if filetime >= UNIX_EPOCH_FILETIME {
        UNIX_EPOCH + from_ticks(filetime - UNIX_EPOCH_FILETIME)
    } else {
        UNIX_EPOCH - from_ticks(UNIX_EPOCH_FILETIME - filetime)
    }
}

fn ticks(d: Duration) -> u64 {
    d.as_secs()
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(u64::from(d.subsec_nanos() / 100))
}

fn from_ticks(ticks: u64) -> Duration {
    Duration::new(
        ticks / TICKS_PER_SECOND,
        ((ticks % TICKS_PER_SECOND) * 100) as u32,
    )
}
