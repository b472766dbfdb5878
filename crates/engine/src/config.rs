//! Fixed scheduling window and search constants.

use std::time::Duration;

/// Earliest session start hour.
pub const FIRST_HOUR: u8 = 8;
/// Latest session start hour considered by the randomized phase.
pub const LAST_HOUR: u8 = 19;
/// Exclusive end of the daily operating window; rooms are closed outside
/// `FIRST_HOUR..DAY_END` regardless of place schedules.
pub const DAY_END: u8 = 20;

/// Randomized-phase attempt budget per session before the exhaustive scan.
pub const RANDOM_ATTEMPTS: u32 = 100;

/// Pool-wide deadline for collecting subject tasks; tasks still running
/// past it are aborted and their subjects marked failed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);
