//! Turn deadlines as they appear in runner configuration.
//!
//! A host configures how long one conversation turn may run before the
//! runner gives up on it. The value is written as whole milliseconds
//! (`{"turn_timeout": 1500}`) and reported back the same way in
//! deadline errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A turn deadline in whole milliseconds.
///
/// ```
/// use std::time::Duration;
/// use yak_core::DurationMs;
///
/// let deadline = DurationMs::from(Duration::from_secs(2));
/// assert_eq!(deadline, DurationMs::from_millis(2000));
/// assert_eq!(deadline.to_string(), "2000ms");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(u64);

impl DurationMs {
    /// A deadline of `ms` milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds in this deadline.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// The deadline as a [`Duration`], for `tokio::time::timeout`.
    pub fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

// Sub-millisecond precision is dropped; absurdly long durations saturate.
impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for DurationMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
