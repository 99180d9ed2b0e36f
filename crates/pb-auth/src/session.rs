use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;

use chrono::{DateTime, Duration, Utc};

use crate::models::AuthRecord;

/// Source of the current time
///
/// Validity windows are computed against this so expiry can be tested
/// without waiting an hour.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point in time until which a token is trusted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    valid_until: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// Window opened at `now` that closes after `lifetime`
    pub fn starting_at(now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            valid_until: Some(now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC)),
        }
    }

    /// Strictly before the end of the window; never open when unset
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now < until)
    }

    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }
}

/// Token, identity record and validity of one strategy, replaced as a unit
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub token: String,
    pub record: Option<AuthRecord>,
    pub window: ValidityWindow,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.window.is_open(now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("record", &self.record)
            .field("window", &self.window)
            .finish()
    }
}
