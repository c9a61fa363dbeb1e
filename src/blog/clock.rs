//! Time source used when saving posts

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

/// Supplies the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar (year, month) of the current instant in `tz`
    fn year_month(&self, tz: Tz) -> (i32, u32) {
        let local = self.now().with_timezone(&tz);
        (local.year(), local.month())
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
