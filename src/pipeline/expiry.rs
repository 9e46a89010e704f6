use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::clock::Clock;
use crate::models::ExpiryStatus;

const SECONDS_PER_DAY: i64 = 86_400;

/// Signed whole days from `now` until midnight at the start of `expiry`.
/// Floors toward negative infinity, so any instant past that midnight is
/// already negative.
pub fn days_until_expiry(expiry: NaiveDate, now: NaiveDateTime) -> i64 {
    let delta = expiry.and_time(NaiveTime::MIN) - now;
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Grade a day count. `soon_days` is the inclusive "expiring soon" horizon.
pub fn expiry_status(days: i64, soon_days: i64) -> ExpiryStatus {
    if days < 0 {
        ExpiryStatus::Expired
    } else if days <= soon_days {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Valid
    }
}

/// Day-offset calculator bound to an injected clock.
pub struct ExpiryCalculator<'a> {
    clock: &'a dyn Clock,
    soon_days: i64,
}

impl<'a> ExpiryCalculator<'a> {
    pub fn new(clock: &'a dyn Clock, soon_days: i64) -> Self {
        Self { clock, soon_days }
    }

    pub fn days_until(&self, expiry: NaiveDate) -> i64 {
        days_until_expiry(expiry, self.clock.now())
    }

    pub fn status(&self, expiry: NaiveDate) -> ExpiryStatus {
        expiry_status(self.days_until(expiry), self.soon_days)
    }
}
