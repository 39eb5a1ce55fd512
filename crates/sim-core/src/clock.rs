//! Wall-clock capability used to pick the drift band for a tick.

use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub trait Clock: Send + Sync {
    /// Current local wall time.
    fn now(&self) -> NaiveDateTime;

    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    /// 2024-01-01 at `hour`:00, with `hour` wrapped into 0..24.
    pub fn at_hour(hour: u32) -> Self {
        Self::new(instant_at_hour(hour))
    }

    pub fn set(&self, instant: NaiveDateTime) {
        let mut guard = self
            .instant
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = instant;
    }

    pub fn set_hour(&self, hour: u32) {
        self.set(instant_at_hour(hour));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self
            .instant
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn instant_at_hour(hour: u32) -> NaiveDateTime {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let time = NaiveTime::from_hms_opt(hour % 24, 0, 0).unwrap_or_default();
    date.and_time(time)
}
