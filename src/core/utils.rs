use chrono::{
    DateTime,
    Datelike,
    Duration,
    Local,
    TimeZone,
};

/// Until this hour (local time) it still counts as the previous day.
pub const DAY_ROLLOVER_HOUR: i64 = 4;

// NaiveDate(1970-01-01).num_days_from_ce()
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Integer count of days since 1970-01-01 in local time, with the day
/// boundary at 4am instead of midnight.
pub fn logical_day_number<Tz: TimeZone>(time: &DateTime<Tz>) -> i64 {
    let shifted = time.naive_local() - Duration::hours(DAY_ROLLOVER_HOUR);
    shifted.date().num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE
}

/// A point in time as seen by the scheduler: unix seconds for learning steps
/// and a logical day number for reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub unix_time: i64,
    pub day_number: i64,
}

impl Moment {
    pub fn at<Tz: TimeZone>(time: &DateTime<Tz>) -> Self {
        Self { unix_time: time.timestamp(), day_number: logical_day_number(time) }
    }

    pub fn now() -> Self {
        Self::at(&Local::now())
    }
}

/// Rounds halves up, e.g. -0.5 -> 0 and 2.5 -> 3.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Short human readable duration, e.g. "45s", "12m", "3h".
pub fn human_time(seconds: f64) -> String {
    if seconds == 0.0 {
        "0s".to_string()
    } else if seconds < 1.0 {
        "<1s".to_string()
    } else if seconds < 60.0 {
        format!("{}s", seconds.round())
    } else if seconds < 3600.0 {
        format!("{}m", (seconds / 60.0).round())
    } else {
        format!("{}h", (seconds / 3600.0).round())
    }
}
