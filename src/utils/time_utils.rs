use chrono::{DateTime, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const SECS_IN_MIN: i64 = 60;
    pub const SECS_IN_3_MIN: i64 = Self::SECS_IN_MIN * 3;
    pub const SECS_IN_5_MIN: i64 = Self::SECS_IN_MIN * 5;
    pub const SECS_IN_15_MIN: i64 = Self::SECS_IN_MIN * 15;
    pub const SECS_IN_30_MIN: i64 = Self::SECS_IN_MIN * 30;
    pub const SECS_IN_H: i64 = Self::SECS_IN_MIN * 60;
    pub const SECS_IN_2_H: i64 = Self::SECS_IN_H * 2;
    pub const SECS_IN_4_H: i64 = Self::SECS_IN_H * 4;
    pub const SECS_IN_6_H: i64 = Self::SECS_IN_H * 6;
    pub const SECS_IN_12_H: i64 = Self::SECS_IN_H * 12;
    pub const SECS_IN_D: i64 = Self::SECS_IN_H * 24;
    pub const SECS_IN_3_D: i64 = Self::SECS_IN_D * 3;
    pub const STANDARD_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

    /// Convert a candle step in seconds to shorthand (e.g. `15m`, `4h`).
    pub fn step_to_string(step_secs: i64) -> &'static str {
        match step_secs {
            Self::SECS_IN_MIN => "1m",
            Self::SECS_IN_3_MIN => "3m",
            Self::SECS_IN_5_MIN => "5m",
            Self::SECS_IN_15_MIN => "15m",
            Self::SECS_IN_30_MIN => "30m",
            Self::SECS_IN_H => "1h",
            Self::SECS_IN_2_H => "2h",
            Self::SECS_IN_4_H => "4h",
            Self::SECS_IN_6_H => "6h",
            Self::SECS_IN_12_H => "12h",
            Self::SECS_IN_D => "1d",
            Self::SECS_IN_3_D => "3d",
            _ => "unknown",
        }
    }
}

// Time Helper functions

pub fn epoch_sec_to_utc(epoch_sec: i64) -> String {
    // Used for display purposes
    match DateTime::from_timestamp(epoch_sec, 0) {
        Some(dt) => format!("{}", dt.format(TimeUtils::STANDARD_TIME_FORMAT)),
        None => format!("<invalid timestamp {}>", epoch_sec),
    }
}

pub fn now_timestamp_secs() -> i64 {
    Utc::now().timestamp()
}

pub fn now_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn format_duration(secs: i64) -> String {
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }
    let months = days / 30;
    if months < 12 {
        return format!("{}M", months);
    }
    let years = months / 12;
    let rem_months = months % 12;
    format!("{}Y {}M", years, rem_months)
}
