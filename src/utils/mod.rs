mod maths_utils;
pub mod time_utils;

pub use time_utils::{
    TimeUtils, epoch_sec_to_utc, format_duration, now_timestamp_ms, now_timestamp_secs,
};

pub(crate) use maths_utils::{
    mean, mean_abs_deviation, mean_and_std_dev, midpoint,
};
