use chrono::{DateTime, TimeZone, Utc};
use log::info;
use std::time::Instant;

/**
 * Small helper to compute the execution time of some code
 */
pub struct TimeLogger {
    start_time: Instant,
    message: String,
}

impl TimeLogger {
    pub fn new(message: String) -> Self {
        TimeLogger {
            start_time: Instant::now(),
            message,
        }
    }

    pub fn complete(&self) {
        let duration = self.start_time.elapsed();
        info!("{} in {:.2?}", self.message, duration);
    }
}

/**
 * Remove duplicates while keeping the first occurrence of each value
 */
pub fn dedup_keep_first<T>(values: Vec<T>) -> Vec<T>
where
    T: Eq + std::hash::Hash + Clone,
{
    use itertools::Itertools;
    values.into_iter().unique().collect()
}

/**
 * Millisecond timestamps are what the stats index sorts on, so everything
 * is truncated to that precision before being stored or compared.
 */
pub fn truncate_to_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(time.timestamp_millis())
        .single()
        .unwrap_or(time)
}

pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}
