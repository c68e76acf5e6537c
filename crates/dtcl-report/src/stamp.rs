use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};

pub fn date_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%d-%m-%Y").to_string()
}

pub fn time_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H-%M-%S").to_string()
}

/// Local `(date, time)` pair as written into report headers.
pub fn now_stamps() -> (String, String) {
    let now = Local::now();
    (date_stamp(&now), time_stamp(&now))
}

/// `dd-mm-YYYY HH-MM-SS`, the timestamp carried by performance results.
pub fn now_timestamp() -> String {
    let (date, time) = now_stamps();
    format!("{date} {time}")
}

/// `HH:MM:SS`; hours keep counting past 99.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
