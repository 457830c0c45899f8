use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike};

/// Format of `start_time` and `end_time` columns.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Files written by older versions only kept minutes.
pub const SHORT_TIME_FORMAT: &str = "%H:%M";

/// This is the standard way of converting a date to a file name in worklog.
pub fn date_to_record_name(date: NaiveDate) -> String {
    format!("{}.csv", date.format("%Y-%m-%d"))
}

/// Inverse of [date_to_record_name]. Returns `None` for files that are not day logs.
pub fn record_name_to_date(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(".csv")?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Wall-clock time with sub-second precision dropped, since files only keep seconds.
pub fn wall_time(moment: DateTime<Local>) -> NaiveTime {
    let time = moment.time();
    time.with_nanosecond(0).unwrap_or(time)
}

pub fn parse_wall_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, SHORT_TIME_FORMAT))
        .ok()
}
