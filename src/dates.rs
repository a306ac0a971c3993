use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

use crate::types::MonthWindow;

pub fn start_of_month<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let day = date.date_naive();
    let first = day - Days::new(u64::from(day.day0()));
    local_midnight(&date.timezone(), first)
}

pub fn start_of_next_month<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let day = date.date_naive();
    let first = day - Days::new(u64::from(day.day0()));
    local_midnight(&date.timezone(), first + Months::new(1))
}

pub fn month_window<Tz: TimeZone>(date: &DateTime<Tz>) -> MonthWindow {
    MonthWindow {
        start: start_of_month(date).with_timezone(&Utc),
        end: start_of_next_month(date).with_timezone(&Utc),
    }
}

pub fn truncate_to_seconds<Tz: TimeZone>(instant: DateTime<Tz>) -> DateTime<Tz> {
    instant.with_nanosecond(0).unwrap_or_else(|| {
        // only fails on leap-second representations
        let secs = instant.timestamp();
        let tz = instant.timezone();
        tz.timestamp_opt(secs, 0).earliest().unwrap_or(instant)
    })
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Tz> {
    let naive = day.and_time(NaiveTime::MIN);
    // a DST jump can skip midnight; fall back to the same wall clock read as UTC
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
