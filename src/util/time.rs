use chrono::{Datelike, NaiveDate, NaiveTime};

/// 日付の UTC 0 時を UNIX 秒で返す。
#[must_use]
pub fn day_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// 曜日番号（日曜 = 0 ... 土曜 = 6）。
#[must_use]
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn day_epoch_is_midnight_utc() {
        assert_eq!(day_epoch(date(1970, 1, 1)), 0);
        assert_eq!(day_epoch(date(1970, 1, 2)), 86_400);
        assert_eq!(day_epoch(date(2023, 7, 1)), 1_688_169_600);
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        // 2023-07-02 was a Sunday
        assert_eq!(weekday_index(date(2023, 7, 2)), 0);
        assert_eq!(weekday_index(date(2023, 7, 8)), 6);
    }
}
