use chrono::{DateTime, NaiveTime, Utc};

/// Midnight UTC of the day containing `now`
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_of_utc_day() {
        let now = Utc.with_ymd_and_hms(2026, 2, 20, 17, 45, 12).unwrap();
        assert_eq!(
            start_of_utc_day(now),
            Utc.with_ymd_and_hms(2026, 2, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(start_of_utc_day(start_of_utc_day(now)), start_of_utc_day(now));
    }
}
