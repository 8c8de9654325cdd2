//! Week-ending-Monday calendar arithmetic.
//!
//! A bucket covers Monday through Sunday and is labeled by the Monday that
//! follows it, so every date maps to the first Monday strictly after it.

use chrono::{Datelike, Days, NaiveDate};

/// Bucket label for `date`: the first Monday strictly after it.
///
/// `None` when the label would fall past the last representable date.
pub fn week_ending(date: NaiveDate) -> Option<NaiveDate> {
    let ahead = 7 - u64::from(date.weekday().num_days_from_monday());
    date.checked_add_days(Days::new(ahead))
}

/// First day (Monday) covered by the bucket labeled `label`.
pub fn week_start(label: NaiveDate) -> Option<NaiveDate> {
    label.checked_sub_days(Days::new(7))
}

/// Last day (Sunday) covered by the bucket labeled `label`.
pub fn week_last_day(label: NaiveDate) -> Option<NaiveDate> {
    label.checked_sub_days(Days::new(1))
}

/// Next bucket label after `label`.
pub fn next_week(label: NaiveDate) -> Option<NaiveDate> {
    label.checked_add_days(Days::new(7))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn every_day_of_a_week_maps_to_the_following_monday() {
        // 2020-03-02 is a Monday.
        for offset in 0..7 {
            let date = d(2020, 3, 2) + Days::new(offset);
            assert_eq!(week_ending(date), Some(d(2020, 3, 9)), "date {date}");
        }
        assert_eq!(week_ending(d(2020, 3, 9)), Some(d(2020, 3, 16)));
    }

    #[test]
    fn labels_are_always_mondays_across_year_end() {
        let label = week_ending(d(2020, 12, 31)).unwrap();
        assert_eq!(label, d(2021, 1, 4));
        assert_eq!(label.weekday(), Weekday::Mon);
        assert_eq!(week_start(label), Some(d(2020, 12, 28)));
        assert_eq!(week_last_day(label), Some(d(2021, 1, 3)));
        assert_eq!(week_last_day(label).unwrap().weekday(), Weekday::Sun);
        assert_eq!(next_week(label), Some(d(2021, 1, 11)));
    }

    #[test]
    fn calendar_edges_are_none_instead_of_panicking() {
        assert_eq!(week_ending(NaiveDate::MAX), None);
        assert_eq!(next_week(NaiveDate::MAX), None);
        assert_eq!(week_start(NaiveDate::MIN), None);
        assert_eq!(week_last_day(NaiveDate::MIN), None);
    }
}
