use crate::parsers::dates::{
    self, MonthTag, dates_from_url, has_weekend, parse_cell_date, parse_date_range,
};
use chrono::NaiveDate;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn iso(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

#[cfg(test)]
mod range_text_tests {
    use super::*;

    #[test]
    fn test_same_month_day_only_range() {
        let dates = parse_date_range("Dec 27 – 28", 2024);
        assert_eq!(iso(&dates), vec!["2024-12-27", "2024-12-28"]);
    }

    #[test]
    fn test_range_across_year_boundary() {
        let dates = parse_date_range("Dec 30 – Jan 2", 2024);
        assert_eq!(
            iso(&dates),
            vec!["2024-12-30", "2024-12-31", "2025-01-01", "2025-01-02"]
        );
    }

    #[test]
    fn test_single_date() {
        assert_eq!(iso(&parse_date_range("Mar 5", 2025)), vec!["2025-03-05"]);
    }

    #[test]
    fn test_em_dash_and_hyphen_are_equivalent() {
        assert_eq!(
            parse_date_range("Jan 3 — Jan 4", 2025),
            parse_date_range("Jan 3 - Jan 4", 2025)
        );
    }

    #[test]
    fn test_malformed_text_yields_nothing() {
        assert!(parse_date_range("Tonight", 2025).is_empty());
        assert!(parse_date_range("", 2025).is_empty());
        // February has no 30th
        assert!(parse_date_range("Feb 30", 2025).is_empty());
    }

    #[test]
    fn test_unparsable_end_falls_back_to_start() {
        assert_eq!(iso(&parse_date_range("Jun 9 - soon", 2025)), vec!["2025-06-09"]);
    }

    #[test]
    fn test_date_pill_detection() {
        assert!(dates::looks_like_date_pill("Dec 27 – 28"));
        assert!(!dates::looks_like_date_pill("Dec 27 – 28 · 2 nights selected"));
        assert!(!dates::looks_like_date_pill("27 Dec"));
    }
}

#[cfg(test)]
mod url_range_tests {
    use super::*;

    #[test]
    fn test_start_and_end_in_url() {
        let url = "https://example.com/multicalendar/123/edit-selected-dates/2024-12-30/2025-01-01";
        assert_eq!(
            iso(&dates_from_url(url)),
            vec!["2024-12-30", "2024-12-31", "2025-01-01"]
        );
    }

    #[test]
    fn test_single_date_in_url() {
        let url = "https://example.com/multicalendar/123/edit-selected-dates/2025-02-14";
        assert_eq!(iso(&dates_from_url(url)), vec!["2025-02-14"]);
    }

    #[test]
    fn test_reversed_or_missing_range() {
        let reversed = "https://example.com/multicalendar/edit-selected-dates/2025-02-14/2025-02-10";
        assert!(dates_from_url(reversed).is_empty());
        assert!(dates_from_url("https://example.com/multicalendar/123").is_empty());
    }

    #[test]
    fn test_invalid_calendar_date_in_url() {
        let url = "https://example.com/multicalendar/edit-selected-dates/2025-02-31";
        assert!(dates_from_url(url).is_empty());
    }
}

#[cfg(test)]
mod weekday_tests {
    use super::*;

    #[test]
    fn test_saturday_is_weekend() {
        assert!(has_weekend(&[day("2024-12-28")]));
    }

    #[test]
    fn test_monday_is_not_weekend() {
        assert!(!has_weekend(&[day("2024-12-30")]));
    }

    #[test]
    fn test_friday_and_sunday_count() {
        assert!(has_weekend(&[day("2024-12-23"), day("2024-12-27")]));
        assert!(has_weekend(&[day("2024-12-29")]));
        assert!(!has_weekend(&[]));
    }
}

#[cfg(test)]
mod month_tests {
    use super::*;

    #[test]
    fn test_month_heading() {
        assert_eq!(
            dates::parse_month_heading("December 2024"),
            Some(MonthTag { year: 2024, month: 12 })
        );
        assert_eq!(dates::parse_month_heading("Pricing settings"), None);
        assert_eq!(MonthTag { year: 2025, month: 3 }.to_string(), "2025-03");
    }

    #[test]
    fn test_cell_date_with_and_without_year() {
        let today = day("2024-12-20");
        assert_eq!(
            parse_cell_date("Saturday, December 28, 2024", today),
            Some(day("2024-12-28"))
        );
        // No year: January is earlier than December, so it belongs to next year
        assert_eq!(parse_cell_date("Jan 4", today), Some(day("2025-01-04")));
        assert_eq!(parse_cell_date("Available", today), None);
    }
}
