use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use std::sync::LazyLock;

/// Longest date range ever expanded into individual days
pub const MAX_RANGE_DAYS: usize = 366;

static URL_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"edit-selected-dates/(\d{4}-\d{2}-\d{2})(?:/(\d{4}-\d{2}-\d{2}))?")
        .expect("URL date range pattern is valid")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zA-Z]{3})[a-zA-Z]*\.?\s?(\d{1,2})").expect("month/day pattern is valid")
});

static DAY_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}$").expect("day pattern is valid"));

static PILL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{3}\s\d{1,2}").expect("pill pattern is valid"));

static MONTH_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{4})\b")
        .expect("month heading pattern is valid")
});

static CELL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4}))?",
    )
    .expect("cell date pattern is valid")
});

/// Month number (1-12) for an English month name or its three-letter abbreviation
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().to_ascii_lowercase();
    let abbr = lower.get(..3)?;
    let month = match abbr {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Every day from `start` to `end` inclusive; empty when `end` precedes `start`
pub fn expand_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .take(MAX_RANGE_DAYS)
        .collect()
}

/// Selected dates encoded in a calendar URL as `edit-selected-dates/<start>[/<end>]`
pub fn dates_from_url(url: &str) -> Vec<NaiveDate> {
    let Some(caps) = URL_RANGE.captures(url) else {
        return Vec::new();
    };
    let parse = |m: regex::Match<'_>| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok();

    let Some(start) = caps.get(1).and_then(parse) else {
        ::log::debug!("Malformed start date in URL: {}", url);
        return Vec::new();
    };
    let end = match caps.get(2) {
        Some(m) => match parse(m) {
            Some(end) => end,
            None => {
                ::log::debug!("Malformed end date in URL: {}", url);
                return Vec::new();
            }
        },
        None => start,
    };
    expand_range(start, end)
}

/// Whether `text` looks like a short date pill such as "Dec 27 – 28"
pub fn looks_like_date_pill(text: &str) -> bool {
    PILL.is_match(text) && text.chars().count() < 20
}

/// Parses abbreviated range text into consecutive dates within `year`
///
/// Accepts "Dec 27", "Dec 27 – 28" (same month) and "Dec 30 – Jan 2"
/// (end month before start month rolls the end into `year + 1`).
/// Any malformed part yields an empty result.
pub fn parse_date_range(text: &str, year: i32) -> Vec<NaiveDate> {
    let clean = text.replace(['–', '—'], "-");
    let parts: Vec<&str> = clean.split('-').map(str::trim).collect();

    let Some(start) = parts.first().and_then(|p| parse_month_day(p, year, None)) else {
        ::log::debug!("Could not parse date range start: {:?}", text);
        return Vec::new();
    };

    let mut end = parts
        .get(1)
        .and_then(|p| parse_month_day(p, year, Some(start.month())))
        .unwrap_or(start);

    if end.month() < start.month() {
        match end.with_year(year + 1) {
            Some(rolled) => end = rolled,
            None => return Vec::new(),
        }
    }

    expand_range(start, end)
}

fn parse_month_day(part: &str, year: i32, inherited_month: Option<u32>) -> Option<NaiveDate> {
    if let Some(caps) = MONTH_DAY.captures(part) {
        let month = month_from_name(&caps[1])?;
        let day = caps[2].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if DAY_ONLY.is_match(part) {
        let day = part.parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, inherited_month?, day);
    }
    None
}

/// True when any date falls on a Friday, Saturday or Sunday
pub fn has_weekend(dates: &[NaiveDate]) -> bool {
    dates
        .iter()
        .any(|d| matches!(d.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun))
}

/// A calendar month used to scope availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthTag {
    pub year: i32,
    pub month: u32,
}

impl MonthTag {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for MonthTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses a month heading such as "December 2024"
pub fn parse_month_heading(text: &str) -> Option<MonthTag> {
    let caps = MONTH_HEADING.captures(text)?;
    let month = month_from_name(&caps[1])?;
    let year = caps[2].parse::<i32>().ok()?;
    Some(MonthTag { year, month })
}

/// Parses the date a calendar grid cell stands for, e.g. "Saturday, December 28, 2024"
///
/// When the label carries no year the date is placed in the year that keeps
/// it closest to `today` going forward: months earlier than today's month
/// belong to next year.
pub fn parse_cell_date(label: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = CELL_DATE.captures(label)?;
    let month = month_from_name(&caps[1])?;
    let day = caps[2].parse::<u32>().ok()?;
    let year = match caps.get(3) {
        Some(y) => y.as_str().parse::<i32>().ok()?,
        None if month < today.month() => today.year() + 1,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
