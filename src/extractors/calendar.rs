use super::{ExtractEnv, Extractor};
use crate::parsers::dates::{self, MonthTag};
use crate::parsers::html;
use crate::parsers::price::{PriceQuote, quote_from_text};
use crate::parsers::text::char_len;
use crate::results::CalendarRecord;
use chrono::{Datelike, NaiveDate};
use scraper::ElementRef;

type PriceStrategy = fn(&ExtractEnv<'_>) -> Option<PriceQuote>;
type DateStrategy = fn(&ExtractEnv<'_>) -> Vec<NaiveDate>;

/// Price strategies, tried in order until one yields a quote
const PRICE_STRATEGIES: &[(&str, PriceStrategy)] = &[
    ("labelled-card", price_from_labelled_card),
    ("leading-amount", price_from_leading_amount),
];

/// Selected-date strategies, tried in order until one yields dates
const DATE_STRATEGIES: &[(&str, DateStrategy)] = &[
    ("location", dates_from_location),
    ("date-pill", dates_from_pill),
];

const PRICE_CONTAINERS: &str = "div, section, aside, span";
const DATE_PILLS: &str = "div, button";
const GRID_CELLS: &str = r#"[role="gridcell"], [role="button"][aria-label], button, td"#;
const MONTH_HEADINGS: &str = r#"h1, h2, h3, h4, [role="heading"]"#;
const UNAVAILABLE_MARKERS: &[&str] = &["blocked", "unavailable"];

/// Result of one calendar polling attempt
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarAttempt {
    pub record: CalendarRecord,
    /// Month the availability scan was scoped to, when one could be determined
    pub active_month: Option<MonthTag>,
}

impl CalendarAttempt {
    /// Whether polling may stop
    pub fn is_complete(&self) -> bool {
        self.record.base_price.is_some()
    }
}

/// Reads price, selection and availability from the multi-calendar view
#[derive(Debug, Default, Clone, Copy)]
pub struct CalendarExtractor;

impl Extractor for CalendarExtractor {
    type Output = CalendarAttempt;

    fn name(&self) -> &'static str {
        "calendar"
    }

    fn extract(&self, env: &ExtractEnv<'_>) -> Option<CalendarAttempt> {
        let quote = PRICE_STRATEGIES.iter().find_map(|(name, strategy)| {
            let quote = strategy(env)?;
            ::log::trace!("Calendar price from {}: {:?}", name, quote);
            Some(quote)
        });

        let selected_dates = DATE_STRATEGIES
            .iter()
            .map(|(name, strategy)| (name, strategy(env)))
            .find(|(_, dates)| !dates.is_empty())
            .map(|(name, dates)| {
                ::log::trace!("Calendar dates from {}: {} day(s)", name, dates.len());
                dates
            })
            .unwrap_or_default();

        let active_month = selected_dates
            .first()
            .copied()
            .map(MonthTag::of)
            .or_else(|| visible_month(env));
        let available_dates = available_dates(env, active_month);

        Some(CalendarAttempt {
            record: CalendarRecord {
                has_weekend: dates::has_weekend(&selected_dates),
                selected_dates,
                available_dates,
                base_price: quote.map(|q| q.base),
                original_price: quote.and_then(|q| q.original),
            },
            active_month,
        })
    }
}

/// Smallest container holding both a price label and a currency amount
fn price_from_labelled_card(env: &ExtractEnv<'_>) -> Option<PriceQuote> {
    let labels = &env.rules.set.price_labels;
    let currency = &env.rules.currency;

    let text = env
        .dom
        .select(PRICE_CONTAINERS)
        .into_iter()
        .filter(|el| !env.in_panel(*el))
        .map(html::inner_text)
        .filter(|text| labels.iter().any(|l| text.contains(l.as_str())) && currency.is_match(text))
        .min_by_key(|text| char_len(text))?;

    quote_from_text(currency, &text)
}

/// First span whose text starts with a currency amount, as seen on grid cells
fn price_from_leading_amount(env: &ExtractEnv<'_>) -> Option<PriceQuote> {
    let currency = &env.rules.currency;
    env.dom
        .select("span")
        .into_iter()
        .filter(|el| !env.in_panel(*el))
        .map(html::inner_text)
        .find(|text| currency.starts_with_amount(text))
        .and_then(|text| currency.first_amount(&text))
        .map(|base| PriceQuote { base, original: None })
}

fn dates_from_location(env: &ExtractEnv<'_>) -> Vec<NaiveDate> {
    dates::dates_from_url(env.location)
}

fn dates_from_pill(env: &ExtractEnv<'_>) -> Vec<NaiveDate> {
    env.dom
        .select(DATE_PILLS)
        .into_iter()
        .filter(|el| !env.in_panel(*el))
        .map(html::inner_text)
        .find(|text| dates::looks_like_date_pill(text))
        .map(|text| dates::parse_date_range(&text, env.today.year()))
        .unwrap_or_default()
}

/// Month heading closest to the top of the visible calendar
///
/// Headings with layout information rank by offset; headings without it
/// rank after them in document order.
fn visible_month(env: &ExtractEnv<'_>) -> Option<MonthTag> {
    let max_offset = env.rules.set.month_heading_max_offset;
    env.dom
        .select(MONTH_HEADINGS)
        .into_iter()
        .enumerate()
        .filter_map(|(index, el)| {
            let month = dates::parse_month_heading(&html::inner_text(el))?;
            let rank = match html::offset_top(el) {
                Some(top) if (0.0..max_offset).contains(&top) => (0, top as i64),
                Some(_) => return None,
                None => (1, index as i64),
            };
            Some((rank, month))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, month)| month)
}

fn available_dates(env: &ExtractEnv<'_>, active_month: Option<MonthTag>) -> Vec<NaiveDate> {
    let mut found: Vec<NaiveDate> = env
        .dom
        .select(GRID_CELLS)
        .into_iter()
        .filter(|el| !env.in_panel(*el) && !is_unavailable(env, *el))
        .filter_map(|el| {
            let label = html::attr(el, "aria-label")
                .map(str::to_string)
                .unwrap_or_else(|| html::inner_text(el));
            dates::parse_cell_date(&label, env.today)
        })
        .filter(|date| *date >= env.today)
        .filter(|date| active_month.is_none_or(|m| m.contains(*date)))
        .collect();

    found.sort();
    found.dedup();
    found
}

/// Disabled, blocked, or greyed-out grid cells
fn is_unavailable(env: &ExtractEnv<'_>, cell: ElementRef<'_>) -> bool {
    if html::attr(cell, "disabled").is_some()
        || html::attr(cell, "aria-disabled") == Some("true")
        || html::attr(cell, "data-is-blocked") == Some("true")
    {
        return true;
    }

    let marked = ["aria-label", "class", "data-testid"].iter().any(|name| {
        html::attr(cell, name).is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            UNAVAILABLE_MARKERS.iter().any(|m| value.contains(m))
        })
    });
    if marked {
        return true;
    }

    // Day numbers are usually rendered one or two levels below the cell
    std::iter::once(cell)
        .chain(html::select_within(cell, "*"))
        .any(|el| {
            let style = html::style(el);
            style
                .opacity
                .is_some_and(|o| o < env.rules.set.min_available_opacity)
                || style
                    .color
                    .as_deref()
                    .is_some_and(|c| env.rules.set.is_unavailable_color(c))
        })
}
