use super::{ExtractEnv, Extractor};
use crate::parsers::geo::{self, Coordinates};
use crate::parsers::html;
use crate::parsers::text::{self, char_len, dedup_preserving_order};
use crate::results::{ListingRecord, Location};
use std::collections::BTreeMap;

/// Text fields of a listing record that extractors fill directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    PropertyType,
    Pricing,
    Availability,
    NumberOfGuests,
    Description,
    HouseRules,
    GuestSafety,
    CancellationPolicy,
    AboutHost,
    CoHosts,
    BookingSettings,
    CustomLink,
}

impl TextField {
    fn slot(self, record: &mut ListingRecord) -> &mut Option<String> {
        match self {
            TextField::Title => &mut record.title,
            TextField::PropertyType => &mut record.property_type,
            TextField::Pricing => &mut record.pricing,
            TextField::Availability => &mut record.availability,
            TextField::NumberOfGuests => &mut record.number_of_guests,
            TextField::Description => &mut record.description,
            TextField::HouseRules => &mut record.house_rules,
            TextField::GuestSafety => &mut record.guest_safety,
            TextField::CancellationPolicy => &mut record.cancellation_policy,
            TextField::AboutHost => &mut record.about_host,
            TextField::CoHosts => &mut record.co_hosts,
            TextField::BookingSettings => &mut record.booking_settings,
            TextField::CustomLink => &mut record.custom_link,
        }
    }
}

/// Overview fields and their selectors, first match wins
const OVERVIEW_FIELDS: &[(TextField, &[&str])] = &[
    (TextField::Title, &[r#"[data-testid="listing-title"]"#, "h1"]),
    (TextField::PropertyType, &[r#"[data-testid="property-type"]"#]),
    (TextField::Pricing, &[r#"[data-testid="price"]"#]),
    (TextField::Availability, &[r#"[data-testid="availability-status"]"#]),
    (TextField::NumberOfGuests, &[r#"[data-testid="guest-capacity"]"#]),
];

const OVERVIEW_LOCATION: &str = r#"[data-testid="listing-location"]"#;

/// Editor card labels per field
const EDITOR_LABELS: &[(TextField, &str)] = &[
    (TextField::Title, "Title"),
    (TextField::PropertyType, "Property type"),
    (TextField::Pricing, "Pricing"),
    (TextField::Availability, "Availability"),
    (TextField::NumberOfGuests, "Number of guests"),
    (TextField::Description, "Description"),
    (TextField::HouseRules, "House rules"),
    (TextField::GuestSafety, "Guest safety"),
    (TextField::CancellationPolicy, "Cancellation policy"),
    (TextField::AboutHost, "About the host"),
    (TextField::CoHosts, "Co-hosts"),
    (TextField::BookingSettings, "Booking settings"),
    (TextField::CustomLink, "Custom link"),
];

const LOCATION_LABEL: &str = "Location";
const AMENITIES_LABEL: &str = "Amenities";
const AMENITIES_PATH: &str = "/details/amenities";
const VALUE_SEPARATOR: &str = " | ";

type AmenityStrategy = fn(&ExtractEnv<'_>, &[Card]) -> Vec<String>;
type CoordinateStrategy = fn(&ExtractEnv<'_>) -> Option<Coordinates>;

const AMENITY_STRATEGIES: &[(&str, AmenityStrategy)] = &[
    ("amenities-page", amenities_from_rows),
    ("summary-card", amenities_from_summary),
];

const COORDINATE_STRATEGIES: &[(&str, CoordinateStrategy)] = &[
    ("map-image", coordinates_from_map_image),
    ("map-link", coordinates_from_map_link),
];

/// Reads the listings overview through tagged elements
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingOverviewExtractor;

impl Extractor for ListingOverviewExtractor {
    type Output = ListingRecord;

    fn name(&self) -> &'static str {
        "listing-overview"
    }

    fn extract(&self, env: &ExtractEnv<'_>) -> Option<ListingRecord> {
        let mut record = ListingRecord::default();
        for (field, selectors) in OVERVIEW_FIELDS {
            *field.slot(&mut record) = selectors.iter().find_map(|css| env.dom.text_of(css));
        }
        record.location = env.dom.text_of(OVERVIEW_LOCATION).map(Location::Text);
        record.source = Some(self.name().to_string());
        record.extracted_at = Some(env.now);
        Some(record)
    }
}

/// Reads the listing editor's label/value cards, amenities and map
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingEditorExtractor;

impl Extractor for ListingEditorExtractor {
    type Output = ListingRecord;

    fn name(&self) -> &'static str {
        "listing-editor"
    }

    fn extract(&self, env: &ExtractEnv<'_>) -> Option<ListingRecord> {
        let cards = cards(env);

        let mut record = ListingRecord::default();
        for (field, label) in EDITOR_LABELS {
            *field.slot(&mut record) = value_by_label(&cards, label);
        }
        record.location = location(env, &cards);
        record.amenities = AMENITY_STRATEGIES
            .iter()
            .map(|(name, strategy)| (name, strategy(env, &cards)))
            .find(|(_, found)| !found.is_empty())
            .map(|(name, found)| {
                ::log::trace!("{} amenities from {}", found.len(), name);
                found
            })
            .unwrap_or_default();
        record.extra_details = extra_details(env, &cards);
        record.source = Some(self.name().to_string());
        record.extracted_at = Some(env.now);
        Some(record)
    }
}

/// A block element's rendered text split into lines
struct Card {
    lines: Vec<String>,
    len: usize,
}

fn cards(env: &ExtractEnv<'_>) -> Vec<Card> {
    env.dom
        .select("div, section")
        .into_iter()
        .filter(|el| !env.in_panel(*el))
        .filter_map(|el| {
            let rendered = html::inner_text(el);
            if rendered.is_empty() {
                return None;
            }
            Some(Card {
                lines: text::lines(&rendered).into_iter().map(str::to_string).collect(),
                len: char_len(&rendered),
            })
        })
        .collect()
}

/// Value of the innermost card whose first line is `label`
///
/// The remaining lines are joined with `" | "`.
fn value_by_label(cards: &[Card], label: &str) -> Option<String> {
    let target = label.to_lowercase();
    cards
        .iter()
        .filter(|card| card.lines.len() > 1)
        .filter(|card| label_matches(&card.lines[0].to_lowercase(), &target))
        .min_by_key(|card| card.len)
        .map(|card| card.lines[1..].join(VALUE_SEPARATOR))
}

/// Whether a lower-cased card label is `target` or starts with it as a whole word
fn label_matches(label: &str, target: &str) -> bool {
    label
        .strip_prefix(target)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

/// Icon-bearing single-line rows on the dedicated amenities page
fn amenities_from_rows(env: &ExtractEnv<'_>, _cards: &[Card]) -> Vec<String> {
    if !env.path().contains(AMENITIES_PATH) {
        return Vec::new();
    }

    let Some(section) = env
        .dom
        .select("section, div")
        .into_iter()
        .filter(|el| !env.in_panel(*el) && html::has_descendant(*el, "svg"))
        .map(|el| (el, html::inner_text(el)))
        .filter(|(_, rendered)| rendered.starts_with(AMENITIES_LABEL))
        .min_by_key(|(_, rendered)| char_len(rendered))
        .map(|(el, _)| el)
    else {
        return Vec::new();
    };

    let chrome = &env.rules.set.amenity_chrome;
    let rows = html::select_within(section, "div")
        .into_iter()
        .filter(|row| html::has_descendant(*row, "svg"))
        .map(html::inner_text)
        .filter(|row| {
            let len = char_len(row);
            len > 2 && len < 40 && !row.contains('\n') && !chrome.iter().any(|c| row.contains(c.as_str()))
        });
    dedup_preserving_order(rows)
}

/// Lines of the "Amenities" summary card on the main editor page
fn amenities_from_summary(env: &ExtractEnv<'_>, cards: &[Card]) -> Vec<String> {
    let chrome = &env.rules.set.summary_chrome;
    let Some(card) = cards
        .iter()
        .filter(|card| card.lines.len() > 1 && card.lines[0] == AMENITIES_LABEL)
        .min_by_key(|card| card.len)
    else {
        return Vec::new();
    };

    let lines = card.lines[1..]
        .iter()
        .filter(|line| char_len(line) > 2 && !chrome.iter().any(|c| c == *line))
        .cloned();
    dedup_preserving_order(lines)
}

fn coordinates_from_map_image(env: &ExtractEnv<'_>) -> Option<Coordinates> {
    let img = env.dom.first(r#"img[src*="maps.googleapis"]"#)?;
    geo::coordinates_from_map_image(html::attr(img, "src")?)
}

fn coordinates_from_map_link(env: &ExtractEnv<'_>) -> Option<Coordinates> {
    let link = env.dom.first(r#"a[href*="maps.google"]"#)?;
    geo::coordinates_from_map_link(html::attr(link, "href")?)
}

/// Map alt text, when it is long enough to be an address
fn map_caption(env: &ExtractEnv<'_>) -> Option<String> {
    let img = env.dom.first(r#"img[src*="maps.googleapis"]"#)?;
    html::attr(img, "alt")
        .map(str::trim)
        .filter(|alt| char_len(alt) > 5)
        .map(str::to_string)
}

fn location(env: &ExtractEnv<'_>, cards: &[Card]) -> Option<Location> {
    let coords = COORDINATE_STRATEGIES.iter().find_map(|(name, strategy)| {
        let found = strategy(env)?;
        ::log::trace!("Listing coordinates from {}", name);
        Some(found)
    });
    let text = map_caption(env).or_else(|| value_by_label(cards, LOCATION_LABEL));
    Location::from_parts(coords, text)
}

/// Label/value cards that no known field claimed
fn extra_details(env: &ExtractEnv<'_>, cards: &[Card]) -> BTreeMap<String, String> {
    let skip: Vec<String> = env
        .rules
        .set
        .detail_skip_labels
        .iter()
        .map(|s| s.to_lowercase())
        .collect();

    let mut details = BTreeMap::new();
    for card in cards {
        if card.lines.len() < 2 || card.len <= 5 || card.len >= 5000 {
            continue;
        }
        let label = &card.lines[0];
        let label_len = char_len(label);
        if label_len <= 2 || label_len >= 60 {
            continue;
        }
        let lower = label.to_lowercase();
        if skip.iter().any(|s| label_matches(&lower, s)) {
            continue;
        }
        // Cards are visited outer to inner, so the most specific value wins
        details.insert(label.clone(), card.lines[1..].join(VALUE_SEPARATOR));
    }
    details
}
