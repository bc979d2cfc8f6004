use crate::pages::{PageRule, default_page_rules};
use crate::parsers::price::{CurrencyPattern, DEFAULT_CURRENCY_PATTERN};
use serde::{Deserialize, Serialize};

/// Every heuristic list the extractors consult
///
/// Kept as data so a page redesign on the host side is a configuration
/// change rather than a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruleset {
    /// Ordered page classification rules
    #[serde(default = "default_page_rules")]
    pub page_rules: Vec<PageRule>,

    /// Labels that mark the calendar's pricing card
    #[serde(default = "default_price_labels")]
    pub price_labels: Vec<String>,

    /// Currency amount pattern; capture group 1 holds the digits
    #[serde(default = "default_currency_pattern")]
    pub currency_pattern: String,

    /// Text colours the calendar uses for unavailable days
    #[serde(default = "default_unavailable_colors")]
    pub unavailable_colors: Vec<String>,

    /// Grid cells rendered below this opacity are unavailable
    #[serde(default = "default_min_available_opacity")]
    pub min_available_opacity: f64,

    /// Headings lower than this offset are outside the calendar's visible top region
    #[serde(default = "default_month_heading_max_offset")]
    pub month_heading_max_offset: f64,

    /// Row text fragments on the amenities page that are controls, not amenities
    #[serde(default = "default_amenity_chrome")]
    pub amenity_chrome: Vec<String>,

    /// Lines of the amenities summary card that are controls, not amenities
    #[serde(default = "default_summary_chrome")]
    pub summary_chrome: Vec<String>,

    /// Card labels excluded from the extra-details bucket
    #[serde(default = "default_detail_skip_labels")]
    pub detail_skip_labels: Vec<String>,

    /// Values the host page shows for fields that have not been filled in
    #[serde(default = "default_unset_placeholders")]
    pub unset_placeholders: Vec<String>,

    #[serde(default)]
    pub message: MessageRules,
}

/// Noise rules for chat text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRules {
    /// Lower-case fragments of system and UI text; any containing block is dropped
    #[serde(default = "default_system_phrases")]
    pub system_phrases: Vec<String>,

    /// UI strings dropped on exact match
    #[serde(default = "default_exact_chrome")]
    pub exact_chrome: Vec<String>,

    /// Words that, next to the guest's name, mark a role badge
    #[serde(default = "default_role_words")]
    pub role_words: Vec<String>,

    /// Lower-case fragments that are always kept
    #[serde(default = "default_force_accept")]
    pub force_accept: Vec<String>,

    /// Accessibility-link prefixes dropped wherever they appear
    #[serde(default = "default_leak_prefixes")]
    pub leak_prefixes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_price_labels() -> Vec<String> {
    strings(&[
        "New listing price",
        "Nightly price",
        "Base price",
        "Price per night",
    ])
}

fn default_currency_pattern() -> String {
    DEFAULT_CURRENCY_PATTERN.to_string()
}

fn default_unavailable_colors() -> Vec<String> {
    strings(&[
        "rgb(176,176,176)",
        "rgb(221,221,221)",
        "rgb(235,235,235)",
        "#b0b0b0",
        "#dddddd",
        "#ddd",
        "#ebebeb",
    ])
}

fn default_min_available_opacity() -> f64 {
    0.5
}

fn default_month_heading_max_offset() -> f64 {
    500.0
}

fn default_amenity_chrome() -> Vec<String> {
    strings(&["View", "Showcase", "Skip", "Switch"])
}

fn default_summary_chrome() -> Vec<String> {
    strings(&["Amenities", "Edit", "View"])
}

fn default_detail_skip_labels() -> Vec<String> {
    strings(&[
        "Title",
        "Property type",
        "Pricing",
        "Availability",
        "Number of guests",
        "Description",
        "House rules",
        "Guest safety",
        "Cancellation policy",
        "Location",
        "About the host",
        "Co-hosts",
        "Booking settings",
        "Custom link",
        "Amenities",
        "Edit",
        "View",
        "Listing editor",
        "Your space",
        "Arrival guide",
    ])
}

fn default_unset_placeholders() -> Vec<String> {
    strings(&["Not set", "N/A", "Add details", "None"])
}

fn default_system_phrases() -> Vec<String> {
    strings(&[
        "no trips yet",
        "joined airbnb",
        "listing no longer exists",
        "show profile",
        "report this guest",
        "visit the help centre",
        "aircover for hosts",
        "payment",
        "payout",
        "translation on",
        "translation off",
        "show reservation",
        "this could be your chance to host",
        "special offer",
        "show more topics",
        "reservation",
        "guest details",
        "resource centre",
        "airbnb",
        "what happens after you tap next",
        "check out",
        "learn more",
        "show details",
        "read conversation",
        "switch to travelling",
        "skip to content",
        "skip to",
    ])
}

fn default_exact_chrome() -> Vec<String> {
    strings(&[
        "Today",
        "Yesterday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
        "Calendar",
        "Listings",
        "Messages",
        "All",
        "Unread",
        "Superhost Ambassador",
        "Translate",
        "Original language",
        "Report",
        "Read Conversation",
        "Show details",
        "Edit",
        "Learn More",
        "Select Certificate",
        "Smartcard / Token User Pin",
        "Return to Inbox",
        "Write a message...",
        "Send",
        "Skip to Last Message (Ctrl-e)",
        "Skip to Typing Your Message (Ctrl-m)",
        "Enter",
        "Shift + Enter",
        "Guest",
        "Host",
    ])
}

fn default_role_words() -> Vec<String> {
    strings(&["booker"])
}

fn default_force_accept() -> Vec<String> {
    strings(&["enquiry sent", "guest, "])
}

fn default_leak_prefixes() -> Vec<String> {
    strings(&["Read Conversation with", "Skip to", "Switch to"])
}

impl Default for MessageRules {
    fn default() -> Self {
        Self {
            system_phrases: default_system_phrases(),
            exact_chrome: default_exact_chrome(),
            role_words: default_role_words(),
            force_accept: default_force_accept(),
            leak_prefixes: default_leak_prefixes(),
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            page_rules: default_page_rules(),
            price_labels: default_price_labels(),
            currency_pattern: default_currency_pattern(),
            unavailable_colors: default_unavailable_colors(),
            min_available_opacity: default_min_available_opacity(),
            month_heading_max_offset: default_month_heading_max_offset(),
            amenity_chrome: default_amenity_chrome(),
            summary_chrome: default_summary_chrome(),
            detail_skip_labels: default_detail_skip_labels(),
            unset_placeholders: default_unset_placeholders(),
            message: MessageRules::default(),
        }
    }
}

impl Ruleset {
    /// Whether `value` is blank or one of the host page's "not filled in" placeholders
    pub fn is_unset(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty()
            || self
                .unset_placeholders
                .iter()
                .any(|p| p.eq_ignore_ascii_case(value))
    }

    /// Whether a CSS colour value is one of the unavailable-day greys
    pub fn is_unavailable_color(&self, color: &str) -> bool {
        let compact: String = color
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        self.unavailable_colors.iter().any(|c| {
            c.chars()
                .filter(|ch| !ch.is_whitespace())
                .collect::<String>()
                .eq_ignore_ascii_case(&compact)
        })
    }
}

/// A ruleset with its patterns compiled, ready for the extractors
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub set: Ruleset,
    pub currency: CurrencyPattern,
}

impl CompiledRules {
    pub fn new(set: Ruleset) -> Result<Self, regex::Error> {
        let currency = CurrencyPattern::new(&set.currency_pattern)?;
        Ok(Self { set, currency })
    }
}

impl Default for CompiledRules {
    fn default() -> Self {
        Self::new(Ruleset::default()).expect("Default rules should compile")
    }
}
