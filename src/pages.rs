use serde::{Deserialize, Serialize};
use url::Url;

/// Which section of the host application is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    /// Multi-calendar pricing view
    Calendar,
    /// Listings overview
    Listing,
    /// Listing editor (details, amenities, policies)
    ListingEditor,
    /// Guest inbox
    Messages,
    /// Anything else (dashboard, settings, ...)
    #[default]
    Unknown,
}

impl PageType {
    /// The observer/panel section serving this page type
    pub fn section(&self) -> Option<Section> {
        match self {
            PageType::Calendar => Some(Section::Calendar),
            PageType::Listing | PageType::ListingEditor => Some(Section::Listing),
            PageType::Messages => Some(Section::Message),
            PageType::Unknown => None,
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PageType::Calendar => "calendar",
            PageType::Listing => "listing",
            PageType::ListingEditor => "listing-editor",
            PageType::Messages => "messages",
            PageType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One slice of the shared context, with its own observer, panel and signature
///
/// Listing overview and listing editor share the `Listing` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Calendar,
    Listing,
    Message,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Calendar, Section::Listing, Section::Message];

    /// Page type the section's panel is addressed by
    pub fn page_type(&self) -> PageType {
        match self {
            Section::Calendar => PageType::Calendar,
            Section::Listing => PageType::Listing,
            Section::Message => PageType::Messages,
        }
    }

    /// Whether `page` is served by this section
    pub fn serves(&self, page: PageType) -> bool {
        page.section() == Some(*self)
    }
}

/// A single ordered classification rule: a path containing `pattern` maps to `page_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRule {
    pub pattern: String,
    pub page_type: PageType,
}

impl PageRule {
    pub fn new(pattern: &str, page_type: PageType) -> Self {
        Self {
            pattern: pattern.to_string(),
            page_type,
        }
    }
}

/// Default rule order; more specific paths come first
pub fn default_page_rules() -> Vec<PageRule> {
    vec![
        PageRule::new("/multicalendar", PageType::Calendar),
        PageRule::new("/hosting/listings/editor", PageType::ListingEditor),
        PageRule::new("/hosting/listings", PageType::Listing),
        PageRule::new("/hosting/messages", PageType::Messages),
    ]
}

/// Classifies a navigation location, first matching rule wins
///
/// Only the path is inspected when `location` parses as a URL, so query
/// strings and fragments cannot trigger a rule; bare paths are matched
/// as given.
pub fn classify(location: &str, rules: &[PageRule]) -> PageType {
    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => location.to_string(),
    };

    for rule in rules {
        if path.contains(&rule.pattern) {
            ::log::debug!("Classifying as {}: {}", rule.page_type, location);
            return rule.page_type;
        }
    }

    ::log::debug!("Classifying as unknown: {}", location);
    PageType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification() {
        let rules = default_page_rules();
        let cases = [
            ("https://host.example/multicalendar/123", PageType::Calendar),
            (
                "https://host.example/multicalendar/123/edit-selected-dates/2024-12-27",
                PageType::Calendar,
            ),
            (
                "https://host.example/hosting/listings/editor/42/details/amenities",
                PageType::ListingEditor,
            ),
            ("https://host.example/hosting/listings", PageType::Listing),
            ("https://host.example/hosting/messages/thread/9", PageType::Messages),
            ("https://host.example/hosting", PageType::Unknown),
            ("/hosting/listings/editor/1", PageType::ListingEditor),
        ];

        for (location, expected) in cases {
            assert_eq!(classify(location, &rules), expected, "location {}", location);
        }
    }

    #[test]
    fn test_query_string_does_not_classify() {
        let rules = default_page_rules();
        assert_eq!(
            classify("https://host.example/hosting?next=/hosting/messages", &rules),
            PageType::Unknown
        );
    }

    #[test]
    fn test_rule_order_is_respected() {
        // Generic rule first shadows the editor rule
        let rules = vec![
            PageRule::new("/hosting/listings", PageType::Listing),
            PageRule::new("/hosting/listings/editor", PageType::ListingEditor),
        ];
        assert_eq!(
            classify("https://host.example/hosting/listings/editor/1", &rules),
            PageType::Listing
        );
    }

    #[test]
    fn test_sections() {
        assert_eq!(PageType::ListingEditor.section(), Some(Section::Listing));
        assert_eq!(PageType::Unknown.section(), None);
        assert!(Section::Listing.serves(PageType::Listing));
        assert!(!Section::Calendar.serves(PageType::Messages));
        assert_eq!(Section::Message.page_type(), PageType::Messages);
    }

    #[test]
    fn test_page_type_serde_names() {
        let json = serde_json::to_string(&PageType::ListingEditor).unwrap();
        assert_eq!(json, "\"listing-editor\"");
        assert_eq!(PageType::ListingEditor.to_string(), "listing-editor");
    }
}
