use crate::pages::PageType;
use crate::parsers::geo::Coordinates;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pricing and date selection read from the calendar view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecord {
    /// Selected dates, chronological
    pub selected_dates: Vec<NaiveDate>,

    /// Bookable dates on or after today, scoped to the active month when known
    pub available_dates: Vec<NaiveDate>,

    /// Current nightly price
    pub base_price: Option<u64>,

    /// Pre-discount price; always strictly greater than `base_price` when present
    pub original_price: Option<u64>,

    /// Whether any selected date is a Friday, Saturday or Sunday
    pub has_weekend: bool,
}

/// A listing location: either free text or map coordinates with optional text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Geo {
        lat: f64,
        lng: f64,
        text: Option<String>,
    },
    Text(String),
}

impl Location {
    pub fn from_parts(coords: Option<Coordinates>, text: Option<String>) -> Option<Self> {
        match (coords, text) {
            (Some(c), text) => Some(Location::Geo {
                lat: c.lat,
                lng: c.lng,
                text,
            }),
            (None, Some(text)) => Some(Location::Text(text)),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Text(text) => f.write_str(text),
            Location::Geo {
                lat,
                lng,
                text: Some(text),
            } => write!(f, "{} ({}, {})", text, lat, lng),
            Location::Geo { lat, lng, text: None } => write!(f, "{}, {}", lat, lng),
        }
    }
}

/// Listing metadata from the overview or the editor
///
/// Every field is optional: `None` means "not found on the page", which is
/// distinct from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub title: Option<String>,
    pub property_type: Option<String>,
    pub pricing: Option<String>,
    pub availability: Option<String>,
    pub number_of_guests: Option<String>,
    pub description: Option<String>,
    pub house_rules: Option<String>,
    pub guest_safety: Option<String>,
    pub cancellation_policy: Option<String>,
    pub location: Option<Location>,
    pub about_host: Option<String>,
    pub co_hosts: Option<String>,
    pub booking_settings: Option<String>,
    pub custom_link: Option<String>,

    /// Amenity names, deduplicated
    #[serde(default)]
    pub amenities: Vec<String>,

    /// Label/value blocks that did not match a known field
    #[serde(default)]
    pub extra_details: BTreeMap<String, String>,

    /// Which extractor produced the record
    pub source: Option<String>,

    pub extracted_at: Option<DateTime<Utc>>,
}

/// The conversation currently open in the inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub guest_name: String,
    pub last_message: String,
    pub full_chat: String,
    pub previous_chat: String,
    pub extracted_at: DateTime<Utc>,
}

/// Location and freshness of the context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub current_url: Option<String>,
    pub last_update_timestamp: Option<DateTime<Utc>>,
}

/// Root state container shared by every extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    /// Set exclusively by the router
    pub page_type: PageType,
    pub calendar: Option<CalendarRecord>,
    pub listing: Option<ListingRecord>,
    pub message: Option<MessageRecord>,
    pub meta: Meta,
}

impl PageContext {
    /// Whether the cached record for `page` holds its primary key
    pub fn has_cached(&self, page: PageType) -> bool {
        match page {
            PageType::Calendar => self.calendar.as_ref().is_some_and(|c| c.base_price.is_some()),
            PageType::Listing | PageType::ListingEditor => {
                self.listing.as_ref().is_some_and(|l| l.title.is_some())
            }
            PageType::Messages => self
                .message
                .as_ref()
                .is_some_and(|m| !m.last_message.is_empty()),
            PageType::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_parts() {
        let coords = Coordinates {
            lat: 10.05,
            lng: 76.54,
        };
        assert_eq!(
            Location::from_parts(Some(coords), None),
            Some(Location::Geo {
                lat: 10.05,
                lng: 76.54,
                text: None
            })
        );
        assert_eq!(
            Location::from_parts(None, Some("Kochi, Kerala".to_string())),
            Some(Location::Text("Kochi, Kerala".to_string()))
        );
        assert_eq!(Location::from_parts(None, None), None);
    }

    #[test]
    fn test_location_display() {
        let geo = Location::Geo {
            lat: 10.05,
            lng: 76.54,
            text: Some("Kochi".to_string()),
        };
        assert_eq!(geo.to_string(), "Kochi (10.05, 76.54)");
    }

    #[test]
    fn test_calendar_serializes_iso_dates() {
        let record = CalendarRecord {
            selected_dates: vec![NaiveDate::from_ymd_opt(2024, 12, 28).unwrap()],
            base_price: Some(2000),
            ..CalendarRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["selectedDates"][0], "2024-12-28");
        assert_eq!(json["basePrice"], 2000);
        assert_eq!(json["originalPrice"], serde_json::Value::Null);
    }

    #[test]
    fn test_has_cached() {
        let mut ctx = PageContext::default();
        assert!(!ctx.has_cached(PageType::Calendar));
        ctx.listing = Some(ListingRecord {
            title: Some("Cabin".to_string()),
            ..ListingRecord::default()
        });
        assert!(ctx.has_cached(PageType::ListingEditor));
        assert!(!ctx.has_cached(PageType::Unknown));
    }
}
