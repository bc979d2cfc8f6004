use crate::results::{CalendarRecord, ListingRecord, MessageRecord, PageContext};
use chrono::SecondsFormat;

/// First line of every consolidated context text
pub const HEADER: &str = "--- HOST CONTEXT CONSOLIDATED DATA ---";

const NOT_AVAILABLE: &str = "N/A";

/// Deterministic plain-text rendering of the whole context
///
/// Section order, key names and quoting are stable: the text is used
/// verbatim as prompt context and as the export file's content.
pub fn consolidated_text(ctx: &PageContext) -> String {
    let mut lines = vec![HEADER.to_string(), String::new()];

    lines.push("[CALENDAR]".to_string());
    match ctx.calendar.as_ref().filter(|c| c.base_price.is_some()) {
        Some(calendar) => calendar_lines(calendar, &mut lines),
        None => lines.push("No calendar data extracted yet.".to_string()),
    }
    lines.push(String::new());

    lines.push("[LISTING]".to_string());
    match ctx.listing.as_ref().filter(|l| l.title.is_some()) {
        Some(listing) => listing_lines(listing, &mut lines),
        None => lines.push("No listing data extracted yet.".to_string()),
    }
    lines.push(String::new());

    lines.push("[MESSAGE]".to_string());
    match ctx.message.as_ref().filter(|m| !m.last_message.is_empty()) {
        Some(message) => message_lines(message, &mut lines),
        None => lines.push("No message data extracted yet.".to_string()),
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn json_array<T: serde::Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn calendar_lines(calendar: &CalendarRecord, lines: &mut Vec<String>) {
    let price = |p: Option<u64>| p.map_or_else(|| NOT_AVAILABLE.to_string(), |p| p.to_string());
    lines.push(format!("basePrice: {}", price(calendar.base_price)));
    lines.push(format!("originalPrice: {}", price(calendar.original_price)));
    lines.push(format!("hasWeekend: {}", calendar.has_weekend));
    lines.push(format!("selectedDates: {}", json_array(&calendar.selected_dates)));
    lines.push(format!("availableDates: {}", json_array(&calendar.available_dates)));
}

fn listing_lines(listing: &ListingRecord, lines: &mut Vec<String>) {
    let location = listing.location.as_ref().map(ToString::to_string);
    let fields: [(&str, Option<&str>); 14] = [
        ("title", listing.title.as_deref()),
        ("propertyType", listing.property_type.as_deref()),
        ("pricing", listing.pricing.as_deref()),
        ("availability", listing.availability.as_deref()),
        ("numberOfGuests", listing.number_of_guests.as_deref()),
        ("description", listing.description.as_deref()),
        ("houseRules", listing.house_rules.as_deref()),
        ("guestSafety", listing.guest_safety.as_deref()),
        ("cancellationPolicy", listing.cancellation_policy.as_deref()),
        ("location", location.as_deref()),
        ("aboutHost", listing.about_host.as_deref()),
        ("coHosts", listing.co_hosts.as_deref()),
        ("bookingSettings", listing.booking_settings.as_deref()),
        ("customLink", listing.custom_link.as_deref()),
    ];
    for (key, value) in fields {
        lines.push(format!("{}: \"{}\"", key, value.unwrap_or(NOT_AVAILABLE)));
    }
    lines.push(format!("amenities: {}", json_array(&listing.amenities)));
    for (label, value) in &listing.extra_details {
        lines.push(format!("{}: \"{}\"", label, value));
    }
    lines.push(format!(
        "source: \"{}\"",
        listing.source.as_deref().unwrap_or(NOT_AVAILABLE)
    ));
}

fn message_lines(message: &MessageRecord, lines: &mut Vec<String>) {
    let guest = if message.guest_name.is_empty() {
        "Guest"
    } else {
        message.guest_name.as_str()
    };
    lines.push(format!("guestName: \"{}\"", guest));
    lines.push(format!("lastMessage: \"{}\"", message.last_message));
    lines.push("fullChat:".to_string());
    lines.push(if message.full_chat.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        message.full_chat.clone()
    });
    lines.push(format!(
        "extractedAt: \"{}\"",
        message.extracted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Location;
    use chrono::{DateTime, NaiveDate, Utc};

    #[test]
    fn test_empty_context() {
        let text = consolidated_text(&PageContext::default());
        assert_eq!(
            text,
            "--- HOST CONTEXT CONSOLIDATED DATA ---\n\n\
             [CALENDAR]\nNo calendar data extracted yet.\n\n\
             [LISTING]\nNo listing data extracted yet.\n\n\
             [MESSAGE]\nNo message data extracted yet.\n"
        );
    }

    #[test]
    fn test_calendar_section() {
        let ctx = PageContext {
            calendar: Some(CalendarRecord {
                selected_dates: vec![
                    NaiveDate::from_ymd_opt(2024, 12, 27).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 12, 28).unwrap(),
                ],
                available_dates: vec![],
                base_price: Some(2000),
                original_price: None,
                has_weekend: true,
            }),
            ..PageContext::default()
        };
        let text = consolidated_text(&ctx);
        assert!(text.contains(
            "[CALENDAR]\nbasePrice: 2000\noriginalPrice: N/A\nhasWeekend: true\n\
             selectedDates: [\"2024-12-27\",\"2024-12-28\"]\navailableDates: []\n"
        ));
    }

    #[test]
    fn test_calendar_without_price_is_a_placeholder() {
        let ctx = PageContext {
            calendar: Some(CalendarRecord::default()),
            ..PageContext::default()
        };
        assert!(consolidated_text(&ctx).contains("No calendar data extracted yet."));
    }

    #[test]
    fn test_listing_section_order() {
        let mut listing = ListingRecord {
            title: Some("Cosy cabin".to_string()),
            location: Some(Location::Text("Kochi".to_string())),
            amenities: vec!["Wifi".to_string()],
            source: Some("listing-editor".to_string()),
            ..ListingRecord::default()
        };
        listing
            .extra_details
            .insert("Check-in window".to_string(), "2 PM - 8 PM".to_string());
        let ctx = PageContext {
            listing: Some(listing),
            ..PageContext::default()
        };
        let text = consolidated_text(&ctx);
        let section: Vec<&str> = text
            .split("[LISTING]\n")
            .nth(1)
            .unwrap()
            .split("\n\n")
            .next()
            .unwrap()
            .lines()
            .collect();
        assert_eq!(section[0], "title: \"Cosy cabin\"");
        assert_eq!(section[1], "propertyType: \"N/A\"");
        assert_eq!(section[9], "location: \"Kochi\"");
        assert_eq!(section[14], "amenities: [\"Wifi\"]");
        assert_eq!(section[15], "Check-in window: \"2 PM - 8 PM\"");
        assert_eq!(section[16], "source: \"listing-editor\"");
        assert_eq!(section.len(), 17);
    }

    #[test]
    fn test_message_section() {
        let ctx = PageContext {
            message: Some(MessageRecord {
                guest_name: "Nabhas".to_string(),
                last_message: "Can we check in early?".to_string(),
                full_chat: "Hi\n---\nCan we check in early?".to_string(),
                previous_chat: "Hi".to_string(),
                extracted_at: DateTime::parse_from_rfc3339("2024-12-20T10:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            }),
            ..PageContext::default()
        };
        let text = consolidated_text(&ctx);
        assert!(text.ends_with(
            "[MESSAGE]\nguestName: \"Nabhas\"\nlastMessage: \"Can we check in early?\"\n\
             fullChat:\nHi\n---\nCan we check in early?\n\
             extractedAt: \"2024-12-20T10:00:00.000Z\"\n"
        ));
    }
}
