use crate::pages::{PageType, Section};
use crate::parsers::dates::MonthTag;
use crate::parsers::text::{char_len, truncate_chars};
use crate::results::{CalendarRecord, ListingRecord, MessageRecord};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Characters of long listing fields that take part in the listing fingerprint
const SNIPPET_CHARS: usize = 80;

/// Deterministic digest of a record's salient fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Digests any serializable projection
    pub fn of<T: Serialize>(projection: &T) -> Self {
        // Projections are plain structs of strings and numbers; serialization cannot fail
        let bytes = serde_json::to_vec(projection).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Signature(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct CalendarProjection {
    base_price: Option<u64>,
    original_price: Option<u64>,
    selected_dates: Vec<String>,
    active_month: Option<String>,
}

/// Fingerprint of a calendar extraction
pub fn calendar_signature(record: &CalendarRecord, active_month: Option<MonthTag>) -> Signature {
    Signature::of(&CalendarProjection {
        base_price: record.base_price,
        original_price: record.original_price,
        selected_dates: record
            .selected_dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
        active_month: active_month.map(|m| m.to_string()),
    })
}

#[derive(Serialize)]
struct ListingProjection<'a> {
    page_type: PageType,
    title: Option<&'a str>,
    property_type: Option<&'a str>,
    pricing: Option<&'a str>,
    guests: Option<&'a str>,
    amenities_count: usize,
    description: Option<&'a str>,
    location: Option<String>,
}

/// Fingerprint of a listing extraction
///
/// Only a reduced projection takes part: whitespace churn deep inside long
/// descriptions or policies must not count as a change.
pub fn listing_signature(page_type: PageType, record: &ListingRecord) -> Signature {
    Signature::of(&ListingProjection {
        page_type,
        title: record.title.as_deref(),
        property_type: record.property_type.as_deref(),
        pricing: record.pricing.as_deref(),
        guests: record.number_of_guests.as_deref(),
        amenities_count: record.amenities.len(),
        description: record
            .description
            .as_deref()
            .map(|d| truncate_chars(d, SNIPPET_CHARS)),
        location: record
            .location
            .as_ref()
            .map(|l| truncate_chars(&l.to_string(), SNIPPET_CHARS).to_string()),
    })
}

#[derive(Serialize)]
struct MessageProjection<'a> {
    guest_name: &'a str,
    last_message: &'a str,
    full_chat_len: usize,
}

/// Fingerprint of a message extraction
pub fn message_signature(record: &MessageRecord) -> Signature {
    Signature::of(&MessageProjection {
        guest_name: &record.guest_name,
        last_message: &record.last_message,
        full_chat_len: char_len(&record.full_chat),
    })
}

/// Last accepted fingerprint per section
#[derive(Debug, Default)]
pub struct SignatureStore {
    last: HashMap<Section, Signature>,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `signature` for `section` and reports whether it differs from the last one
    ///
    /// Returns `false` (and keeps the stored value) when the fingerprint is unchanged.
    pub fn accept(&mut self, section: Section, signature: Signature) -> bool {
        if self.last.get(&section) == Some(&signature) {
            ::log::debug!("Unchanged {:?} fingerprint {}", section, signature);
            return false;
        }
        self.last.insert(section, signature);
        true
    }

    /// Last accepted fingerprint for `section`
    pub fn get(&self, section: Section) -> Option<&Signature> {
        self.last.get(&section)
    }

    /// Forgets every fingerprint so the next extraction is never suppressed
    pub fn reset(&mut self) {
        self.last.clear();
    }
}
