use crate::results::ListingRecord;
use crate::rules::Ruleset;

/// Field-level merge of a freshly extracted listing into the cached one
///
/// A new text field replaces the old value only when it is present and not
/// an "unset" placeholder; amenities are replaced only by a non-empty list.
/// Extra details accumulate, new labels winning. Provenance (`source`,
/// `extracted_at`) always comes from the new record.
pub fn merge_listing(old: Option<&ListingRecord>, new: ListingRecord, rules: &Ruleset) -> ListingRecord {
    let Some(old) = old else {
        return new;
    };

    let pick = |old: &Option<String>, new: Option<String>| -> Option<String> {
        match new {
            Some(value) if !rules.is_unset(&value) => Some(value),
            _ => old.clone(),
        }
    };

    let location = match new.location {
        Some(loc) if !rules.is_unset(&loc.to_string()) => Some(loc),
        _ => old.location.clone(),
    };

    let amenities = if new.amenities.is_empty() {
        old.amenities.clone()
    } else {
        new.amenities
    };

    let mut extra_details = old.extra_details.clone();
    extra_details.extend(
        new.extra_details
            .into_iter()
            .filter(|(_, value)| !rules.is_unset(value)),
    );

    ListingRecord {
        title: pick(&old.title, new.title),
        property_type: pick(&old.property_type, new.property_type),
        pricing: pick(&old.pricing, new.pricing),
        availability: pick(&old.availability, new.availability),
        number_of_guests: pick(&old.number_of_guests, new.number_of_guests),
        description: pick(&old.description, new.description),
        house_rules: pick(&old.house_rules, new.house_rules),
        guest_safety: pick(&old.guest_safety, new.guest_safety),
        cancellation_policy: pick(&old.cancellation_policy, new.cancellation_policy),
        location,
        about_host: pick(&old.about_host, new.about_host),
        co_hosts: pick(&old.co_hosts, new.co_hosts),
        booking_settings: pick(&old.booking_settings, new.booking_settings),
        custom_link: pick(&old.custom_link, new.custom_link),
        amenities,
        extra_details,
        source: new.source.or_else(|| old.source.clone()),
        extracted_at: new.extracted_at.or(old.extracted_at),
    }
}
