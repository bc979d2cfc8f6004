use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

static CENTER_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"center=([-\d.]+)(?:,|%2C)([-\d.]+)").expect("center pattern is valid")
});

static AT_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([-\d.]+),([-\d.]+)").expect("@ pattern is valid"));

static Q_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"q=([-\d.]+),([-\d.]+)").expect("q pattern is valid"));

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds coordinates from their textual parts, rejecting out-of-range values
    pub fn from_parts(lat: &str, lng: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

/// Coordinates from a static map image URL's `center=<lat>,<lng>` query parameter
pub fn coordinates_from_map_image(src: &str) -> Option<Coordinates> {
    if let Ok(url) = Url::parse(src) {
        if let Some((_, center)) = url.query_pairs().find(|(key, _)| key == "center") {
            if let Some((lat, lng)) = center.split_once(',') {
                return Coordinates::from_parts(lat, lng);
            }
        }
    }
    // Relative or otherwise unparsable URLs still carry the raw parameter
    let caps = CENTER_PARAM.captures(src)?;
    Coordinates::from_parts(&caps[1], &caps[2])
}

/// Coordinates from a map link: an `@<lat>,<lng>` path segment or a `q=<lat>,<lng>` query
pub fn coordinates_from_map_link(href: &str) -> Option<Coordinates> {
    let caps = AT_SEGMENT.captures(href).or_else(|| Q_PARAM.captures(href))?;
    Coordinates::from_parts(&caps[1], &caps[2])
}
