//! Heuristic extractors that turn a DOM snapshot into structured records.
//!
//! Every extractor is best-effort: a missing element is an empty field,
//! never an error, and a malformed sub-field never aborts the pass.

pub mod calendar;
pub mod listing;
pub mod message;

use crate::parsers::Snapshot;
use crate::parsers::html;
use crate::rules::CompiledRules;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::ElementRef;

/// Everything an extraction pass may read
pub struct ExtractEnv<'a> {
    /// DOM snapshot taken when the pass started
    pub dom: &'a Snapshot,
    /// Current navigation location
    pub location: &'a str,
    pub rules: &'a CompiledRules,
    /// Ids of the containers this system injects into the page
    pub panel_ids: &'a [String],
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl ExtractEnv<'_> {
    /// Whether `el` belongs to one of the injected panels
    pub fn in_panel(&self, el: ElementRef<'_>) -> bool {
        self.panel_ids
            .iter()
            .any(|id| html::closest(el, &format!("#{}", id)).is_some())
    }

    /// Path component of the current location
    pub fn path(&self) -> String {
        match url::Url::parse(self.location) {
            Ok(url) => url.path().to_string(),
            Err(_) => self.location.to_string(),
        }
    }
}

/// A single extraction strategy for one kind of page
pub trait Extractor {
    type Output;

    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Runs one pass over the snapshot in `env`
    fn extract(&self, env: &ExtractEnv<'_>) -> Option<Self::Output>;
}
