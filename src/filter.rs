use crate::rules::MessageRules;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// A block that is nothing but a clock time ("9:41 AM")
static BARE_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{1,2}:\d{2}\s?(AM|PM)?$").expect("timestamp pattern is valid")
});

/// Text filter that separates conversation content from inbox chrome
///
/// Built per extraction pass: the forbidden set and the guest's name
/// depend on what the page currently shows.
#[derive(Debug)]
pub struct NoiseFilter<'a> {
    rules: &'a MessageRules,
    guest_name: String,
    forbidden: HashSet<String>,
}

impl<'a> NoiseFilter<'a> {
    /// Create a filter for one conversation
    ///
    /// `forbidden` holds lower-cased lines read from the profile and
    /// reservation sidebars.
    pub fn new(rules: &'a MessageRules, guest_name: &str, forbidden: HashSet<String>) -> Self {
        Self {
            rules,
            guest_name: guest_name.to_string(),
            forbidden,
        }
    }

    pub fn guest_name(&self) -> &str {
        &self.guest_name
    }

    /// Whether a block carries context that is kept regardless of every other rule
    pub fn is_forced(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.rules.force_accept.iter().any(|p| lower.contains(p.as_str()))
    }

    /// Whether a block is an accessibility link that leaked into the chat pane
    pub fn is_leak(&self, text: &str) -> bool {
        self.rules
            .leak_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }

    /// Whether a block is noise rather than a message
    pub fn is_noise(&self, text: &str) -> bool {
        if text.chars().count() < 2 || text.starts_with("http") {
            return true;
        }

        let lower = text.to_lowercase();
        if self.forbidden.contains(&lower) {
            return true;
        }
        if BARE_TIMESTAMP.is_match(text) {
            return true;
        }

        // The name itself, or a role badge next to it ("Nabhas · Booker")
        if text.trim() == self.guest_name {
            return true;
        }
        let guest = self.guest_name.to_lowercase();
        if lower.contains(&guest) && self.rules.role_words.iter().any(|w| lower.contains(&w.to_lowercase())) {
            return true;
        }

        if self
            .rules
            .system_phrases
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()))
        {
            return true;
        }

        self.rules.exact_chrome.iter().any(|chrome| chrome == text)
    }
}

/// Lines of sidebar text that must never be read as chat content
pub fn forbidden_terms<'t>(sidebar_texts: impl IntoIterator<Item = &'t str>) -> HashSet<String> {
    sidebar_texts
        .into_iter()
        .flat_map(str::lines)
        .map(|line| line.trim().to_lowercase())
        .filter(|line| line.chars().count() > 3)
        .collect()
}
