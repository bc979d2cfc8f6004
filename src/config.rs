use crate::pages::Section;
use crate::rules::Ruleset;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timings: Timings,

    #[serde(default)]
    pub panel_ids: PanelIds,

    #[serde(default)]
    pub relay: RelayConfig,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Heuristic lists used by the extractors
    #[serde(default)]
    pub rules: Ruleset,
}

/// Debounce and polling timings, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    #[serde(default = "default_calendar_debounce_ms")]
    pub calendar_debounce_ms: u64,

    #[serde(default = "default_listing_debounce_ms")]
    pub listing_debounce_ms: u64,

    #[serde(default = "default_message_debounce_ms")]
    pub message_debounce_ms: u64,

    #[serde(default = "default_calendar_poll_interval_ms")]
    pub calendar_poll_interval_ms: u64,

    /// Calendar polling stops after this many attempts
    #[serde(default = "default_calendar_max_attempts")]
    pub calendar_max_attempts: u32,

    /// How often the live watcher drains recorded mutations
    #[serde(default = "default_observe_interval_ms")]
    pub observe_interval_ms: u64,
}

/// DOM ids of the injected panels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelIds {
    #[serde(default = "default_calendar_panel")]
    pub calendar: String,

    #[serde(default = "default_listing_panel")]
    pub listing: String,

    #[serde(default = "default_message_panel")]
    pub message: String,
}

/// Generation relay endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_base_url")]
    pub base_url: String,

    #[serde(default = "default_generate_path")]
    pub generate_path: String,

    #[serde(default = "default_events_path")]
    pub events_path: String,

    #[serde(default = "default_relay_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_calendar_debounce_ms() -> u64 {
    500
}

fn default_listing_debounce_ms() -> u64 {
    700
}

fn default_message_debounce_ms() -> u64 {
    800
}

fn default_calendar_poll_interval_ms() -> u64 {
    300
}

fn default_calendar_max_attempts() -> u32 {
    6
}

fn default_observe_interval_ms() -> u64 {
    250
}

fn default_calendar_panel() -> String {
    "host-context-price-box".to_string()
}

fn default_listing_panel() -> String {
    "host-context-listing-box".to_string()
}

fn default_message_panel() -> String {
    "host-context-message-box".to_string()
}

fn default_relay_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_generate_path() -> String {
    "/agent/generate-reply".to_string()
}

fn default_events_path() -> String {
    "/agent/events".to_string()
}

fn default_relay_timeout_secs() -> u64 {
    30
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            calendar_debounce_ms: default_calendar_debounce_ms(),
            listing_debounce_ms: default_listing_debounce_ms(),
            message_debounce_ms: default_message_debounce_ms(),
            calendar_poll_interval_ms: default_calendar_poll_interval_ms(),
            calendar_max_attempts: default_calendar_max_attempts(),
            observe_interval_ms: default_observe_interval_ms(),
        }
    }
}

impl Timings {
    /// Debounce delay of the observer serving `section`
    pub fn debounce(&self, section: Section) -> Duration {
        let ms = match section {
            Section::Calendar => self.calendar_debounce_ms,
            Section::Listing => self.listing_debounce_ms,
            Section::Message => self.message_debounce_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.calendar_poll_interval_ms)
    }

    pub fn observe_interval(&self) -> Duration {
        Duration::from_millis(self.observe_interval_ms)
    }
}

impl Default for PanelIds {
    fn default() -> Self {
        Self {
            calendar: default_calendar_panel(),
            listing: default_listing_panel(),
            message: default_message_panel(),
        }
    }
}

impl PanelIds {
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Calendar => &self.calendar,
            Section::Listing => &self.listing,
            Section::Message => &self.message,
        }
    }

    pub fn all(&self) -> Vec<String> {
        Section::ALL.iter().map(|s| self.get(*s).to_string()).collect()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: default_relay_base_url(),
            generate_path: default_generate_path(),
            events_path: default_events_path(),
            timeout_secs: default_relay_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            panel_ids: PanelIds::default(),
            relay: RelayConfig::default(),
            webdriver_url: default_webdriver_url(),
            rules: Ruleset::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }

    /// Applies the `WEBDRIVER_URL` environment variable, when set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }
}
