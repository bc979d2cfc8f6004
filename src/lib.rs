pub mod config;
pub mod consolidate;
pub mod controller;
pub mod extractors;
pub mod filter;
pub mod live;
pub mod merge;
pub mod observer;
pub mod outputs;
pub mod pages;
pub mod parsers;
pub mod relay;
pub mod results;
pub mod rules;
pub mod signature;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use controller::Controller;
pub use pages::PageType;
pub use results::PageContext;

use outputs::{ChannelSink, SystemClock};
use parsers::Snapshot;
use tokio::time::Instant;

/// Builder for a live watch session
pub struct Watcher {
    config: Config,
    options: live::WatchOptions,
}

impl Watcher {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            options: live::WatchOptions::default(),
        }
    }

    /// Open this location before watching
    pub fn with_start_url(mut self, start_url: impl Into<String>) -> Self {
        self.options.start_url = Some(start_url.into());
        self
    }

    pub fn with_webdriver_url(mut self, webdriver_url: impl Into<String>) -> Self {
        self.config.webdriver_url = webdriver_url.into();
        self
    }

    pub fn with_relay_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.relay.base_url = base_url.into();
        self
    }

    /// Request a draft reply for every new guest message
    pub fn with_draft_replies(mut self, draft_replies: bool) -> Self {
        self.options.draft_replies = draft_replies;
        self
    }

    /// Watch until interrupted
    pub async fn run(self) -> Result<(), live::WatchError> {
        ::log::info!("Connecting to WebDriver at {}", self.config.webdriver_url);
        live::watch(&self.config, &self.options).await
    }
}

/// Classifies `location` and runs its extractor once over `html`
///
/// Panels and bridge notifications are discarded; only the resulting
/// context is returned.
pub fn extract_page(config: &Config, location: &str, html: &str) -> Result<PageContext, regex::Error> {
    let (sink, _rx) = ChannelSink::new();
    let mut controller = Controller::new(config, Box::new(SystemClock), sink)?;
    controller.on_navigation_changed(location, Instant::now());
    if controller.context().page_type == PageType::Unknown {
        ::log::warn!("No extractor for {}", location);
    } else if !controller.extract_now(&Snapshot::parse(html)) {
        ::log::warn!("Nothing extracted from {}", location);
    }
    Ok(controller.context().clone())
}
