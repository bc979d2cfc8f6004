//! Drives the controller from a real browser through WebDriver.
//!
//! A small recorder script is installed in the page to collect DOM
//! mutations; every observe interval the recorder is drained, the location
//! is checked, and when an extraction is due the page is annotated with
//! computed style and layout and serialized into a `Snapshot`.

mod scripts;

use crate::config::Config;
use crate::controller::Controller;
use crate::observer::Mutation;
use crate::outputs::{ChannelSink, Output, PanelRecord, SystemClock};
use crate::parsers::Snapshot;
use crate::relay::{GenerationKind, RelayClient, compose_prompt};
use chrono::Utc;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

/// Alternative WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444",
];

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("could not open a WebDriver session at {0} or any fallback")]
    Session(String),

    #[error("WebDriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("unexpected script result: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid extraction rules: {0}")]
    Rules(#[from] regex::Error),
}

impl WatchError {
    fn is_session_lost(&self) -> bool {
        match self {
            WatchError::Session(_) => true,
            WatchError::Command(e) => e.to_string().contains("Unable to find session"),
            WatchError::Decode(_) | WatchError::Rules(_) => false,
        }
    }
}

/// What to do with the live page
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Location to open before watching; the current page is used otherwise
    pub start_url: Option<String>,
    /// Ask the relay for a draft reply after every new message
    pub draft_replies: bool,
}

/// Watches the browser until interrupted
pub async fn watch(config: &Config, options: &WatchOptions) -> Result<(), WatchError> {
    let (sink, rx) = ChannelSink::new();
    let controller = Controller::new(config, Box::new(SystemClock), sink)?;

    let client = connect_to_webdriver(&config.webdriver_url).await?;
    if let Some(start_url) = &options.start_url {
        ::log::info!("Opening {}", start_url);
        client.goto(start_url).await?;
    }

    let relay = match RelayClient::new(&config.relay) {
        Ok(relay) => Some(relay),
        Err(e) => {
            ::log::warn!("Relay disabled: {}", e);
            None
        }
    };

    let forwarder = tokio::spawn(forward_outputs(rx, relay, options.draft_replies));

    let mut session = Session {
        client,
        controller,
        webdriver_url: &config.webdriver_url,
    };
    ::log::info!("Watching; press Ctrl-C to stop");
    let result = run_until(&mut session, config.timings.observe_interval(), interrupted()).await;

    let Session { client, controller, .. } = session;
    drop(controller);
    if let Err(e) = client.close().await {
        ::log::debug!("Closing WebDriver session failed: {}", e);
    }
    if let Err(e) = forwarder.await {
        ::log::error!("Output forwarder failed: {}", e);
    }
    result
}

/// Resolves on the first Ctrl-C; never resolves when the signal cannot be watched
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        ::log::error!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Something advanced once per observe interval
trait Advance {
    async fn advance(&mut self) -> Result<(), WatchError>;
}

/// Browser session plus the controller it feeds
struct Session<'c> {
    client: Client,
    controller: Controller<ChannelSink>,
    webdriver_url: &'c str,
}

impl Advance for Session<'_> {
    /// Runs one step; a lost session is replaced, other failures only skip the interval
    async fn advance(&mut self) -> Result<(), WatchError> {
        let Err(e) = step(&self.client, &mut self.controller).await else {
            return Ok(());
        };
        if !e.is_session_lost() {
            ::log::warn!("Watch step failed: {}", e);
            return Ok(());
        }
        ::log::warn!("Lost WebDriver session, reconnecting");
        self.client = connect_to_webdriver(self.webdriver_url).await?;
        Ok(())
    }
}

/// Advances `watched` every `period` until `shutdown` resolves or a step fails for good
async fn run_until<A: Advance>(
    watched: &mut A,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<(), WatchError> {
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                ::log::info!("Interrupted, stopping");
                return Ok(());
            }
            _ = interval.tick() => watched.advance().await?,
        }
    }
}

/// Connects to the WebDriver instance, trying common alternative endpoints on failure
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client, WatchError> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS {
        if *url == webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(WatchError::Session(webdriver_url.to_string()))
}

/// One observe interval: location, mutations, and a tick when something is due
async fn step(client: &Client, controller: &mut Controller<ChannelSink>) -> Result<(), WatchError> {
    let now = Instant::now();

    let location = client.current_url().await?;
    if controller.location() != Some(location.as_str()) {
        controller.on_navigation_changed(location.as_str(), now);
    }

    // Navigations replace the window, so the recorder is re-installed when missing
    client.execute(scripts::INSTALL_RECORDER, vec![]).await?;
    let batch = decode_batch(client.execute(scripts::DRAIN_MUTATIONS, vec![]).await?)?;
    if !batch.is_empty() {
        controller.on_mutations(&batch, now);
    }

    if !controller.is_due(now) {
        return Ok(());
    }
    let html: String = serde_json::from_value(client.execute(scripts::ANNOTATE_AND_SERIALIZE, vec![]).await?)?;
    let dom = Snapshot::parse(&html);
    let ran = controller.tick(now, &dom);
    ::log::trace!("Tick ran {:?}", ran);
    Ok(())
}

fn decode_batch(value: serde_json::Value) -> Result<Vec<Mutation>, WatchError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value)?)
}

/// One-line description of a panel update for the log
fn describe(record: &PanelRecord) -> String {
    match record {
        PanelRecord::Calendar(calendar) => match calendar.base_price {
            Some(price) => format!("price {} for {} date(s)", price, calendar.selected_dates.len()),
            None => "no price".to_string(),
        },
        PanelRecord::Listing(listing) => {
            format!("\"{}\"", listing.title.as_deref().unwrap_or("untitled"))
        }
        PanelRecord::Message(message) => {
            format!("{}: \"{}\"", message.guest_name, message.last_message)
        }
    }
}

/// Logs panel updates and relays new-message events until the controller goes away
async fn forward_outputs(
    mut rx: mpsc::UnboundedReceiver<Output>,
    relay: Option<RelayClient>,
    draft_replies: bool,
) {
    let mut relays = JoinSet::new();
    loop {
        tokio::select! {
            output = rx.recv() => {
                let Some(output) = output else {
                    break;
                };
                match output {
                    Output::Show { page, record } => {
                        ::log::info!("[{}] {}", page, describe(&record));
                    }
                    Output::Hide(page) => {
                        ::log::debug!("[{}] panel hidden", page);
                    }
                    Output::NewMessage(context) => {
                        if let Some(relay) = relay.clone() {
                            relays.spawn(relay_message(relay, context, draft_replies));
                        }
                    }
                }
            }
            Some(joined) = relays.join_next(), if !relays.is_empty() => log_relay_join(joined),
        }
    }

    // Requests already under way are finished before returning
    while let Some(joined) = relays.join_next().await {
        log_relay_join(joined);
    }
}

/// Announces a new message and optionally asks for a draft reply
async fn relay_message(relay: RelayClient, context: String, draft_replies: bool) {
    if let Err(e) = relay.post_event(&context, Utc::now()).await {
        ::log::warn!("Could not relay message event: {}", e);
    }
    if !draft_replies {
        return;
    }
    let kind = GenerationKind::Reply;
    let prompt = compose_prompt(&context, Some(kind.default_instruction()));
    match relay.generate(kind, &prompt).await {
        Ok(reply) => ::log::info!("Draft reply:\n{}", reply),
        Err(e) => ::log::error!("Draft reply failed: {}", e),
    }
}

fn log_relay_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        ::log::error!("Relay task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::relay::testing::{read_request, respond};
    use crate::results::{CalendarRecord, MessageRecord};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Steps counted in memory; optionally fires `stop` or fails at a given step
    struct Counted {
        steps: usize,
        stop_at: usize,
        stop: Option<oneshot::Sender<()>>,
        fail_at: Option<usize>,
    }

    impl Counted {
        fn new(stop_at: usize, stop: Option<oneshot::Sender<()>>, fail_at: Option<usize>) -> Self {
            Self {
                steps: 0,
                stop_at,
                stop,
                fail_at,
            }
        }
    }

    impl Advance for Counted {
        async fn advance(&mut self) -> Result<(), WatchError> {
            self.steps += 1;
            if self.steps == self.stop_at {
                if let Some(stop) = self.stop.take() {
                    let _ = stop.send(());
                }
            }
            if self.fail_at == Some(self.steps) {
                return Err(WatchError::Session("http://localhost:4444".to_string()));
            }
            Ok(())
        }
    }

    /// Relay that acknowledges every request and counts the ones it answered
    async fn counting_relay() -> (RelayClient, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let answered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&answered);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    respond(&mut socket, "HTTP/1.1 200 OK", r#"{"status":"ok"}"#).await;
                });
            }
        });
        let relay = RelayClient::new(&RelayConfig {
            base_url: format!("http://{}", addr),
            ..RelayConfig::default()
        })
        .unwrap();
        (relay, answered)
    }

    #[test]
    fn test_decode_recorded_batch() {
        let value = json!([
            { "targetId": "host-context-message-box", "ancestorIds": ["root"] },
            { "targetId": null, "ancestorIds": [] }
        ]);
        let batch = decode_batch(value).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].target_id.as_deref(), Some("host-context-message-box"));
        assert_eq!(batch[1], Mutation::default());

        assert!(decode_batch(serde_json::Value::Null).unwrap().is_empty());
        assert!(matches!(decode_batch(json!({ "oops": 1 })), Err(WatchError::Decode(_))));
    }

    #[test]
    fn test_describe_panels() {
        let calendar = PanelRecord::Calendar(CalendarRecord {
            base_price: Some(2000),
            ..CalendarRecord::default()
        });
        assert_eq!(describe(&calendar), "price 2000 for 0 date(s)");

        let message = PanelRecord::Message(MessageRecord {
            guest_name: "Nabhas".to_string(),
            last_message: "Hi".to_string(),
            full_chat: "Hi".to_string(),
            previous_chat: String::new(),
            extracted_at: Utc::now(),
        });
        assert_eq!(describe(&message), "Nabhas: \"Hi\"");
    }

    #[tokio::test]
    async fn test_forwarder_stops_when_sink_is_dropped() {
        let (mut sink, rx) = ChannelSink::new();
        crate::outputs::PanelHost::hide_panel(&mut sink, crate::pages::PageType::Calendar);
        drop(sink);
        forward_outputs(rx, None, false).await;
    }

    #[tokio::test]
    async fn test_forwarder_waits_for_relay_requests() {
        let (relay, answered) = counting_relay().await;
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Output::NewMessage("first context".to_string())).unwrap();
        tx.send(Output::Hide(crate::pages::PageType::Messages)).unwrap();
        tx.send(Output::NewMessage("second context".to_string())).unwrap();
        drop(tx);

        forward_outputs(rx, Some(relay), false).await;
        assert_eq!(answered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_watch_loop() {
        let (stop, stopped) = oneshot::channel();
        let mut counted = Counted::new(3, Some(stop), None);
        let shutdown = async {
            let _ = stopped.await;
        };

        run_until(&mut counted, Duration::from_millis(1), shutdown).await.unwrap();
        assert_eq!(counted.steps, 3);
    }

    #[tokio::test]
    async fn test_fatal_step_error_ends_the_watch_loop() {
        let mut counted = Counted::new(0, None, Some(2));
        let err = run_until(&mut counted, Duration::from_millis(1), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Session(_)));
        assert_eq!(counted.steps, 2);
    }
}
