use crate::pages::PageType;
use crate::results::{CalendarRecord, ListingRecord, MessageRecord};
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::sync::mpsc;

/// The record a panel displays
#[derive(Debug, Clone, PartialEq)]
pub enum PanelRecord {
    Calendar(CalendarRecord),
    Listing(ListingRecord),
    Message(MessageRecord),
}

/// Collaborator that injects and removes the per-page panels
pub trait PanelHost {
    fn show_panel(&mut self, page: PageType, record: &PanelRecord);
    fn hide_panel(&mut self, page: PageType);
}

/// Collaborator that forwards new-message events outside the page
pub trait Bridge {
    /// Called after every accepted message extraction with the consolidated context text
    fn notify_new_message(&mut self, consolidated: &str);
}

/// Source of "now" and "today" for extraction passes
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate;
}

/// Wall clock; "today" is the local calendar date
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn today(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

/// Everything the core tells its collaborators, as data
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Show { page: PageType, record: PanelRecord },
    Hide(PageType),
    NewMessage(String),
}

/// Panel host and bridge that forward every call over a channel
///
/// The receiving side decides what a panel is: the live watcher logs and
/// relays them, tests inspect them.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Output>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Output>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, output: Output) {
        if self.tx.send(output).is_err() {
            ::log::warn!("Output receiver dropped; discarding update");
        }
    }
}

impl PanelHost for ChannelSink {
    fn show_panel(&mut self, page: PageType, record: &PanelRecord) {
        self.send(Output::Show {
            page,
            record: record.clone(),
        });
    }

    fn hide_panel(&mut self, page: PageType) {
        self.send(Output::Hide(page));
    }
}

impl Bridge for ChannelSink {
    fn notify_new_message(&mut self, consolidated: &str) {
        self.send(Output::NewMessage(consolidated.to_string()));
    }
}

/// Drains every output currently queued on `rx`
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Output>) -> Vec<Output> {
    let mut outputs = Vec::new();
    while let Ok(output) = rx.try_recv() {
        outputs.push(output);
    }
    outputs
}
