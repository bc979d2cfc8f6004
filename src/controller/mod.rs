//! The single owner of the page context.
//!
//! Navigation and mutation events come in, extraction passes run when an
//! observer's timer is due, and accepted results go out to the panel host
//! and the bridge. Every timer is an explicit deadline; the caller drives
//! time by passing `now`, so the whole controller is synchronous.

mod router;

use crate::config::Config;
use crate::consolidate;
use crate::extractors::calendar::{CalendarAttempt, CalendarExtractor};
use crate::extractors::listing::{ListingEditorExtractor, ListingOverviewExtractor};
use crate::extractors::message::MessageExtractor;
use crate::extractors::{ExtractEnv, Extractor};
use crate::merge::merge_listing;
use crate::observer::{Mutation, Observer, PollAttempt, Poller};
use crate::outputs::{Bridge, Clock, PanelHost, PanelRecord};
use crate::pages::{PageType, Section};
use crate::parsers::Snapshot;
use crate::relay::{GenerationKind, compose_prompt};
use crate::results::PageContext;
use crate::rules::CompiledRules;
use crate::signature::{SignatureStore, calendar_signature, listing_signature, message_signature};
use tokio::time::Instant;

/// One observer per section
struct Observers {
    calendar: Observer,
    listing: Observer,
    message: Observer,
}

impl Observers {
    fn get(&self, section: Section) -> &Observer {
        match section {
            Section::Calendar => &self.calendar,
            Section::Listing => &self.listing,
            Section::Message => &self.message,
        }
    }

    fn get_mut(&mut self, section: Section) -> &mut Observer {
        match section {
            Section::Calendar => &mut self.calendar,
            Section::Listing => &mut self.listing,
            Section::Message => &mut self.message,
        }
    }
}

/// Owns the context and drives extraction for one browser tab
pub struct Controller<S> {
    context: PageContext,
    location: Option<String>,
    observers: Observers,
    signatures: SignatureStore,
    rules: CompiledRules,
    panel_ids: Vec<String>,
    clock: Box<dyn Clock + Send>,
    sink: S,
}

impl<S: PanelHost + Bridge> Controller<S> {
    pub fn new(config: &Config, clock: Box<dyn Clock + Send>, sink: S) -> Result<Self, regex::Error> {
        let rules = CompiledRules::new(config.rules.clone())?;
        let panel_ids = config.panel_ids.all();
        let timings = &config.timings;
        let observer = |section| Observer::new(section, timings.debounce(section), panel_ids.clone());

        let observers = Observers {
            calendar: observer(Section::Calendar).with_poller(Poller::new(
                timings.poll_interval(),
                timings.calendar_max_attempts,
            )),
            listing: observer(Section::Listing),
            message: observer(Section::Message),
        };

        Ok(Self {
            context: PageContext::default(),
            location: None,
            observers,
            signatures: SignatureStore::new(),
            rules,
            panel_ids,
            clock,
            sink,
        })
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    /// Last navigation location seen
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Sections whose observer is currently attached
    pub fn attached_observers(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| self.observers.get(*s).is_attached())
            .collect()
    }

    /// Feeds a batch of DOM mutations; returns whether any debounce was (re)started
    pub fn on_mutations(&mut self, batch: &[Mutation], now: Instant) -> bool {
        let page = self.context.page_type;
        let mut triggered = false;
        for section in Section::ALL {
            triggered |= self.observers.get_mut(section).observe(page, batch, now);
        }
        triggered
    }

    /// Earliest pending timer across all observers
    pub fn next_deadline(&self) -> Option<Instant> {
        Section::ALL
            .into_iter()
            .filter_map(|s| self.observers.get(s).next_deadline())
            .min()
    }

    /// Whether `tick(now, ..)` has work to do
    pub fn is_due(&self, now: Instant) -> bool {
        self.next_deadline().is_some_and(|deadline| deadline <= now)
    }

    /// Runs every extraction whose timer is due at `now`
    ///
    /// Returns the sections whose extractor ran.
    pub fn tick(&mut self, now: Instant, dom: &Snapshot) -> Vec<Section> {
        let mut ran = Vec::new();

        // A settled calendar (re)starts its polling loop rather than extracting directly
        if self.observers.calendar.fire(now) {
            if let Some(poller) = self.observers.calendar.poller_mut() {
                poller.start(now);
            }
        }
        let attempt = self
            .observers
            .calendar
            .poller_mut()
            .and_then(|poller| poller.poll(now));
        if let Some(attempt) = attempt {
            self.calendar_pass(dom, attempt);
            ran.push(Section::Calendar);
        }

        if self.observers.listing.fire(now) {
            self.listing_pass(dom);
            ran.push(Section::Listing);
        }

        if self.observers.message.fire(now) {
            self.message_pass(dom);
            ran.push(Section::Message);
        }

        ran
    }

    /// Runs the current page type's extractor once, without waiting for timers
    ///
    /// Returns whether the context changed.
    pub fn extract_now(&mut self, dom: &Snapshot) -> bool {
        match self.context.page_type.section() {
            Some(Section::Calendar) => self.calendar_pass(dom, PollAttempt { number: 1, last: true }),
            Some(Section::Listing) => self.listing_pass(dom),
            Some(Section::Message) => self.message_pass(dom),
            None => false,
        }
    }

    /// Plain-text rendering of the current context
    pub fn consolidated_text(&self) -> String {
        consolidate::consolidated_text(&self.context)
    }

    /// Prompt for a generation request: the context followed by an instruction
    pub fn generation_prompt(&self, kind: GenerationKind, instruction: Option<&str>) -> String {
        let instruction = instruction.unwrap_or(kind.default_instruction());
        compose_prompt(&self.consolidated_text(), Some(instruction))
    }

    fn run<E: Extractor>(&self, extractor: &E, dom: &Snapshot) -> Option<E::Output> {
        let env = ExtractEnv {
            dom,
            location: self.location.as_deref().unwrap_or_default(),
            rules: &self.rules,
            panel_ids: &self.panel_ids,
            today: self.clock.today(),
            now: self.clock.now(),
        };
        ::log::debug!("Running {} extractor", extractor.name());
        extractor.extract(&env)
    }

    fn calendar_pass(&mut self, dom: &Snapshot, attempt: PollAttempt) -> bool {
        if !Section::Calendar.serves(self.context.page_type) {
            return false;
        }
        let Some(CalendarAttempt { record, active_month }) = self.run(&CalendarExtractor, dom) else {
            return false;
        };
        if record.base_price.is_none() && !attempt.last {
            ::log::trace!("Calendar attempt {} found no price yet", attempt.number);
            return false;
        }
        if let Some(poller) = self.observers.calendar.poller_mut() {
            poller.cancel();
        }

        if !self
            .signatures
            .accept(Section::Calendar, calendar_signature(&record, active_month))
        {
            return false;
        }

        let has_price = record.base_price.is_some();
        self.context.calendar = Some(record.clone());
        self.touch();
        if has_price {
            self.sink
                .show_panel(PageType::Calendar, &PanelRecord::Calendar(record));
        } else {
            self.sink.hide_panel(PageType::Calendar);
        }
        ::log::info!("Calendar data updated (attempt {})", attempt.number);
        self.log_state();
        true
    }

    fn listing_pass(&mut self, dom: &Snapshot) -> bool {
        let page = self.context.page_type;
        let record = match page {
            PageType::Listing => self.run(&ListingOverviewExtractor, dom),
            PageType::ListingEditor => self.run(&ListingEditorExtractor, dom),
            _ => return false,
        };
        let Some(record) = record else {
            return false;
        };

        if !self
            .signatures
            .accept(Section::Listing, listing_signature(page, &record))
        {
            return false;
        }

        let merged = merge_listing(self.context.listing.as_ref(), record, &self.rules.set);
        self.context.listing = Some(merged.clone());
        self.touch();
        self.sink.show_panel(
            Section::Listing.page_type(),
            &PanelRecord::Listing(merged),
        );
        ::log::info!("Listing data updated from {}", page);
        self.log_state();
        true
    }

    fn message_pass(&mut self, dom: &Snapshot) -> bool {
        if !Section::Message.serves(self.context.page_type) {
            return false;
        }
        let Some(record) = self.run(&MessageExtractor, dom) else {
            return false;
        };

        if !self
            .signatures
            .accept(Section::Message, message_signature(&record))
        {
            return false;
        }

        ::log::info!("New message from {}", record.guest_name);
        self.context.message = Some(record.clone());
        self.touch();
        self.sink
            .show_panel(PageType::Messages, &PanelRecord::Message(record));
        let text = self.consolidated_text();
        self.sink.notify_new_message(&text);
        self.log_state();
        true
    }

    fn touch(&mut self) {
        self.context.meta.last_update_timestamp = Some(self.clock.now());
    }

    fn log_state(&self) {
        if ::log::log_enabled!(::log::Level::Debug) {
            ::log::debug!("Consolidated state:\n{}", self.consolidated_text());
        }
    }
}
