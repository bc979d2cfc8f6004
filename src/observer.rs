use crate::pages::{PageType, Section};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// One DOM subtree mutation, as recorded in the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    /// Id of the mutated node, when it has one
    #[serde(default)]
    pub target_id: Option<String>,
    /// Ids of the mutated node's ancestors, nearest first
    #[serde(default)]
    pub ancestor_ids: Vec<String>,
}

impl Mutation {
    /// Whether the mutation happened inside an element with one of `ids`
    pub fn is_inside(&self, ids: &[String]) -> bool {
        self.target_id.iter().chain(&self.ancestor_ids).any(|id| ids.contains(id))
    }
}

/// Trailing-edge debounce timer
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Restarts the quiet period from `now`
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes the pending deadline if it has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// One due polling attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollAttempt {
    /// 1-based attempt number
    pub number: u32,
    /// Whether this is the last attempt before the cap
    pub last: bool,
}

/// Fixed-interval polling loop with an attempt cap
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
    deadline: Option<Instant>,
}

impl Poller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            attempts: 0,
            deadline: None,
        }
    }

    /// Starts (or restarts) the loop; the first attempt is due one interval after `now`
    pub fn start(&mut self, now: Instant) {
        self.attempts = 0;
        self.deadline = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Takes the attempt due at `now`, scheduling the next one unless the cap is reached
    pub fn poll(&mut self, now: Instant) -> Option<PollAttempt> {
        let deadline = self.deadline?;
        if deadline > now {
            return None;
        }
        self.attempts += 1;
        let last = self.attempts >= self.max_attempts;
        self.deadline = if last { None } else { Some(now + self.interval) };
        Some(PollAttempt {
            number: self.attempts,
            last,
        })
    }
}

/// Mutation observer for one section
///
/// Owns its debounce timer and, for the calendar, its polling loop;
/// detaching cancels both.
#[derive(Debug, Clone)]
pub struct Observer {
    section: Section,
    attached: bool,
    debounce: Debouncer,
    poller: Option<Poller>,
    ignored_ids: Vec<String>,
}

impl Observer {
    /// `ignored_ids` are the containers whose own mutations never trigger extraction
    pub fn new(section: Section, delay: Duration, ignored_ids: Vec<String>) -> Self {
        Self {
            section,
            attached: false,
            debounce: Debouncer::new(delay),
            poller: None,
            ignored_ids,
        }
    }

    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = Some(poller);
        self
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attaches the observer; returns `false` when it already was
    pub fn attach(&mut self) -> bool {
        if self.attached {
            return false;
        }
        self.attached = true;
        true
    }

    /// Detaches the observer and cancels all of its timers
    pub fn detach(&mut self) {
        self.attached = false;
        self.debounce.cancel();
        if let Some(poller) = self.poller.as_mut() {
            poller.cancel();
        }
    }

    /// Handles a mutation batch; returns whether the debounce was (re)started
    pub fn observe(&mut self, current: PageType, batch: &[Mutation], now: Instant) -> bool {
        if !self.attached {
            return false;
        }
        if !self.section.serves(current) {
            ::log::trace!("Stale {:?} observer ignoring mutations on {}", self.section, current);
            return false;
        }
        if batch.iter().all(|m| m.is_inside(&self.ignored_ids)) {
            ::log::trace!("Ignoring {} self-inflicted mutation(s)", batch.len());
            return false;
        }
        self.debounce.trigger(now);
        true
    }

    /// Whether the debounce period ended; consumes it
    pub fn fire(&mut self, now: Instant) -> bool {
        self.debounce.fire(now)
    }

    pub fn poller_mut(&mut self) -> Option<&mut Poller> {
        self.poller.as_mut()
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        let poll = self.poller.as_ref().and_then(Poller::deadline);
        match (self.debounce.deadline(), poll) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
