use super::Controller;
use crate::outputs::{Bridge, PanelHost, PanelRecord};
use crate::pages::{Section, classify};
use tokio::time::Instant;

impl<S: PanelHost + Bridge> Controller<S> {
    /// Handles a navigation to `location`
    ///
    /// Only a change of page type does anything beyond remembering the
    /// location: signatures are reset, every other section is detached and
    /// hidden, and the serving observer is attached.
    pub fn on_navigation_changed(&mut self, location: &str, now: Instant) {
        self.location = Some(location.to_string());
        let page = classify(location, &self.rules.set.page_rules);
        if page == self.context.page_type {
            return;
        }

        ::log::info!("Page changed: {} -> {}", self.context.page_type, page);
        self.signatures.reset();
        self.context.page_type = page;
        self.context.meta.current_url = Some(location.to_string());
        self.context.meta.last_update_timestamp = Some(self.clock.now());

        for section in Section::ALL {
            if section.serves(page) {
                continue;
            }
            let observer = self.observers.get_mut(section);
            if observer.is_attached() {
                ::log::debug!("Detaching {:?} observer", section);
                observer.detach();
            }
            self.sink.hide_panel(section.page_type());
        }

        let Some(section) = page.section() else {
            return;
        };
        if self.observers.get_mut(section).attach() {
            ::log::debug!("Attached {:?} observer", section);
        }

        if self.context.has_cached(page) {
            self.reshow(section);
        }

        // The calendar may already be rendered; poll without waiting for a mutation
        if section == Section::Calendar {
            if let Some(poller) = self.observers.calendar.poller_mut() {
                poller.start(now);
            }
        }
    }

    /// Shows the cached record of `section` again, without notifying the bridge
    fn reshow(&mut self, section: Section) {
        let record = match section {
            Section::Calendar => self.context.calendar.clone().map(PanelRecord::Calendar),
            Section::Listing => self.context.listing.clone().map(PanelRecord::Listing),
            Section::Message => self.context.message.clone().map(PanelRecord::Message),
        };
        if let Some(record) = record {
            ::log::debug!("Re-showing cached {:?} panel", section);
            self.sink.show_panel(section.page_type(), &record);
        }
    }
}
