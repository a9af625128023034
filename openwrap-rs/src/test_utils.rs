//! Helpers for exercising event handlers in tests.
use crate::{error::Error, listener::BannerEventListener};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    AdServerWin,
    PartnerWin,
    Failed(Error),
    Opened,
    Closed,
    LeftApplication,
}

/// A [`BannerEventListener`] that records every callback it receives.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    pub fn ad_server_wins(&self) -> usize {
        self.count(|event| matches!(event, ListenerEvent::AdServerWin))
    }

    pub fn partner_wins(&self) -> usize {
        self.count(|event| matches!(event, ListenerEvent::PartnerWin))
    }

    pub fn failures(&self) -> Vec<Error> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::Failed(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&ListenerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|event| f(event)).count()
    }

    fn record(&self, event: ListenerEvent) {
        self.events.lock().push(event);
    }
}

impl BannerEventListener for RecordingListener {
    fn on_ad_server_win(&self) {
        self.record(ListenerEvent::AdServerWin);
    }

    fn on_open_wrap_partner_win(&self) {
        self.record(ListenerEvent::PartnerWin);
    }

    fn on_failed(&self, error: Error) {
        self.record(ListenerEvent::Failed(error));
    }

    fn on_ad_opened(&self) {
        self.record(ListenerEvent::Opened);
    }

    fn on_ad_closed(&self) {
        self.record(ListenerEvent::Closed);
    }

    fn on_ad_left_application(&self) {
        self.record(ListenerEvent::LeftApplication);
    }
}
