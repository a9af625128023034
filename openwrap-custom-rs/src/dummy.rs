//! Emulation of a generic ad server SDK.
//!
//! Serves the partner by raising a custom event when the request carries a
//! header bid and the script allows it, otherwise loads its own banner.
use openwrap_rs::{AdSize, MainThread};
use parking_lot::Mutex;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, trace};

pub const DEFAULT_CUSTOM_EVENT: &str = "SomeCustomEvent";

// rendered by `Bid::targeting_string` when the bidder has a bid
const BID_PRESENT_TARGETING: &str = "pwtbst=1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("dummy ad server error {code}: {message}")]
pub struct DummyError {
    pub code: i32,
    pub message: String,
}

pub trait DummyAdServerEventListener: Send + Sync {
    fn on_banner_loaded(&self, size: AdSize);

    fn on_ad_failed(&self, error: DummyError);

    fn on_custom_event_received(&self, event: &str);
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Script {
    // amount in milliseconds from the request until the ad server responds
    pub load_latency_ms: u64,
    pub failure: Option<DummyError>,
    pub serve_partner: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            load_latency_ms: 100,
            failure: None,
            serve_partner: false,
        }
    }
}

enum Response {
    Loaded(AdSize),
    Failed(DummyError),
    CustomEvent(String),
}

#[derive(Default)]
struct State {
    listener: Option<Arc<dyn DummyAdServerEventListener>>,
    custom_targeting: Option<String>,
    in_flight: Option<JoinHandle<()>>,
    destroyed: bool,
}

pub struct DummyAdServer {
    ad_unit_id: String,
    ad_size: AdSize,
    // raised in place of a banner when the partner line item serves
    custom_event: String,
    script: Script,
    main_thread: MainThread,
    state: Arc<Mutex<State>>,
}

impl DummyAdServer {
    pub fn new(
        ad_unit_id: impl Into<String>,
        ad_size: AdSize,
        custom_event: impl Into<String>,
        script: Script,
        main_thread: MainThread,
    ) -> Self {
        Self {
            ad_unit_id: ad_unit_id.into(),
            ad_size,
            custom_event: custom_event.into(),
            script,
            main_thread,
            state: Default::default(),
        }
    }

    pub fn ad_unit_id(&self) -> &str {
        &self.ad_unit_id
    }

    pub fn set_event_listener(&self, listener: Arc<dyn DummyAdServerEventListener>) {
        self.state.lock().listener = Some(listener);
    }

    pub fn set_custom_targeting(&self, targeting: impl Into<String>) {
        self.state.lock().custom_targeting = Some(targeting.into());
    }

    fn respond(&self, custom_targeting: Option<&str>) -> Response {
        if let Some(failure) = &self.script.failure {
            return Response::Failed(failure.clone())
        }
        let has_bid = custom_targeting.is_some_and(|t| t.contains(BID_PRESENT_TARGETING));
        if self.script.serve_partner && has_bid {
            Response::CustomEvent(self.custom_event.clone())
        } else {
            Response::Loaded(self.ad_size)
        }
    }

    /// Requests a banner; the response is delivered on the main thread.
    pub fn load_banner_ad(&self) {
        let mut state = self.state.lock();
        if state.destroyed {
            return
        }
        // targeting applies to a single request
        let custom_targeting = state.custom_targeting.take();
        let response = self.respond(custom_targeting.as_deref());
        trace!(ad_unit = %self.ad_unit_id, ?custom_targeting, "loading banner");

        if let Some(previous) = state.in_flight.take() {
            previous.abort();
        }

        let latency = Duration::from_millis(self.script.load_latency_ms);
        let shared = self.state.clone();
        let main_thread = self.main_thread.clone();
        state.in_flight = Some(tokio::spawn(async move {
            sleep(latency).await;
            main_thread.post(move || {
                let listener = {
                    let state = shared.lock();
                    if state.destroyed {
                        return
                    }
                    state.listener.clone()
                };
                let Some(listener) = listener else { return };
                match response {
                    Response::Loaded(size) => listener.on_banner_loaded(size),
                    Response::Failed(error) => listener.on_ad_failed(error),
                    Response::CustomEvent(event) => {
                        debug!(%event, "raising custom event");
                        listener.on_custom_event_received(&event)
                    }
                }
            });
        }));
    }

    pub fn destroy(&self) {
        let mut state = self.state.lock();
        state.destroyed = true;
        state.listener = None;
        if let Some(task) = state.in_flight.take() {
            task.abort();
        }
    }
}
