//! An in-process stand-in for the DFP SDK.
//!
//! Plays back a [`Script`] for every ad request, delivering its callbacks on
//! the main thread the way the real SDK does.
use crate::ad_view::{AdListener, AppEventListener, PublisherAdView};
use openwrap_rs::{AdRequest, AdSize, MainThread};
use parking_lot::Mutex;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, trace};

/// Targeting key carrying the header bidder's bid status; `"1"` when a bid is present.
pub const BID_STATUS_KEY: &str = "pwtbst";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Script {
    // amount in milliseconds from the request until the creative loads (or fails)
    pub load_latency_ms: u64,
    // if set, the request fails with this code instead of loading
    pub failure_code: Option<i32>,
    // whether the partner line item serves when the request carries a bid
    pub serve_partner: bool,
    // amount in milliseconds from the request until the win app event renders
    pub app_event_delay_ms: u64,
    pub app_event_name: String,
    // defaults to the first requested size
    pub creative_size: Option<AdSize>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            load_latency_ms: 100,
            failure_code: None,
            serve_partner: false,
            app_event_delay_ms: 150,
            app_event_name: crate::PUBMATIC_WIN_KEY.to_string(),
            creative_size: None,
        }
    }
}

#[derive(Default)]
struct State {
    ad_listener: Option<Arc<dyn AdListener>>,
    app_event_listener: Option<Arc<dyn AppEventListener>>,
    loaded_size: Option<AdSize>,
    in_flight: Vec<JoinHandle<()>>,
    destroyed: bool,
}

pub struct SimulatedAdView {
    ad_unit_id: String,
    ad_sizes: Vec<AdSize>,
    script: Script,
    main_thread: MainThread,
    state: Arc<Mutex<State>>,
}

impl SimulatedAdView {
    pub fn new(
        ad_unit_id: impl Into<String>,
        ad_sizes: Vec<AdSize>,
        script: Script,
        main_thread: MainThread,
    ) -> Self {
        Self {
            ad_unit_id: ad_unit_id.into(),
            ad_sizes,
            script,
            main_thread,
            state: Default::default(),
        }
    }

    fn creative_size(&self) -> Option<AdSize> {
        self.script.creative_size.or_else(|| self.ad_sizes.first().copied())
    }

    // Runs `f` on the main thread after `delay`, unless the view is destroyed by then.
    fn schedule(
        &self,
        delay: Duration,
        f: impl FnOnce(&mut State) -> Option<Box<dyn FnOnce() + Send>> + Send + 'static,
    ) -> JoinHandle<()> {
        let state = self.state.clone();
        let main_thread = self.main_thread.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            main_thread.post(move || {
                let callback = {
                    let mut state = state.lock();
                    if state.destroyed {
                        return
                    }
                    f(&mut state)
                };
                if let Some(callback) = callback {
                    callback();
                }
            });
        })
    }
}

impl PublisherAdView for SimulatedAdView {
    fn ad_unit_id(&self) -> &str {
        &self.ad_unit_id
    }

    fn ad_sizes(&self) -> Vec<AdSize> {
        self.ad_sizes.clone()
    }

    fn ad_size(&self) -> Option<AdSize> {
        self.state.lock().loaded_size
    }

    fn set_ad_listener(&self, listener: Arc<dyn AdListener>) {
        self.state.lock().ad_listener = Some(listener);
    }

    fn ad_listener(&self) -> Option<Arc<dyn AdListener>> {
        self.state.lock().ad_listener.clone()
    }

    fn set_app_event_listener(&self, listener: Arc<dyn AppEventListener>) {
        self.state.lock().app_event_listener = Some(listener);
    }

    fn app_event_listener(&self) -> Option<Arc<dyn AppEventListener>> {
        self.state.lock().app_event_listener.clone()
    }

    fn load_ad(&self, request: AdRequest) {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return
            }
            // a new request supersedes whatever the previous one still has pending
            for task in state.in_flight.drain(..) {
                task.abort();
            }
            state.loaded_size = None;
        }
        trace!(ad_unit = %self.ad_unit_id, ?request, "loading simulated ad");

        let load_latency = Duration::from_millis(self.script.load_latency_ms);
        let mut tasks = vec![];

        if let Some(code) = self.script.failure_code {
            tasks.push(self.schedule(load_latency, move |state| {
                let listener = state.ad_listener.clone()?;
                Some(Box::new(move || listener.on_ad_failed_to_load(code)))
            }));
        } else {
            let has_bid = request.targeting_value(BID_STATUS_KEY) == Some("1");
            if self.script.serve_partner && has_bid {
                let name = self.script.app_event_name.clone();
                let delay = Duration::from_millis(self.script.app_event_delay_ms);
                debug!(?delay, %name, "partner line item will serve");
                tasks.push(self.schedule(delay, move |state| {
                    let listener = state.app_event_listener.clone()?;
                    Some(Box::new(move || listener.on_app_event(&name, "")))
                }));
            }
            let size = self.creative_size();
            tasks.push(self.schedule(load_latency, move |state| {
                state.loaded_size = size;
                let listener = state.ad_listener.clone()?;
                Some(Box::new(move || listener.on_ad_loaded()))
            }));
        }

        self.state.lock().in_flight.extend(tasks);
    }

    fn destroy(&self) {
        let mut state = self.state.lock();
        state.destroyed = true;
        for task in state.in_flight.drain(..) {
            task.abort();
        }
        state.ad_listener = None;
        state.app_event_listener = None;
    }
}
