use crate::dummy::{
    DummyAdServer, DummyAdServerEventListener, DummyError, Script, DEFAULT_CUSTOM_EVENT,
};
use openwrap_rs::{
    error_from_code, AdSize, BannerEvent, BannerEventListener, Bid, Error, MainThread, WinArbiter,
};
use serde::Deserialize;
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub ad_unit_id: String,
    pub ad_size: AdSize,
    /// Custom event that marks a partner win.
    pub custom_event: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ad_unit_id: Default::default(),
            ad_size: AdSize::BANNER,
            custom_event: DEFAULT_CUSTOM_EVENT.to_string(),
        }
    }
}

struct Inner {
    ad_server: DummyAdServer,
    arbiter: WinArbiter,
    custom_event: String,
}

impl Inner {
    fn listener(&self) -> Option<Arc<dyn BannerEventListener>> {
        self.arbiter.listener()
    }
}

struct Callbacks(Weak<Inner>);

impl DummyAdServerEventListener for Callbacks {
    fn on_banner_loaded(&self, size: AdSize) {
        let Some(inner) = self.0.upgrade() else { return };
        debug!(%size, "banner loaded");
        if inner.listener().is_some() {
            inner.arbiter.on_ad_server_creative_ready();
        }
    }

    fn on_ad_failed(&self, error: DummyError) {
        let Some(inner) = self.0.upgrade() else { return };
        if let Some(listener) = inner.listener() {
            let kind = error_from_code("dummy ad server", error.code).kind;
            listener.on_failed(Error::new(kind, error.to_string()));
        }
    }

    fn on_custom_event_received(&self, event: &str) {
        let Some(inner) = self.0.upgrade() else { return };
        if event == inner.custom_event && inner.listener().is_some() {
            inner.arbiter.on_partner_signal_received();
        }
    }
}

/// Connects the header bidder to the dummy ad server.
///
/// The ad server announces a partner win with a custom event instead of its
/// own banner, so no signal window is needed: whichever callback comes first
/// decides the request.
pub struct CustomBannerEventHandler {
    inner: Arc<Inner>,
    ad_size: AdSize,
}

impl CustomBannerEventHandler {
    pub fn new(config: &Config, script: Script, main_thread: MainThread) -> Self {
        let ad_server = DummyAdServer::new(
            &config.ad_unit_id,
            config.ad_size,
            &config.custom_event,
            script,
            main_thread.clone(),
        );
        let inner = Arc::new(Inner {
            ad_server,
            arbiter: WinArbiter::new(main_thread),
            custom_event: config.custom_event.clone(),
        });
        inner.ad_server.set_event_listener(Arc::new(Callbacks(Arc::downgrade(&inner))));
        Self { inner, ad_size: config.ad_size }
    }
}

impl BannerEvent for CustomBannerEventHandler {
    fn request_ad(&self, bid: Option<&Bid>) {
        if let Some(bid) = bid {
            debug!(%bid, "requesting ad with bid");
            self.inner.ad_server.set_custom_targeting(bid.targeting_string());
        }
        self.inner.arbiter.begin_request(false);
        self.inner.ad_server.load_banner_ad();
    }

    fn set_event_listener(&self, listener: Arc<dyn BannerEventListener>) {
        self.inner.arbiter.set_listener(listener);
    }

    fn ad_size(&self) -> Option<AdSize> {
        Some(self.ad_size)
    }

    fn requested_ad_sizes(&self) -> Vec<AdSize> {
        vec![self.ad_size]
    }

    fn destroy(&self) {
        self.inner.ad_server.destroy();
        self.inner.arbiter.cancel();
    }
}

impl Drop for CustomBannerEventHandler {
    fn drop(&mut self) {
        self.destroy();
    }
}
