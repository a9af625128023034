use crate::ad_view::{AdListener, AppEventListener, PublisherAdView};
use openwrap_rs::{
    config::ArbiterConfig, error_from_code, AdRequest, AdRequestBuilder, AdSize, BannerEvent,
    BannerEventListener, Bid, MainThread, WinArbiter,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// App event name the DFP line item renders when the partner bid wins.
///
/// Configurable per line item, see [`Config::win_key`].
pub const PUBMATIC_WIN_KEY: &str = "pubmaticdm";

const AD_SERVER_NAME: &str = "DFP SDK";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub ad_unit_id: String,
    pub ad_sizes: Vec<AdSize>,
    pub win_key: String,
    #[serde(flatten)]
    pub arbiter: ArbiterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ad_unit_id: Default::default(),
            ad_sizes: vec![AdSize::BANNER],
            win_key: PUBMATIC_WIN_KEY.to_string(),
            arbiter: Default::default(),
        }
    }
}

/// Lets the publisher add its own targeting before every DFP request.
pub trait DfpConfigListener: Send + Sync {
    fn configure(&self, ad_view: &dyn PublisherAdView, request: &mut AdRequestBuilder);
}

impl<F> DfpConfigListener for F
where
    F: Fn(&dyn PublisherAdView, &mut AdRequestBuilder) + Send + Sync,
{
    fn configure(&self, ad_view: &dyn PublisherAdView, request: &mut AdRequestBuilder) {
        self(ad_view, request)
    }
}

struct Inner {
    ad_view: Mutex<Option<Arc<dyn PublisherAdView>>>,
    arbiter: WinArbiter,
    win_key: String,
    config_listener: Mutex<Option<Arc<dyn DfpConfigListener>>>,
    callbacks: Arc<Callbacks>,
}

impl Inner {
    fn ad_view(&self) -> Option<Arc<dyn PublisherAdView>> {
        self.ad_view.lock().clone()
    }

    fn listener(&self) -> Option<Arc<dyn BannerEventListener>> {
        self.arbiter.listener()
    }

    fn owns_listeners(&self, ad_view: &dyn PublisherAdView) -> bool {
        let ours = Arc::as_ptr(&self.callbacks) as *const ();
        let ad_listener = ad_view.ad_listener().map(|l| Arc::as_ptr(&l) as *const ());
        let app_event_listener =
            ad_view.app_event_listener().map(|l| Arc::as_ptr(&l) as *const ());
        ad_listener == Some(ours) && app_event_listener == Some(ours)
    }

    fn on_ad_loaded(&self) {
        info!("ad server creative loaded");
        if self.listener().is_some() {
            self.arbiter.on_ad_server_creative_ready();
        }
    }

    fn on_ad_failed_to_load(&self, code: i32) {
        info!(code, "ad server failed to load");
        match self.listener() {
            Some(listener) => listener.on_failed(error_from_code(AD_SERVER_NAME, code)),
            None => error!(code, "cannot report failure, no event listener set"),
        }
    }

    fn on_app_event(&self, name: &str, info: &str) {
        info!(name, info, "app event");
        if name == self.win_key {
            self.arbiter.on_partner_signal_received();
        }
    }
}

// Registered on the ad view; holds the handler weakly so the ad view it
// belongs to does not keep the handler alive.
struct Callbacks(Weak<Inner>);

impl Callbacks {
    fn with(&self, f: impl FnOnce(&Inner)) {
        if let Some(inner) = self.0.upgrade() {
            f(&inner)
        }
    }

    fn forward(&self, f: impl FnOnce(&dyn BannerEventListener)) {
        self.with(|inner| {
            if let Some(listener) = inner.listener() {
                f(listener.as_ref())
            }
        })
    }
}

impl AdListener for Callbacks {
    fn on_ad_loaded(&self) {
        self.with(|inner| inner.on_ad_loaded())
    }

    fn on_ad_failed_to_load(&self, code: i32) {
        self.with(|inner| inner.on_ad_failed_to_load(code))
    }

    fn on_ad_opened(&self) {
        self.forward(|listener| listener.on_ad_opened())
    }

    fn on_ad_closed(&self) {
        self.forward(|listener| listener.on_ad_closed())
    }

    fn on_ad_left_application(&self) {
        self.forward(|listener| listener.on_ad_left_application())
    }
}

impl AppEventListener for Callbacks {
    fn on_app_event(&self, name: &str, info: &str) {
        self.with(|inner| inner.on_app_event(name, info))
    }
}

/// Connects the header bidder to a DFP ad unit.
///
/// Forwards the bid's targeting to DFP and decides whether the partner bid or
/// the DFP creative is shown: DFP announces a partner win by rendering the
/// [`Config::win_key`] app event, which must arrive within the signal window
/// once the creative has loaded. Every banner slot needs its own handler.
pub struct DfpBannerEventHandler {
    inner: Arc<Inner>,
}

impl DfpBannerEventHandler {
    pub fn new(
        ad_view: impl PublisherAdView + 'static,
        main_thread: MainThread,
        config: &Config,
    ) -> Self {
        let ad_view: Arc<dyn PublisherAdView> = Arc::new(ad_view);
        let arbiter = WinArbiter::with_timeout(main_thread, config.arbiter.signal_timeout());
        let inner = Arc::new_cyclic(|weak| Inner {
            ad_view: Mutex::new(Some(ad_view)),
            arbiter,
            win_key: config.win_key.clone(),
            config_listener: Default::default(),
            callbacks: Arc::new(Callbacks(weak.clone())),
        });

        // handler relies on these; do not replace them on the ad view
        if let Some(ad_view) = inner.ad_view() {
            ad_view.set_ad_listener(inner.callbacks.clone());
            ad_view.set_app_event_listener(inner.callbacks.clone());
        }

        Self { inner }
    }

    pub fn set_config_listener(&self, listener: impl DfpConfigListener + 'static) {
        *self.inner.config_listener.lock() = Some(Arc::new(listener));
    }

    pub fn arbiter(&self) -> &WinArbiter {
        &self.inner.arbiter
    }
}

impl BannerEvent for DfpBannerEventHandler {
    fn request_ad(&self, bid: Option<&Bid>) {
        let Some(ad_view) = self.inner.ad_view() else {
            warn!("ad requested after the event handler was destroyed");
            return
        };

        let mut builder = AdRequest::builder();
        let config_listener = self.inner.config_listener.lock().clone();
        if let Some(config_listener) = config_listener {
            config_listener.configure(ad_view.as_ref(), &mut builder);
        }

        if !self.inner.owns_listeners(ad_view.as_ref()) {
            warn!("do not set DFP listeners; they are used by the event handler internally");
        }

        let mut expect_signal = false;
        if let Some(bid) = bid {
            debug!(%bid, "requesting ad with bid");
            for (key, value) in &bid.targeting {
                builder.add_custom_targeting(key, value);
                debug!(%key, %value, "targeting param");
            }
            // DFP only renders the win app event for a non-zero bid
            expect_signal = bid.is_non_zero();
        }

        let request = builder.build();
        self.inner.arbiter.begin_request(expect_signal);
        ad_view.load_ad(request);
    }

    fn set_event_listener(&self, listener: Arc<dyn BannerEventListener>) {
        self.inner.arbiter.set_listener(listener);
    }

    fn ad_size(&self) -> Option<AdSize> {
        self.inner.ad_view().and_then(|ad_view| ad_view.ad_size())
    }

    fn requested_ad_sizes(&self) -> Vec<AdSize> {
        self.inner.ad_view().map(|ad_view| ad_view.ad_sizes()).unwrap_or_default()
    }

    fn destroy(&self) {
        self.inner.arbiter.cancel();
        let ad_view = self.inner.ad_view.lock().take();
        if let Some(ad_view) = ad_view {
            debug!(ad_unit = ad_view.ad_unit_id(), "destroying ad view");
            ad_view.destroy();
        }
    }
}

impl Drop for DfpBannerEventHandler {
    fn drop(&mut self) {
        self.destroy();
    }
}
