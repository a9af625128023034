use crate::{
    arbiter::BidOutcome,
    config::AdUnitConfig,
    error::Error,
    listener::{BannerEvent, BannerEventListener},
    types::{AdSize, Bid},
};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

/// Optional callbacks for the owner of a [`BannerView`].
pub trait BannerViewListener: Send + Sync {
    /// An ad was decided for the slot; `winner` says which source serves it.
    fn on_ad_received(&self, _winner: BidOutcome) {}

    fn on_ad_failed(&self, _error: &Error) {}

    /// The user clicked through and the app is going to the background.
    fn on_app_leaving(&self) {}

    fn on_ad_opened(&self) {}

    fn on_ad_closed(&self) {}
}

#[derive(Default)]
struct Relay {
    listener: Mutex<Option<Arc<dyn BannerViewListener>>>,
    winner: Mutex<BidOutcome>,
}

impl Relay {
    fn listener(&self) -> Option<Arc<dyn BannerViewListener>> {
        self.listener.lock().clone()
    }

    fn on_win(&self, winner: BidOutcome) {
        *self.winner.lock() = winner;
        info!(%winner, "ad received");
        if let Some(listener) = self.listener() {
            listener.on_ad_received(winner);
        }
    }
}

impl BannerEventListener for Relay {
    fn on_ad_server_win(&self) {
        self.on_win(BidOutcome::AdServerWin);
    }

    fn on_open_wrap_partner_win(&self) {
        self.on_win(BidOutcome::PartnerWin);
    }

    fn on_failed(&self, error: Error) {
        warn!(%error, "ad failed");
        if let Some(listener) = self.listener() {
            listener.on_ad_failed(&error);
        }
    }

    fn on_ad_opened(&self) {
        if let Some(listener) = self.listener() {
            listener.on_ad_opened();
        }
    }

    fn on_ad_closed(&self) {
        if let Some(listener) = self.listener() {
            listener.on_ad_closed();
        }
    }

    fn on_ad_left_application(&self) {
        if let Some(listener) = self.listener() {
            listener.on_app_leaving();
        }
    }
}

/// A banner ad slot.
///
/// Owns the ad server event handler for its lifetime; make a separate handler
/// for every slot. [`BannerView::destroy`] (or dropping the view) tears the
/// handler down before the slot's own listener is released.
pub struct BannerView {
    ad_unit: AdUnitConfig,
    event_handler: Box<dyn BannerEvent>,
    relay: Arc<Relay>,
    destroyed: AtomicBool,
}

impl BannerView {
    pub fn new(ad_unit: AdUnitConfig, event_handler: impl BannerEvent + 'static) -> Self {
        let relay = Arc::new(Relay::default());
        event_handler.set_event_listener(relay.clone());
        Self {
            ad_unit,
            event_handler: Box::new(event_handler),
            relay,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn ad_unit(&self) -> &AdUnitConfig {
        &self.ad_unit
    }

    pub fn set_listener(&self, listener: Arc<dyn BannerViewListener>) {
        *self.relay.listener.lock() = Some(listener);
    }

    /// Requests an ad for the slot, forwarding `bid` to the ad server.
    pub fn load_ad(&self, bid: Option<&Bid>) {
        if self.destroyed.load(Ordering::Acquire) {
            warn!(ad_unit = %self.ad_unit.ad_unit_id, "cannot load ad on a destroyed banner");
            return
        }
        *self.relay.winner.lock() = BidOutcome::Unknown;
        debug!(
            pub_id = %self.ad_unit.pub_id,
            profile_id = self.ad_unit.profile_id,
            ad_unit = %self.ad_unit.ad_unit_id,
            "loading ad"
        );
        self.event_handler.request_ad(bid);
    }

    /// The source serving the most recently loaded ad, if decided.
    pub fn winner(&self) -> BidOutcome {
        *self.relay.winner.lock()
    }

    pub fn ad_size(&self) -> Option<AdSize> {
        self.event_handler.ad_size()
    }

    pub fn requested_ad_sizes(&self) -> Vec<AdSize> {
        self.event_handler.requested_ad_sizes()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return
        }
        self.event_handler.destroy();
        self.relay.listener.lock().take();
        debug!(ad_unit = %self.ad_unit.ad_unit_id, "banner destroyed");
    }
}

impl Drop for BannerView {
    fn drop(&mut self) {
        self.destroy();
    }
}
