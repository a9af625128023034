use crate::{
    error::Error,
    types::{AdSize, Bid},
};
use std::sync::Arc;

/// Receives the outcome of an ad request from an ad server event handler.
///
/// Win notifications (`on_ad_server_win` and `on_open_wrap_partner_win`) are
/// delivered at most once per request.
pub trait BannerEventListener: Send + Sync {
    fn on_ad_server_win(&self);

    fn on_open_wrap_partner_win(&self);

    fn on_failed(&self, error: Error);

    fn on_ad_opened(&self);

    fn on_ad_closed(&self);

    fn on_ad_left_application(&self);
}

/// The bidder-facing side of an ad server integration.
pub trait BannerEvent: Send + Sync {
    /// Issue an ad server request, forwarding the targeting of `bid` if present.
    fn request_ad(&self, bid: Option<&Bid>);

    fn set_event_listener(&self, listener: Arc<dyn BannerEventListener>);

    /// Size of the creative currently rendered by the ad server, if any.
    fn ad_size(&self) -> Option<AdSize>;

    fn requested_ad_sizes(&self) -> Vec<AdSize>;

    /// Release ad server resources; no listener callbacks are made afterwards.
    fn destroy(&self);
}
