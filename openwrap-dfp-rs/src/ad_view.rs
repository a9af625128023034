use openwrap_rs::{AdRequest, AdSize};
use std::sync::Arc;

/// Lifecycle callbacks raised by a [`PublisherAdView`].
pub trait AdListener: Send + Sync {
    fn on_ad_loaded(&self);

    /// `code` is one of [`openwrap_rs::codes`] or an ad server specific value.
    fn on_ad_failed_to_load(&self, code: i32);

    fn on_ad_opened(&self);

    fn on_ad_closed(&self);

    fn on_ad_left_application(&self);
}

/// Receives in-band app events rendered by an ad server creative.
pub trait AppEventListener: Send + Sync {
    fn on_app_event(&self, name: &str, info: &str);
}

/// A DFP banner ad view.
pub trait PublisherAdView: Send + Sync {
    fn ad_unit_id(&self) -> &str;

    fn ad_sizes(&self) -> Vec<AdSize>;

    /// Size of the loaded creative, if any.
    fn ad_size(&self) -> Option<AdSize>;

    fn set_ad_listener(&self, listener: Arc<dyn AdListener>);

    fn ad_listener(&self) -> Option<Arc<dyn AdListener>>;

    fn set_app_event_listener(&self, listener: Arc<dyn AppEventListener>);

    fn app_event_listener(&self) -> Option<Arc<dyn AppEventListener>>;

    fn load_ad(&self, request: AdRequest);

    fn destroy(&self);
}
