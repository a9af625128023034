mod ad_view;
mod handler;
pub mod simulator;

pub use ad_view::{AdListener, AppEventListener, PublisherAdView};
pub use handler::{Config, DfpBannerEventHandler, DfpConfigListener, PUBMATIC_WIN_KEY};
pub use simulator::SimulatedAdView;
