pub mod arbiter;
pub mod banner;
pub mod config;
mod error;
mod listener;
pub mod looper;
pub mod metrics;
pub mod test_utils;
pub mod types;

pub use arbiter::{BidOutcome, Phase, WinArbiter, DEFAULT_SIGNAL_TIMEOUT};
pub use banner::{BannerView, BannerViewListener};
pub use error::{codes, error_from_code, Error, ErrorKind};
pub use listener::{BannerEvent, BannerEventListener};
pub use looper::{main_looper, MainLooper, MainThread};
pub use types::{AdRequest, AdRequestBuilder, AdSize, Bid, Targeting};
