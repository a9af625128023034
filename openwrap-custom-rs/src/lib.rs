pub mod dummy;
mod handler;

pub use dummy::{DummyAdServer, DummyAdServerEventListener, DummyError};
pub use handler::{Config, CustomBannerEventHandler};
