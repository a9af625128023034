pub mod config;

#[cfg(feature = "custom")]
pub mod custom;
#[cfg(feature = "dfp")]
pub mod dfp;
