use eyre::WrapErr;
use openwrap_rs::{
    config::{from_toml_file, AdUnitConfig},
    Bid,
};
use serde::Deserialize;
use std::{fmt, path::Path};

#[cfg(feature = "custom")]
use openwrap_custom_rs::{dummy::Script as CustomScript, Config as CustomHandlerConfig};
#[cfg(feature = "dfp")]
use openwrap_dfp_rs::{simulator::Script as DfpScript, Config as DfpHandlerConfig};

#[cfg(feature = "dfp")]
#[derive(Debug, Deserialize)]
pub struct DfpConfig {
    #[serde(flatten)]
    pub handler: DfpHandlerConfig,
    #[serde(default)]
    pub simulation: DfpScript,
}

#[cfg(feature = "custom")]
#[derive(Debug, Deserialize)]
pub struct CustomConfig {
    #[serde(flatten)]
    pub handler: CustomHandlerConfig,
    #[serde(default)]
    pub simulation: CustomScript,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub openwrap: AdUnitConfig,
    /// Bid returned by the header bidder; the ad server is asked without one if missing.
    pub bid: Option<Bid>,
    #[cfg(feature = "dfp")]
    pub dfp: Option<DfpConfig>,
    #[cfg(feature = "custom")]
    pub custom: Option<CustomConfig>,
}

impl Config {
    pub fn from_toml_file<P: AsRef<Path> + fmt::Display>(path: P) -> eyre::Result<Config> {
        tracing::info!("loading config from `{path}`...");

        from_toml_file::<_, Self>(path.as_ref()).wrap_err("could not parse TOML")
    }
}
