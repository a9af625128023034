use crate::arbiter::DEFAULT_SIGNAL_TIMEOUT;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{io, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read config: {0}")]
    Io(#[from] io::Error),
    #[error("could not parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

pub fn from_toml_file<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, Error> {
    let config_data = std::fs::read_to_string(path.as_ref())?;
    Ok(toml::from_str(&config_data)?)
}

/// Identifies the header bidding inventory behind a banner slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdUnitConfig {
    pub pub_id: String,
    pub profile_id: u32,
    pub ad_unit_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    // amount in milliseconds to wait for a partner win signal
    pub signal_timeout_ms: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self { signal_timeout_ms: DEFAULT_SIGNAL_TIMEOUT.as_millis() as u64 }
    }
}

impl ArbiterConfig {
    pub fn signal_timeout(&self) -> Duration {
        Duration::from_millis(self.signal_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Slot {
        openwrap: AdUnitConfig,
        #[serde(default)]
        arbiter: ArbiterConfig,
    }

    #[test]
    fn arbiter_defaults_to_signal_window() {
        let slot: Slot = toml::from_str(
            r#"
            [openwrap]
            pub_id = "156276"
            profile_id = 1165
            ad_unit_id = "/15671365/pm_sdk/PMSDK-Demo-App-Banner"
            "#,
        )
        .unwrap();
        assert_eq!(slot.openwrap.profile_id, 1165);
        assert_eq!(slot.arbiter.signal_timeout(), Duration::from_millis(400));
    }

    #[test]
    fn arbiter_timeout_is_configurable() {
        let config: ArbiterConfig = toml::from_str("signal_timeout_ms = 250").unwrap();
        assert_eq!(config.signal_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = from_toml_file::<_, ArbiterConfig>("/nonexistent/openwrap.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
