use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Key-value pairs a bid asks the ad server to target on.
pub type Targeting = BTreeMap<String, String>;

/// A priced response from the header bidder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub price: f64,
    #[serde(default)]
    pub partner: String,
    #[serde(default)]
    pub targeting: Targeting,
}

impl Bid {
    /// Only a non-zero bid makes the ad server announce a partner win.
    pub fn is_non_zero(&self) -> bool {
        self.price > 0.0
    }

    pub fn targeting_string(&self) -> String {
        let pairs = self.targeting.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>();
        format!("{{{}}}", pairs.join(", "))
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bid(partner={}, price={}, targeting={})",
            self.partner,
            self.price,
            self.targeting_string()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdSize {
    pub width: u32,
    pub height: u32,
}

impl AdSize {
    pub const BANNER: AdSize = AdSize::new(320, 50);
    pub const MEDIUM_RECTANGLE: AdSize = AdSize::new(300, 250);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for AdSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The content of an ad request handed to an ad server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdRequest {
    custom_targeting: Vec<(String, String)>,
}

impl AdRequest {
    pub fn builder() -> AdRequestBuilder {
        AdRequestBuilder::default()
    }

    pub fn custom_targeting(&self) -> &[(String, String)] {
        &self.custom_targeting
    }

    pub fn targeting_value(&self, key: &str) -> Option<&str> {
        self.custom_targeting.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub struct AdRequestBuilder {
    custom_targeting: Vec<(String, String)>,
}

impl AdRequestBuilder {
    pub fn add_custom_targeting(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.custom_targeting.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> AdRequest {
        AdRequest { custom_targeting: self.custom_targeting }
    }
}
