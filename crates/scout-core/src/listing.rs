use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One business listing as returned by the listing source.
///
/// Field names follow the provider's wire format; `type` is renamed to
/// `category` on the Rust side. Every attribute except `name` is optional
/// because providers omit whatever they do not know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
}

impl Listing {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// The website, if present and not blank.
    pub fn website_url(&self) -> Option<&str> {
        self.website
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

/// Opening hours in whichever shape the provider chose to send.
///
/// Variants are tried in order, so a day→hours object becomes `Weekly`,
/// an array of strings becomes `Lines`, and anything unrecognised is kept
/// verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpeningHours {
    /// e.g. `{"Monday": "9 AM-5 PM", "Tuesday": "Closed"}`
    Weekly(BTreeMap<String, String>),
    /// e.g. `["Mon: 9-5", "Tue: 9-5"]`
    Lines(Vec<String>),
    /// e.g. `"Open 24 hours"`
    Text(String),
    Other(serde_json::Value),
}
