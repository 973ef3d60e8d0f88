//! Configuration for document rendering.

use std::fmt::Write;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::canvas::PageSetup;
use crate::compose::TokenPolicy;
use crate::error::Error;

/// Default footer timestamp format.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Document rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Institution name printed in every banner.
    pub institution: String,

    /// Banner subtitle of card documents.
    pub card_subtitle: String,

    /// Banner subtitle of roster documents.
    pub roster_subtitle: String,

    /// Ownership notice printed on the back of the card.
    pub card_disclaimer: String,

    /// Logo image; skipped when missing.
    pub logo_path: Option<PathBuf>,

    /// Directory that photo references (`/uploads/...`) resolve against.
    pub asset_root: PathBuf,

    /// Page geometry of card documents.
    pub card_page: PageSetup,

    /// Page geometry of roster documents.
    pub roster_page: PageSetup,

    /// Flate-compress page content streams.
    pub compress: bool,

    /// How card documents obtain the student's token.
    pub token_policy: TokenPolicy,

    /// Fixed footer timestamp; the local time is used when unset.
    pub timestamp: Option<String>,

    /// `chrono` format string for the footer timestamp.
    pub timestamp_format: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            institution: "MINDORO STATE UNIVERSITY".to_string(),
            card_subtitle: "Official Student Digital ID Document".to_string(),
            roster_subtitle: "Student Records Export".to_string(),
            card_disclaimer: "This card is the property of Mindoro State University. \
                              If found, please return to the Office of the Registrar."
                .to_string(),
            logo_path: None,
            asset_root: PathBuf::from("public"),
            card_page: PageSetup::a4_portrait(),
            roster_page: PageSetup::letter_landscape(),
            compress: false,
            token_policy: TokenPolicy::default(),
            timestamp: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// Set the institution name.
    pub fn with_institution(mut self, name: impl Into<String>) -> Self {
        self.institution = name.into();
        self
    }

    /// Set the logo path.
    pub fn with_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// Set the directory photos resolve against.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Set the card page geometry.
    pub fn with_card_page(mut self, setup: PageSetup) -> Self {
        self.card_page = setup;
        self
    }

    /// Set the roster page geometry.
    pub fn with_roster_page(mut self, setup: PageSetup) -> Self {
        self.roster_page = setup;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the token policy.
    pub fn with_token_policy(mut self, policy: TokenPolicy) -> Self {
        self.token_policy = policy;
        self
    }

    /// Pin the footer timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Footer timestamp: the pinned value, or the local time formatted once.
    ///
    /// Fails with `InvalidConfig` when `timestamp_format` has an unknown
    /// specifier.
    pub fn resolve_timestamp(&self) -> crate::Result<String> {
        if let Some(ts) = &self.timestamp {
            return Ok(ts.clone());
        }
        let items: Vec<Item<'_>> = StrftimeItems::new(&self.timestamp_format).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidConfig(format!(
                "bad timestamp format {:?}",
                self.timestamp_format
            )));
        }
        let mut out = String::new();
        write!(out, "{}", chrono::Local::now().format_with_items(items.into_iter()))
            .map_err(|_| Error::InvalidConfig("timestamp formatting failed".to_string()))?;
        Ok(out)
    }

    /// Load configuration from a JSON file; absent keys take defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
