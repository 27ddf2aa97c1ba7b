//! Editor settings
//!
//! Settings are stored as JSON. Missing fields take their defaults, and a
//! file that cannot be read or parsed falls back to the defaults entirely.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use table_layout::PageMetrics;
use table_model::{IdentityStrategy, TableDocument};

/// Hit-test tolerance in pixels when none is configured
pub const DEFAULT_TOLERANCE_PX: f64 = 5.0;

/// Settings for table editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Slack allowed when comparing rendered edges, in pixels
    pub tolerance_px: f64,
    /// How new row and cell identities are produced
    pub identity: IdentityStrategy,
    /// Page the tables are laid out on
    pub page: PageMetrics,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            tolerance_px: DEFAULT_TOLERANCE_PX,
            identity: IdentityStrategy::default(),
            page: PageMetrics::default(),
        }
    }
}

impl EditorSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from `path`, or return defaults if the file is missing
    /// or malformed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read settings file, using defaults: {}", e);
                return Self::default();
            }
        };

        match Self::from_json(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse settings file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Tolerance actually used for hit-testing; negative or non-finite
    /// values fall back to the default
    pub fn tolerance(&self) -> f64 {
        if self.tolerance_px.is_finite() && self.tolerance_px >= 0.0 {
            self.tolerance_px
        } else {
            DEFAULT_TOLERANCE_PX
        }
    }

    /// Create an empty document using the configured identity strategy
    pub fn new_document(&self) -> TableDocument {
        TableDocument::with_identities(self.identity)
    }
}
