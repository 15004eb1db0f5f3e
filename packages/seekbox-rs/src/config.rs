//! Runtime configuration: JSON file, then environment, then command line.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use seekbox_vision::{FilterPolicy, DEFAULT_BLOCKED_KEYWORDS, DEFAULT_MIN_CONFIDENCE};

use crate::crop_search::SearchMode;
use crate::detection::DetectionMode;
use crate::http::IMGBB_UPLOAD_URL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the detection/search API.
    pub api_url: String,
    pub imgbb_api_key: Option<String>,
    pub upload_url: String,
    /// Width the image is displayed at; height follows the aspect ratio.
    pub rendered_width: f64,
    pub image_load_timeout_secs: u64,
    pub min_confidence: f64,
    pub blocked_keywords: Vec<String>,
    pub search_mode: SearchMode,
    pub detection_mode: DetectionMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            imgbb_api_key: None,
            upload_url: IMGBB_UPLOAD_URL.to_string(),
            rendered_width: 500.0,
            image_load_timeout_secs: 7,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            blocked_keywords: DEFAULT_BLOCKED_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            search_mode: SearchMode::default(),
            detection_mode: DetectionMode::default(),
        }
    }
}

impl Config {
    /// Reads `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&contents).context("Failed to parse config JSON")?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `SEEKBOX_API_URL` wins over `API_URL`; `IMGBB_API_KEY` sets the upload key.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty("SEEKBOX_API_URL").or_else(|| non_empty("API_URL")) {
            self.api_url = url;
        }
        if let Some(key) = non_empty("IMGBB_API_KEY") {
            self.imgbb_api_key = Some(key);
        }
    }

    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy {
            min_confidence: self.min_confidence,
            blocked_keywords: self.blocked_keywords.clone(),
        }
    }

    pub fn image_load_timeout(&self) -> Duration {
        Duration::from_secs(self.image_load_timeout_secs)
    }
}
