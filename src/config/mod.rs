// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for QuakeGuard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::{BoundingBox, MAX_LOOKBACK_HOURS};
use crate::risk::RiskThresholds;
use crate::{QuakeGuardError, Result};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Seismic catalog endpoint
    pub catalog: CatalogConfig,

    /// Defaults applied when a request omits a parameter
    #[serde(default)]
    pub query: QueryDefaults,

    /// Aggregate scoring table
    #[serde(default)]
    pub thresholds: RiskThresholds,

    /// Named region lookup table
    #[serde(default = "default_regions")]
    pub regions: BTreeMap<String, BoundingBox>,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,

    /// Language model settings for briefings
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_detailed_limit")]
    pub detailed_limit: u32,
    #[serde(default = "default_brief_limit")]
    pub brief_limit: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryDefaults {
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    #[serde(default = "default_hours")]
    pub hours: u32,
    #[serde(default = "default_true")]
    pub detailed: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Provider key; briefings are disabled while unset
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_timeout() -> u64 { 30 }
fn default_detailed_limit() -> u32 { 500 }
fn default_brief_limit() -> u32 { 200 }
fn default_min_magnitude() -> f64 { 2.5 }
fn default_hours() -> u32 { 24 }
fn default_true() -> bool { true }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }
fn default_llm_url() -> String { "https://api.groq.com/openai/v1".to_string() }
fn default_llm_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_max_tokens() -> u32 { 2048 }
fn default_temperature() -> f32 { 0.7 }
fn default_top_p() -> f32 { 0.9 }
fn default_llm_timeout() -> u64 { 120 }

fn default_regions() -> BTreeMap<String, BoundingBox> {
    [
        ("Alaska", -179.9, 51.2, -129.9, 71.4),
        ("California", -124.5, 32.5, -114.0, 42.0),
        ("Chile", -75.7, -56.0, -66.4, -17.5),
        ("Indonesia", 95.0, -11.0, 141.0, 6.0),
        ("Italy", 6.6, 35.5, 18.5, 47.1),
        ("Japan", 122.9, 24.0, 146.0, 45.6),
        ("Mexico", -117.1, 14.5, -86.7, 32.7),
        ("Nepal", 80.0, 26.3, 88.2, 30.5),
        ("New Zealand", 166.4, -47.3, 178.6, -34.4),
        ("Pakistan", 60.9, 23.6, 77.8, 37.1),
        ("Philippines", 116.9, 4.6, 126.6, 21.1),
        ("Turkey", 26.0, 35.8, 45.0, 42.1),
    ]
    .into_iter()
    .map(|(name, min_lon, min_lat, max_lon, max_lat)| {
        (name.to_string(), BoundingBox { min_lon, min_lat, max_lon, max_lat })
    })
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            query: QueryDefaults::default(),
            thresholds: RiskThresholds::default(),
            regions: default_regions(),
            web: WebConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: "https://earthquake.usgs.gov/fdsnws/event/1/query".to_string(),
            timeout_secs: default_timeout(),
            detailed_limit: default_detailed_limit(),
            brief_limit: default_brief_limit(),
        }
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            min_magnitude: default_min_magnitude(),
            hours: default_hours(),
            detailed: true,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_llm_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| QuakeGuardError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check thresholds, regions and query defaults for consistency
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        for (name, bbox) in &self.regions {
            bbox.validate()
                .map_err(|e| QuakeGuardError::Config(format!("region '{}': {}", name, e)))?;
        }

        if !(self.query.min_magnitude >= 0.0) {
            return Err(QuakeGuardError::Config(
                "query.min_magnitude must be a non-negative number".to_string(),
            ));
        }
        if self.query.hours == 0 || self.query.hours > MAX_LOOKBACK_HOURS {
            return Err(QuakeGuardError::Config(format!(
                "query.hours must be between 1 and {}", MAX_LOOKBACK_HOURS
            )));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(QuakeGuardError::Config("catalog.timeout_secs must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Look up a named region, ignoring case and surrounding whitespace
    pub fn lookup_region(&self, name: &str) -> Option<BoundingBox> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.regions
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, bbox)| *bbox)
    }

    /// Result limit for a detailed or brief fetch
    pub fn limit_for(&self, detailed: bool) -> u32 {
        if detailed {
            self.catalog.detailed_limit
        } else {
            self.catalog.brief_limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.limit_for(true), 500);
        assert_eq!(config.limit_for(false), 200);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_region_lookup_ignores_case() {
        let config = AppConfig::default();
        let bbox = config.lookup_region("  california ").unwrap();
        assert_eq!(bbox.min_lon, -124.5);
        assert!(config.lookup_region("new zealand").is_some());
        assert!(config.lookup_region("Atlantis").is_none());
        assert!(config.lookup_region("").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.web.port = 9191;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.web.port, 9191);
        assert_eq!(loaded.regions.len(), config.regions.len());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded.query.hours, 24);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"catalog": {"url": "http://localhost:9000/query"}}"#).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.catalog.url, "http://localhost:9000/query");
        assert_eq!(loaded.catalog.timeout_secs, 30);
        assert!(loaded.lookup_region("Japan").is_some());
    }

    #[test]
    fn test_rejects_bad_region() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"catalog": {"url": "http://x"},
                "regions": {"Broken": {"min_lon": 10.0, "min_lat": 0.0, "max_lon": 5.0, "max_lat": 1.0}}}"#,
        )
        .unwrap();

        assert!(matches!(AppConfig::load(&path), Err(QuakeGuardError::Config(_))));
    }

    #[test]
    fn test_rejects_oversized_lookback() {
        let mut config = AppConfig::default();
        config.query.hours = MAX_LOOKBACK_HOURS + 1;
        assert!(matches!(config.validate(), Err(QuakeGuardError::Config(_))));
    }
}
