//! # Session Configuration
//!
//! Page size, pricing and checkout latency for a storefront session.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_PAGE_SIZE=24                                            │
//! │     STOREFRONT_TAX_RATE=8.5          (percent)                         │
//! │     STOREFRONT_CURRENCY_SYMBOL=€                                       │
//! │     STOREFRONT_ORDER_LATENCY_MS=0                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/storefront.toml (Linux)                       │
//! │     ~/Library/Application Support/com.storefront.session/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     52 per page, 10% tax, $0.00 / $9.99 / $24.99 shipping, 2s latency  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [catalog]
//! page_size = 52
//! max_search_length = 100
//!
//! [pricing]
//! currency_symbol = "$"
//! tax_rate_bps = 1000
//! shipping_standard = "0.00"
//! shipping_express = "9.99"
//! shipping_overnight = "24.99"
//!
//! [checkout]
//! simulated_latency_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use storefront_core::{
    Money, TaxRate, DEFAULT_PAGE_SIZE, DEFAULT_TAX_RATE_BPS, MAX_SEARCH_LENGTH, MAX_SEARCH_LIMIT,
};

use crate::error::ConfigError;
use crate::order::Pricing;

// =============================================================================
// Catalog Settings
// =============================================================================

/// Catalog browsing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Products per page (1-100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Longest accepted search term, in characters.
    #[serde(default = "default_max_search_length")]
    pub max_search_length: usize,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_search_length() -> usize {
    MAX_SEARCH_LENGTH
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            page_size: default_page_size(),
            max_search_length: default_max_search_length(),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Prices as written in the file. Amounts are decimal strings so that the
/// file never goes through floating point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Tax in basis points (1000 = 10%).
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    #[serde(default = "default_shipping_standard")]
    pub shipping_standard: String,

    #[serde(default = "default_shipping_express")]
    pub shipping_express: String,

    #[serde(default = "default_shipping_overnight")]
    pub shipping_overnight: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_shipping_standard() -> String {
    "0.00".to_string()
}

fn default_shipping_express() -> String {
    "9.99".to_string()
}

fn default_shipping_overnight() -> String {
    "24.99".to_string()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            currency_symbol: default_currency_symbol(),
            tax_rate_bps: default_tax_rate_bps(),
            shipping_standard: default_shipping_standard(),
            shipping_express: default_shipping_express(),
            shipping_overnight: default_shipping_overnight(),
        }
    }
}

impl PricingSettings {
    /// Parses the amounts into a [`Pricing`].
    pub fn pricing(&self) -> Result<Pricing, ConfigError> {
        let amount = |key: &str, value: &str| -> Result<Money, ConfigError> {
            value
                .parse::<Money>()
                .map_err(|e| ConfigError::Invalid(format!("pricing.{}: {}", key, e)))
        };

        Ok(Pricing {
            currency_symbol: self.currency_symbol.clone(),
            tax_rate: TaxRate::from_bps(self.tax_rate_bps),
            shipping_standard: amount("shipping_standard", &self.shipping_standard)?,
            shipping_express: amount("shipping_express", &self.shipping_express)?,
            shipping_overnight: amount("shipping_overnight", &self.shipping_overnight)?,
        })
    }
}

// =============================================================================
// Checkout Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// How long the simulated order backend takes to answer.
    #[serde(default = "default_simulated_latency")]
    pub simulated_latency_ms: u64,
}

fn default_simulated_latency() -> u64 {
    2000
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            simulated_latency_ms: default_simulated_latency(),
        }
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Complete session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub checkout: CheckoutSettings,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Session config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.catalog.page_size) {
            return Err(ConfigError::Invalid(format!(
                "catalog.page_size must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT, self.catalog.page_size
            )));
        }

        if self.catalog.max_search_length == 0 {
            return Err(ConfigError::Invalid(
                "catalog.max_search_length must be greater than 0".into(),
            ));
        }

        if self.pricing.tax_rate_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "pricing.tax_rate_bps must be at most 10000, got {}",
                self.pricing.tax_rate_bps
            )));
        }

        self.pricing.pricing()?;
        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = lookup("STOREFRONT_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(p) => {
                    debug!(page_size = p, "Overriding page size from environment");
                    self.catalog.page_size = p;
                }
                Err(_) => warn!(value = %size, "Ignoring invalid STOREFRONT_PAGE_SIZE"),
            }
        }

        // Percent, e.g. "8.5"
        if let Some(rate) = lookup("STOREFRONT_TAX_RATE") {
            match rate.parse::<f64>() {
                Ok(pct) if (0.0..=100.0).contains(&pct) => {
                    let bps = TaxRate::from_percentage(pct).bps();
                    debug!(tax_rate_bps = bps, "Overriding tax rate from environment");
                    self.pricing.tax_rate_bps = bps;
                }
                _ => warn!(value = %rate, "Ignoring invalid STOREFRONT_TAX_RATE"),
            }
        }

        if let Some(symbol) = lookup("STOREFRONT_CURRENCY_SYMBOL") {
            self.pricing.currency_symbol = symbol;
        }

        if let Some(latency) = lookup("STOREFRONT_ORDER_LATENCY_MS") {
            match latency.parse::<u64>() {
                Ok(ms) => {
                    debug!(latency_ms = ms, "Overriding order latency from environment");
                    self.checkout.simulated_latency_ms = ms;
                }
                Err(_) => warn!(value = %latency, "Ignoring invalid STOREFRONT_ORDER_LATENCY_MS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "session")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn page_size(&self) -> u32 {
        self.catalog.page_size
    }

    pub fn order_latency(&self) -> Duration {
        Duration::from_millis(self.checkout.simulated_latency_ms)
    }

    /// Parsed pricing. Falls back to the default prices if the configured
    /// amounts do not parse, which `validate` would have rejected.
    pub fn pricing(&self) -> Pricing {
        self.pricing.pricing().unwrap_or_else(|e| {
            warn!("Invalid pricing config: {}. Using default prices.", e);
            Pricing::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.page_size(), 52);
        assert_eq!(config.order_latency(), Duration::from_millis(2000));
        assert_eq!(config.pricing(), Pricing::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = SessionConfig::from_toml(
            r#"
            [catalog]
            page_size = 24

            [pricing]
            shipping_express = "12.50"
            "#,
        )
        .unwrap();

        assert_eq!(config.page_size(), 24);
        assert_eq!(config.catalog.max_search_length, 100);
        assert_eq!(config.pricing().shipping_express.cents(), 1250);
        assert_eq!(config.pricing().shipping_overnight.cents(), 2499);
        assert_eq!(config.checkout.simulated_latency_ms, 2000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SessionConfig::default();

        config.catalog.page_size = 0;
        assert!(config.validate().is_err());
        config.catalog.page_size = 101;
        assert!(config.validate().is_err());
        config.catalog.page_size = 100;
        assert!(config.validate().is_ok());

        config.pricing.shipping_overnight = "24.999".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.pricing.shipping_overnight = "24.99".to_string();

        config.pricing.tax_rate_bps = 10_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOREFRONT_PAGE_SIZE", "12"),
            ("STOREFRONT_TAX_RATE", "8.5"),
            ("STOREFRONT_CURRENCY_SYMBOL", "€"),
            ("STOREFRONT_ORDER_LATENCY_MS", "soon"),
        ]
        .into_iter()
        .collect();

        let mut config = SessionConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.page_size(), 12);
        assert_eq!(config.pricing.tax_rate_bps, 850);
        assert_eq!(config.pricing().format(Money::from_cents(999)), "€9.99");
        // unparsable value ignored
        assert_eq!(config.checkout.simulated_latency_ms, 2000);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let err = SessionConfig::from_toml("[catalog]\npage_size = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!(
            "storefront-missing-{}.toml",
            uuid::Uuid::new_v4()
        ));
        let config = SessionConfig::load_or_default(Some(path));
        assert_eq!(config.catalog, CatalogSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("storefront-{}", uuid::Uuid::new_v4()));
        let path = dir.join("storefront.toml");

        let mut config = SessionConfig::default();
        config.catalog.page_size = 30;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[catalog]"));
        assert!(contents.contains("[pricing]"));

        let loaded = SessionConfig::from_toml(&contents).unwrap();
        assert_eq!(loaded.catalog.page_size, 30);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
