//! Configuration module for the shipping integration service

use config::{Config, ConfigError, Environment as EnvSource, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::carrier::{CarrierEndpoints, Environment};
use crate::domain::{DocumentFormat, DocumentLayout};

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub label: LabelSettings,
    #[serde(default)]
    pub carrier: CarrierSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Local label rendering configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelSettings {
    /// TTF font able to render the destination script. Labels for CJK
    /// destinations come out blank without one.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// "portrait" (100x150) or "landscape" (150x80)
    #[serde(default)]
    pub orientation: Option<String>,
}

/// Carrier configuration: shared endpoints plus one entry per contracted
/// account.
#[derive(Debug, Clone, Deserialize)]
pub struct CarrierSettings {
    #[serde(default)]
    pub endpoints: CarrierEndpoints,
    #[serde(default)]
    pub accounts: Vec<CarrierAccountSettings>,
}

/// One credentialed contract with the carrier.
#[derive(Debug, Clone, Deserialize)]
pub struct CarrierAccountSettings {
    /// Account code pickings refer to (`carrier_code` on the record)
    pub code: String,
    pub client_id: String,
    pub salt: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_storehouse")]
    pub storehouse_code: String,
    #[serde(default)]
    pub document_layout: DocumentLayout,
    #[serde(default)]
    pub document_format: DocumentFormat,
    #[serde(default)]
    pub document_offset: i32,
}

fn default_storehouse() -> String {
    "ST00002".to_string()
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with SHIPPING_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                EnvSource::with_prefix("SHIPPING")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

impl Default for CarrierSettings {
    fn default() -> Self {
        CarrierSettings {
            endpoints: CarrierEndpoints::default(),
            accounts: Vec::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings::default(),
            label: LabelSettings::default(),
            carrier: CarrierSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_settings_deserialize_with_defaults() {
        let toml = r#"
            code = "bl-main"
            client_id = "000002ODOO1"
            salt = "s3cret"
        "#;
        let account: CarrierAccountSettings = toml::from_str(toml).unwrap();
        assert_eq!(account.environment, Environment::Test);
        assert_eq!(account.storehouse_code, "ST00002");
        assert_eq!(account.document_layout, DocumentLayout::Single);
        assert_eq!(account.document_format, DocumentFormat::Pdf);
        assert_eq!(account.document_offset, 0);
    }

    #[test]
    fn test_account_settings_full() {
        let toml = r#"
            code = "bl-prod"
            client_id = "000002ODOO1"
            salt = "s3cret"
            environment = "prod"
            document_layout = "MULTI3"
            document_format = "PNG"
            document_offset = 2
        "#;
        let account: CarrierAccountSettings = toml::from_str(toml).unwrap();
        assert_eq!(account.environment, Environment::Prod);
        assert_eq!(account.document_layout, DocumentLayout::Multi3);
        assert_eq!(account.document_format, DocumentFormat::Png);
    }
}
