//! Carrier contract: error types and credentials
//!
//! Every client/adapter operation returns a `CarrierResult`. Expected failure
//! modes (carrier rejection, unknown tracking code) are values of
//! [`CarrierError`], not panics; transport failures keep their own variant so
//! callers can tell a dead endpoint from a rejected shipment.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::CarrierFault;

// ============================================================================
// Error Types
// ============================================================================

/// Carrier integration error types
#[derive(Debug, Error)]
pub enum CarrierError {
    /// Network-level failure (timeout, connection refused, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response from the carrier endpoint
    #[error("carrier API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// 200 response carrying a non-empty (code, description) error list
    #[error("carrier rejected the request: {}", format_faults(.0))]
    Rejected(Vec<CarrierFault>),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Re-shipment attempted on a picking already tracked under this carrier
    #[error("picking {picking} already has tracking number {tracking}")]
    AlreadyShipped { picking: String, tracking: String },

    #[error("carrier account not configured: {0}")]
    NotConfigured(String),

    /// Local label rendering failed
    #[error("label rendering failed: {0}")]
    Render(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn format_faults(faults: &[CarrierFault]) -> String {
    faults
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for carrier operations
pub type CarrierResult<T> = Result<T, CarrierError>;

// ============================================================================
// Credentials
// ============================================================================

/// Carrier endpoint environment. Test and prod currently resolve to the same
/// host at the carrier's side, but the selection stays configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    Prod,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Test
    }
}

/// Immutable per-account credentials, passed by reference into every client
/// call. The `salt` is secret and must never reach the logs verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CarrierCredentials {
    /// API client ID, also the prefix of every synthesized tracking code
    pub client_id: String,
    /// API secret sent as the `salt` request header
    pub salt: String,
    pub environment: Environment,
}

impl CarrierCredentials {
    pub fn new(client_id: impl Into<String>, salt: impl Into<String>, environment: Environment) -> Self {
        CarrierCredentials {
            client_id: client_id.into(),
            salt: salt.into(),
            environment,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.salt.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_configured() {
        let creds = CarrierCredentials::new("000002ODOO1", "s3cret", Environment::Test);
        assert!(creds.is_configured());
        let empty = CarrierCredentials::new("", "", Environment::Prod);
        assert!(!empty.is_configured());
    }

    #[test]
    fn test_rejected_error_formats_fault_list() {
        let err = CarrierError::Rejected(vec![
            CarrierFault {
                code: "12".to_string(),
                description: "Bad postcode".to_string(),
            },
            CarrierFault {
                code: "40".to_string(),
                description: "Unknown storehouse".to_string(),
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("[12] Bad postcode"));
        assert!(text.contains("[40] Unknown storehouse"));
    }

    #[test]
    fn test_environment_deserializes_lowercase() {
        let env: Environment = serde_json::from_str("\"prod\"").unwrap();
        assert_eq!(env, Environment::Prod);
    }
}
