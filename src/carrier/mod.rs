//! Carrier integration module
//!
//! ```text
//!   ShippingService ──> BanlingkitClient ──> CarrierHttpClient ──> carrier API
//!                           │
//!                           └──> BanlingkitMapper (domain <-> wire)
//! ```

pub mod banlingkit;
pub mod http_client;
pub mod types;

// Re-export commonly used types
pub use banlingkit::{synthesize_tracking, BanlingkitClient, BanlingkitMapper, CarrierEndpoints};
pub use http_client::CarrierHttpClient;
pub use types::{CarrierCredentials, CarrierError, CarrierResult, Environment};
