//! Domain types and models

pub mod fulfillment;
pub mod shipment;

pub use fulfillment::{Address, AuditNote, DeliveryState, Fulfillment, OrderLine};
pub use shipment::{
    CarrierFault, DocumentFormat, DocumentLayout, LabelDocument, ManifestFormat, ShipmentResult,
    TrackingEvent,
};
