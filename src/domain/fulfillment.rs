//! Fulfillment (picking) records handed over by the host order-management system.
//!
//! The surrounding ERP owns these records; this service only receives them as
//! plain data, writes carrier results back onto them and serves them out again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::shipment::LabelDocument;

/// Postal address block used for senders and recipients alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// One traded product line on a fulfillment.
///
/// `qty_done` is the fulfilled quantity; the carrier is told what actually
/// ships, not what was ordered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    /// Declared name in the destination-local script
    pub name: String,
    /// Declared name in English
    pub name_en: String,
    #[serde(default)]
    pub specification: Option<String>,
    #[serde(default)]
    pub specification_en: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    pub unit_price: f64,
    pub qty_ordered: f64,
    pub qty_done: f64,
}

/// Internal delivery state derived from the carrier's tracking feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    ShippingRecorded,
    InTransit,
    CanceledShipment,
    WarehouseDelivered,
    CustomerDelivered,
    Incidence,
    /// Nothing shipped yet
    Unknown,
}

impl Default for DeliveryState {
    fn default() -> Self {
        DeliveryState::Unknown
    }
}

/// Chatter-style audit note posted onto a fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditNote {
    pub at: DateTime<Utc>,
    pub body: String,
}

/// A warehouse pick/pack/ship record tied to an order.
///
/// Keyed by its picking reference (e.g. `WH/OUT/00017`). The tracking code,
/// once assigned by [`crate::shipping::ShippingService`], is the external key
/// for every subsequent carrier operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Fulfillment {
    /// Picking reference, unique within the host system
    pub name: String,
    /// Originating sale order reference, when the picking belongs to one
    #[serde(default)]
    pub order_ref: Option<String>,
    /// Carrier account code this picking ships under
    pub carrier_code: String,
    /// ISO currency code of the order
    pub currency: String,
    /// Delivery contact
    pub recipient: Address,
    /// Commercial entity behind the delivery contact, used as fallback for
    /// name/phone/email when the contact record is incomplete
    #[serde(default)]
    pub recipient_entity: Option<Address>,
    /// Address of the warehouse the picking ships from, if it has one
    #[serde(default)]
    pub warehouse_address: Option<Address>,
    /// Owning company's address, the sender fallback
    pub company_address: Address,
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub delivery_state: DeliveryState,
    /// Newline-joined tracking history, oldest event first
    #[serde(default)]
    pub tracking_history: Option<String>,
    #[serde(default)]
    pub attachments: Vec<LabelDocument>,
    #[serde(default)]
    pub notes: Vec<AuditNote>,
    #[serde(default)]
    pub shipped_at: Option<DateTime<Utc>>,
}

impl Fulfillment {
    /// Shipment reference sent to the carrier: order and picking reference
    /// joined with a dash, or just the picking reference for standalone
    /// pickings.
    pub fn reference(&self) -> String {
        match &self.order_ref {
            Some(order) => format!("{}-{}", order, self.name),
            None => self.name.clone(),
        }
    }

    /// Sender address: warehouse-specific when available, company otherwise.
    pub fn sender(&self) -> &Address {
        self.warehouse_address.as_ref().unwrap_or(&self.company_address)
    }

    /// Post an audit note, mirroring the host system's chatter messages.
    pub fn post_note(&mut self, body: impl Into<String>) {
        self.notes.push(AuditNote {
            at: Utc::now(),
            body: body.into(),
        });
    }
}
