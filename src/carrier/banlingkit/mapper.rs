//! Fulfillment to Banlingkit wire-model mapper
//!
//! Pure conversions between the domain records and the carrier's JSON schema.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::carrier::types::{CarrierError, CarrierResult};
use crate::domain::{CarrierFault, Fulfillment, LabelDocument, TrackingEvent};

use super::models::{WireDocument, WireFault, WireGoodsItem, WireShipmentRequest, WireTrackingEvent};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Mapper for Banlingkit payloads and responses
pub struct BanlingkitMapper;

impl BanlingkitMapper {
    /// Derive the carrier source code from a shipment reference. The carrier
    /// rejects `/` in codes, so every occurrence becomes `-`.
    pub fn source_code(reference: &str) -> String {
        reference.replace('/', "-")
    }

    /// Build the shipment creation payload for a picking.
    ///
    /// Invoice price is the sum of `unit_price * qty_done` over the lines;
    /// goods entries mirror the picking's lines 1:1 with the fulfilled
    /// quantity.
    pub fn build_shipment_request(picking: &Fulfillment, storehouse_code: &str) -> WireShipmentRequest {
        let recipient = &picking.recipient;
        let entity = picking.recipient_entity.as_ref();

        let items: Vec<WireGoodsItem> = picking
            .lines
            .iter()
            .map(|line| WireGoodsItem {
                declared_name: line.name.clone(),
                declared_en_name: line.name_en.clone(),
                declared_specification: line.specification.clone().unwrap_or_default(),
                declared_en_specification: line.specification_en.clone().unwrap_or_default(),
                quantity: line.qty_done,
                bar_code: line.barcode.clone().unwrap_or_default(),
            })
            .collect();

        let invoice_price: f64 = picking
            .lines
            .iter()
            .map(|line| line.unit_price * line.qty_done)
            .sum();

        // Contact fields fall back from the delivery contact to its
        // commercial entity
        let consignee = non_empty(&recipient.name)
            .or_else(|| entity.and_then(|e| non_empty(&e.name)))
            .unwrap_or_default();
        let tel = recipient
            .phone
            .clone()
            .or_else(|| entity.and_then(|e| e.phone.clone()))
            .unwrap_or_default();
        let email = recipient
            .email
            .clone()
            .or_else(|| entity.and_then(|e| e.email.clone()))
            .unwrap_or_default();

        WireShipmentRequest {
            storehouse_code: storehouse_code.to_string(),
            source_code: Self::source_code(&picking.reference()),
            currency: picking.currency.clone(),
            invoice_price,
            need_pack: false,
            consignee,
            tel,
            country: recipient.country.clone().unwrap_or_default(),
            province: recipient.province.clone().unwrap_or_default(),
            city: recipient.city.clone().unwrap_or_default(),
            detail: recipient.street.clone().unwrap_or_default(),
            post_code: recipient.zip.clone().unwrap_or_default(),
            email,
            comments: None,
            items,
        }
    }

    /// Map a wire error list to domain faults.
    pub fn map_faults(faults: Vec<WireFault>) -> Vec<CarrierFault> {
        faults
            .into_iter()
            .map(|f| CarrierFault {
                code: f.error_code,
                description: f.error_message,
            })
            .collect()
    }

    /// Decode a wire document into its raw bytes.
    pub fn map_document(document: WireDocument, mime_type: &str) -> CarrierResult<LabelDocument> {
        let content = BASE64
            .decode(document.file_content.as_bytes())
            .map_err(|e| CarrierError::Parse(format!("document {}: {}", document.file_name, e)))?;
        Ok(LabelDocument {
            file_name: document.file_name,
            content,
            mime_type: mime_type.to_string(),
        })
    }

    /// Map a wire tracking entry, parsing the carrier's timestamp format.
    pub fn map_tracking_event(event: WireTrackingEvent) -> CarrierResult<TrackingEvent> {
        let naive = NaiveDateTime::parse_from_str(&event.status_date_time, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| {
                CarrierError::Parse(format!("tracking timestamp {:?}: {}", event.status_date_time, e))
            })?;
        Ok(TrackingEvent {
            timestamp: DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            status_code: event.status_code,
            status_description: event.status_description,
            incident_code: event.incident_code.filter(|c| !c.is_empty()),
            incident_description: event.incident_description.filter(|d| !d.is_empty()),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
