//! Banlingkit Express API wire models
//!
//! These structs mirror the carrier's JSON schema byte for byte, including its
//! quirks (`contry` really is how the schema spells "country"). They never
//! leave this module family; the mapper converts them to domain types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// Shipment creation payload. The endpoint takes an array containing exactly
/// one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireShipmentRequest {
    pub storehouse_code: String,
    /// Order/picking reference with `/` replaced by `-`; must stay unique and
    /// path-safe, the carrier rejects slashes
    pub source_code: String,
    pub currency: String,
    pub invoice_price: f64,
    pub need_pack: bool,
    pub consignee: String,
    pub tel: String,
    /// Carrier schema misspelling, kept on purpose
    #[serde(rename = "contry")]
    pub country: String,
    pub province: String,
    pub city: String,
    /// Street address
    pub detail: String,
    pub post_code: String,
    pub email: String,
    pub comments: Option<String>,
    pub items: Vec<WireGoodsItem>,
}

/// One declared goods line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGoodsItem {
    pub declared_name: String,
    pub declared_en_name: String,
    pub declared_specification: String,
    pub declared_en_specification: String,
    pub quantity: f64,
    pub bar_code: String,
}

/// Pickup window request body for `PUT /invoice/lists`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePickupRequest {
    /// `yyyy-mm-dd`
    pub delivery_date: String,
    /// `HH:MM`
    pub min_hour: String,
    /// `HH:MM`
    pub max_hour: String,
}

/// Manifest report request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReportRequest {
    pub process_code: String,
    pub document_kind_code: String,
    pub from_date: String,
    pub to_date: String,
}

/// Query string of the label-fetch endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WireLabelQuery {
    #[serde(rename = "icID")]
    pub ic_id: String,
    pub signature: String,
    pub timestamp: String,
    /// Semicolon-joined tracking codes
    #[serde(rename = "cNos")]
    pub c_nos: String,
    /// Template name for the sheet arrangement
    pub ptemp: String,
    pub kind: String,
    pub offset: i32,
}

// ============================================================================
// Responses
// ============================================================================

/// Generic envelope of the `/invoice/*` endpoints. `code == 1` is the success
/// sentinel.
#[derive(Debug, Deserialize)]
pub struct WireEnvelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

pub const ENVELOPE_OK: i32 = 1;

/// Error entry inside an envelope's data list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFault {
    pub error_code: String,
    pub error_message: String,
}

/// Base64-encoded document entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    pub file_name: String,
    /// Base64 file bytes
    pub file_content: String,
}

/// Tracking entry as the carrier reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrackingEvent {
    /// `yyyy-mm-dd HH:MM:SS`, carrier-local time treated as UTC
    pub status_date_time: String,
    pub status_code: String,
    pub status_description: String,
    #[serde(default)]
    pub incident_code: Option<String>,
    #[serde(default)]
    pub incident_description: Option<String>,
}

/// Label endpoint response. This endpoint predates the `/invoice` envelope and
/// uses PascalCase with zero as its success sentinel.
#[derive(Debug, Deserialize)]
pub struct WireLabelResponse {
    #[serde(rename = "ErrorCode")]
    pub error_code: i32,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    #[serde(rename = "Data", default)]
    pub data: Vec<WireDocument>,
}

pub const LABEL_OK: i32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipment_request_wire_names() {
        let request = WireShipmentRequest {
            storehouse_code: "ST00002".to_string(),
            source_code: "S00042-WH-OUT-00017".to_string(),
            currency: "EUR".to_string(),
            invoice_price: 59.8,
            need_pack: false,
            consignee: "Jane Doe".to_string(),
            tel: "555-0101".to_string(),
            country: "Spain".to_string(),
            province: "Madrid".to_string(),
            city: "Madrid".to_string(),
            detail: "Calle Mayor 1".to_string(),
            post_code: "28013".to_string(),
            email: "jane@example.com".to_string(),
            comments: None,
            items: vec![WireGoodsItem {
                declared_name: "杯子".to_string(),
                declared_en_name: "Mug".to_string(),
                declared_specification: "350ml".to_string(),
                declared_en_specification: "350ml".to_string(),
                quantity: 2.0,
                bar_code: "MUG-350".to_string(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        // The carrier schema misspells "country" and camelCases the rest
        assert!(json.get("contry").is_some());
        assert!(json.get("country").is_none());
        assert_eq!(json["sourceCode"], "S00042-WH-OUT-00017");
        assert_eq!(json["postCode"], "28013");
        assert_eq!(json["items"][0]["barCode"], "MUG-350");
        assert_eq!(json["items"][0]["declaredEnName"], "Mug");
        assert_eq!(json["needPack"], false);
    }

    #[test]
    fn test_envelope_with_documents() {
        let body = r#"{"code":1,"message":"ok","data":[{"fileName":"a.pdf","fileContent":"JVBERg=="}]}"#;
        let envelope: WireEnvelope<Vec<WireDocument>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.code, ENVELOPE_OK);
        assert_eq!(envelope.data.unwrap()[0].file_name, "a.pdf");
    }

    #[test]
    fn test_envelope_without_data() {
        let body = r#"{"code":-2,"message":"invalid salt"}"#;
        let envelope: WireEnvelope<Vec<WireFault>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.code, -2);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_label_response_sentinel() {
        let body = r#"{"ErrorCode":0,"Data":[{"fileName":"x.pdf","fileContent":""}]}"#;
        let response: WireLabelResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.error_code, LABEL_OK);
        assert_eq!(response.data.len(), 1);
    }
}
