//! Shipment-level value types shared between the carrier client and the
//! orchestration layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One (code, description) pair reported by the carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CarrierFault {
    pub code: String,
    pub description: String,
}

impl std::fmt::Display for CarrierFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)
    }
}

/// Outcome of a successful shipment creation call. Carrier rejections never
/// reach this type; they surface as errors.
#[derive(Debug, Clone)]
pub struct ShipmentResult {
    /// Ready-made labels, when the carrier returns any. May be empty.
    pub documents: Vec<LabelDocument>,
    /// Synthesized as `client_id + source_code`; the carrier does not mint
    /// its own codes on creation.
    pub tracking_code: String,
}

/// One entry in a shipment's tracking history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    pub status_code: String,
    pub status_description: String,
    #[serde(default)]
    pub incident_code: Option<String>,
    #[serde(default)]
    pub incident_description: Option<String>,
}

impl TrackingEvent {
    /// Render the event as one audit-history line.
    pub fn history_line(&self) -> String {
        let mut line = format!(
            "{} - [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.status_code,
            self.status_description,
        );
        if let Some(incident) = &self.incident_code {
            line.push_str(&format!(
                " ({}) - {}",
                incident,
                self.incident_description.as_deref().unwrap_or(""),
            ));
        }
        line
    }
}

/// A fetched or locally rendered shipping document.
///
/// Ephemeral: produced on demand, then persisted as an attachment on the
/// fulfillment record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LabelDocument {
    pub file_name: String,
    /// Raw file bytes, base64 over the wire
    #[serde(with = "b64_bytes")]
    #[schema(value_type = String, format = "byte")]
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// Serde helper: binary attachment content travels as base64.
mod b64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Sheet arrangement of carrier-hosted labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentLayout {
    /// Thermal single-label printer
    Single,
    /// Sheet format, 1 label per sheet
    Multi1,
    /// Portrait, 3 labels per sheet
    Multi3,
    /// Landscape, 4 labels per sheet
    Multi4,
}

impl DocumentLayout {
    /// Template name the label endpoint expects for this arrangement.
    pub fn template_name(&self) -> &'static str {
        match self {
            DocumentLayout::Single => "label10x15_1",
            DocumentLayout::Multi1 => "label_a4_1",
            DocumentLayout::Multi3 => "label_a4_3",
            DocumentLayout::Multi4 => "label_a4_4",
        }
    }
}

impl Default for DocumentLayout {
    fn default() -> Self {
        DocumentLayout::Single
    }
}

/// File format of carrier-hosted labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentFormat {
    Pdf,
    Png,
    Bmp,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Png => "PNG",
            DocumentFormat::Bmp => "BMP",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Png => "image/png",
            DocumentFormat::Bmp => "image/bmp",
        }
    }
}

impl Default for DocumentFormat {
    fn default() -> Self {
        DocumentFormat::Pdf
    }
}

/// Manifest report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ManifestFormat {
    Xlsx,
    Pdf,
}

impl ManifestFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestFormat::Xlsx => "XLSX",
            ManifestFormat::Pdf => "PDF",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ManifestFormat::Xlsx => "xlsx",
            ManifestFormat::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_history_line_plain() {
        let event = TrackingEvent {
            timestamp: Utc.with_ymd_and_hms(2023, 4, 7, 9, 30, 0).unwrap(),
            status_code: "2".to_string(),
            status_description: "In transit".to_string(),
            incident_code: None,
            incident_description: None,
        };
        assert_eq!(event.history_line(), "2023-04-07 09:30:00 - [2] In transit");
    }

    #[test]
    fn test_history_line_with_incident() {
        let event = TrackingEvent {
            timestamp: Utc.with_ymd_and_hms(2023, 4, 8, 16, 0, 0).unwrap(),
            status_code: "9".to_string(),
            status_description: "Exception".to_string(),
            incident_code: Some("I04".to_string()),
            incident_description: Some("Address not found".to_string()),
        };
        assert_eq!(
            event.history_line(),
            "2023-04-08 16:00:00 - [9] Exception (I04) - Address not found"
        );
    }

    #[test]
    fn test_layout_template_names() {
        assert_eq!(DocumentLayout::Single.template_name(), "label10x15_1");
        assert_eq!(DocumentLayout::Multi4.template_name(), "label_a4_4");
    }

    #[test]
    fn test_label_document_base64_round_trip() {
        let doc = LabelDocument {
            file_name: "X.pdf".to_string(),
            content: vec![0x25, 0x50, 0x44, 0x46],
            mime_type: "application/pdf".to_string(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["content"], "JVBERg==");
        let back: LabelDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.content, doc.content);
    }
}
