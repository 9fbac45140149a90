//! Banlingkit Express API client
//!
//! One method per carrier operation, all single-attempt HTTP round-trips
//! (no retries, no queueing). Credentials are passed into every call as an
//! immutable value; the client itself holds no credential state.

use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::carrier::http_client::{log_response_body, CarrierHttpClient};
use crate::carrier::types::{CarrierCredentials, CarrierError, CarrierResult, Environment};
use crate::domain::{
    CarrierFault, DocumentFormat, DocumentLayout, LabelDocument, ManifestFormat, ShipmentResult,
    TrackingEvent,
};

use super::mapper::BanlingkitMapper;
use super::models::{
    WireDocument, WireEnvelope, WireFault, WireLabelQuery, WireLabelResponse, WirePickupRequest,
    WireReportRequest, WireShipmentRequest, WireTrackingEvent, ENVELOPE_OK, LABEL_OK,
};

/// Carrier endpoint set. Test and prod are separately configurable even
/// though the carrier currently serves both from one host.
#[derive(Debug, Clone, Deserialize)]
pub struct CarrierEndpoints {
    pub test: String,
    pub prod: String,
    /// Label-fetch service, a separate host from the invoice API
    pub label: String,
    /// Public tracking page, used to build customer-facing links
    pub tracking_page: String,
}

impl Default for CarrierEndpoints {
    fn default() -> Self {
        CarrierEndpoints {
            test: "http://admin.banlingkit.com:8012".to_string(),
            prod: "http://admin.banlingkit.com:8012".to_string(),
            label: "https://label.banlingkit.com/BanlingkitPrint".to_string(),
            tracking_page: "http://admin.banlingwuliu.com:8010/tracks/track-search.html".to_string(),
        }
    }
}

/// Tracking codes are synthesized client-side: the API acknowledges creation
/// but does not always return a server-generated code.
pub fn synthesize_tracking(client_id: &str, source_code: &str) -> String {
    format!("{}{}", client_id, source_code)
}

/// Banlingkit Express API client
pub struct BanlingkitClient {
    /// Rate-limited HTTP client
    http: CarrierHttpClient,

    /// Endpoint set for this deployment
    endpoints: CarrierEndpoints,
}

impl BanlingkitClient {
    /// Create a new client instance. 60 requests per minute keeps us well
    /// under the carrier's informal throttling threshold.
    pub fn new(endpoints: CarrierEndpoints) -> Self {
        BanlingkitClient {
            http: CarrierHttpClient::new(60),
            endpoints,
        }
    }

    fn base_url(&self, environment: Environment) -> &str {
        match environment {
            Environment::Test => &self.endpoints.test,
            Environment::Prod => &self.endpoints.prod,
        }
    }

    /// Signature for the label endpoint: hex SHA-256 over client id, salt and
    /// a millisecond timestamp.
    fn signature(credentials: &CarrierCredentials, timestamp_ms: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(credentials.client_id.as_bytes());
        hasher.update(credentials.salt.as_bytes());
        hasher.update(timestamp_ms.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Public tracking-page link for a shipment.
    pub fn tracking_link(&self, tracking_code: &str) -> String {
        format!("{}#nums={}", self.endpoints.tracking_page, tracking_code)
    }

    /// Read a response body, logging it, and fail on non-200 status. Keeps
    /// transport failures (`CarrierError::Api`/`Http`) distinct from carrier
    /// application errors raised later by envelope checks.
    async fn read_body(response: reqwest::Response) -> CarrierResult<String> {
        let status = response.status();
        let body = response.text().await?;
        log_response_body(status.as_u16(), &body);
        if !status.is_success() {
            return Err(CarrierError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> CarrierResult<T> {
        serde_json::from_str(body).map_err(|e| {
            let snippet: String = body.chars().take(500).collect();
            CarrierError::Parse(format!("{}, body: {}", e, snippet))
        })
    }

    fn envelope_fault<T>(envelope: &WireEnvelope<T>) -> CarrierFault {
        CarrierFault {
            code: envelope.code.to_string(),
            description: envelope
                .message
                .clone()
                .unwrap_or_else(|| "carrier error".to_string()),
        }
    }

    /// Create a shipment. `POST /invoice/create` takes a one-element array
    /// with the `salt` credential header.
    pub async fn create_shipment(
        &self,
        credentials: &CarrierCredentials,
        request: &WireShipmentRequest,
    ) -> CarrierResult<ShipmentResult> {
        let url = format!("{}/invoice/create", self.base_url(credentials.environment));
        debug!(source_code = %request.source_code, "creating shipment");

        let response = self
            .http
            .post(&url)
            .salt(&credentials.salt)
            .header("Accept", "application/json")
            .json(&[request])
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let envelope: WireEnvelope<Vec<WireDocument>> = Self::parse(&body)?;
        if envelope.code != ENVELOPE_OK {
            return Err(CarrierError::Rejected(vec![Self::envelope_fault(&envelope)]));
        }

        let documents = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|d| BanlingkitMapper::map_document(d, DocumentFormat::Pdf.mime_type()))
            .collect::<CarrierResult<Vec<_>>>()?;

        let tracking_code = synthesize_tracking(&credentials.client_id, &request.source_code);
        info!(tracking_code = %tracking_code, "shipment created");

        Ok(ShipmentResult {
            documents,
            tracking_code,
        })
    }

    /// Cancel a shipment by its tracking code. Returns the carrier's error
    /// list; an empty list means the cancellation went through.
    pub async fn cancel_shipment(
        &self,
        credentials: &CarrierCredentials,
        tracking_code: &str,
    ) -> CarrierResult<Vec<CarrierFault>> {
        let url = format!("{}/invoice/cancel", self.base_url(credentials.environment));

        let response = self
            .http
            .post(&url)
            .salt(&credentials.salt)
            .json(&serde_json::json!({ "cNo": tracking_code }))
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let envelope: WireEnvelope<Vec<WireFault>> = Self::parse(&body)?;
        if envelope.code != ENVELOPE_OK {
            let mut faults = BanlingkitMapper::map_faults(envelope.data.clone().unwrap_or_default());
            if faults.is_empty() {
                faults.push(Self::envelope_fault(&envelope));
            }
            return Ok(faults);
        }
        Ok(Vec::new())
    }

    /// Fetch the tracking history for a code, oldest event first. An unknown
    /// code yields an empty list, not an error.
    pub async fn get_tracking(
        &self,
        credentials: &CarrierCredentials,
        tracking_code: &str,
    ) -> CarrierResult<Vec<TrackingEvent>> {
        let url = format!("{}/invoice/tracks", self.base_url(credentials.environment));

        let response = self
            .http
            .post(&url)
            .salt(&credentials.salt)
            .json(&serde_json::json!({ "cNo": tracking_code }))
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let envelope: WireEnvelope<Vec<WireTrackingEvent>> = Self::parse(&body)?;
        if envelope.code != ENVELOPE_OK {
            return Err(CarrierError::Rejected(vec![Self::envelope_fault(&envelope)]));
        }

        envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(BanlingkitMapper::map_tracking_event)
            .collect()
    }

    /// Fetch the rendered label for one tracking code.
    pub async fn get_documents(
        &self,
        credentials: &CarrierCredentials,
        tracking_code: &str,
        layout: DocumentLayout,
        format: DocumentFormat,
        offset: i32,
    ) -> CarrierResult<Vec<LabelDocument>> {
        self.get_documents_multi(credentials, &[tracking_code.to_string()], layout, format, offset)
            .await
    }

    /// Fetch rendered labels for several tracking codes in one call. The
    /// label endpoint authenticates with a timestamped signature instead of
    /// the `salt` header.
    pub async fn get_documents_multi(
        &self,
        credentials: &CarrierCredentials,
        tracking_codes: &[String],
        layout: DocumentLayout,
        format: DocumentFormat,
        offset: i32,
    ) -> CarrierResult<Vec<LabelDocument>> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let query = WireLabelQuery {
            ic_id: credentials.client_id.clone(),
            signature: Self::signature(credentials, &timestamp),
            timestamp,
            c_nos: tracking_codes.join(";"),
            ptemp: layout.template_name().to_string(),
            kind: format.as_str().to_string(),
            offset,
        };

        let response = self.http.get(&self.endpoints.label).query(&query).send().await?;

        let body = Self::read_body(response).await?;
        let parsed: WireLabelResponse = Self::parse(&body)?;
        if parsed.error_code != LABEL_OK {
            return Err(CarrierError::Rejected(vec![CarrierFault {
                code: parsed.error_code.to_string(),
                description: parsed.message.unwrap_or_else(|| "label fetch failed".to_string()),
            }]));
        }

        parsed
            .data
            .into_iter()
            .map(|d| BanlingkitMapper::map_document(d, format.mime_type()))
            .collect()
    }

    /// Request the shipment manifest for a date range.
    pub async fn report_shipping(
        &self,
        credentials: &CarrierCredentials,
        process_code: &str,
        document_type: ManifestFormat,
        from_date: &str,
        to_date: &str,
    ) -> CarrierResult<(Vec<CarrierFault>, Vec<LabelDocument>)> {
        let url = format!("{}/invoice/report", self.base_url(credentials.environment));
        let request = WireReportRequest {
            process_code: process_code.to_string(),
            document_kind_code: document_type.as_str().to_string(),
            from_date: from_date.to_string(),
            to_date: to_date.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .salt(&credentials.salt)
            .json(&request)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let envelope: WireEnvelope<Vec<WireDocument>> = Self::parse(&body)?;
        if envelope.code != ENVELOPE_OK {
            return Ok((vec![Self::envelope_fault(&envelope)], Vec::new()));
        }

        let mime = match document_type {
            ManifestFormat::Pdf => "application/pdf",
            ManifestFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        };
        let documents = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|d| BanlingkitMapper::map_document(d, mime))
            .collect::<CarrierResult<Vec<_>>>()?;

        Ok((Vec::new(), documents))
    }

    /// Schedule a carrier pickup window. Returns the HTTP status and the
    /// pickup code the carrier assigned.
    pub async fn create_pickup_request(
        &self,
        credentials: &CarrierCredentials,
        delivery_date: &str,
        min_hour: &str,
        max_hour: &str,
    ) -> CarrierResult<(u16, String)> {
        let url = format!("{}/invoice/lists", self.base_url(credentials.environment));
        let request = WirePickupRequest {
            delivery_date: delivery_date.to_string(),
            min_hour: min_hour.to_string(),
            max_hour: max_hour.to_string(),
        };

        let response = self
            .http
            .put(&url)
            .salt(&credentials.salt)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        log_response_body(status, &body);

        // The pickup endpoint is the odd one out: a JSON envelope when it
        // succeeds, a bare string on some gateway errors.
        let code = match serde_json::from_str::<WireEnvelope<String>>(&body) {
            Ok(envelope) => envelope.data.unwrap_or_default(),
            Err(_) => body.trim().to_string(),
        };
        Ok((status, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_code_synthesis() {
        assert_eq!(
            synthesize_tracking("000002ODOO1", "S00042-WH-OUT-00017"),
            "000002ODOO1S00042-WH-OUT-00017"
        );
    }

    #[test]
    fn test_signature_is_deterministic_and_hex() {
        let creds = CarrierCredentials::new("000002ODOO1", "s3cret", Environment::Test);
        let a = BanlingkitClient::signature(&creds, "1680855653628");
        let b = BanlingkitClient::signature(&creds, "1680855653628");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        // Timestamp participates in the signature
        let c = BanlingkitClient::signature(&creds, "1680855653629");
        assert_ne!(a, c);
    }

    #[test]
    fn test_base_url_follows_environment() {
        let client = BanlingkitClient::new(CarrierEndpoints {
            test: "http://test.invalid".to_string(),
            prod: "http://prod.invalid".to_string(),
            ..Default::default()
        });
        assert_eq!(client.base_url(Environment::Test), "http://test.invalid");
        assert_eq!(client.base_url(Environment::Prod), "http://prod.invalid");
    }

    #[test]
    fn test_tracking_link() {
        let client = BanlingkitClient::new(CarrierEndpoints::default());
        assert_eq!(
            client.tracking_link("000002ODOO1S00042-WH-OUT-00017"),
            "http://admin.banlingwuliu.com:8010/tracks/track-search.html#nums=000002ODOO1S00042-WH-OUT-00017"
        );
    }

    #[test]
    fn test_envelope_fault_uses_message() {
        let envelope: WireEnvelope<Vec<WireFault>> =
            serde_json::from_str(r#"{"code":-2,"message":"invalid salt"}"#).unwrap();
        let fault = BanlingkitClient::envelope_fault(&envelope);
        assert_eq!(fault.code, "-2");
        assert_eq!(fault.description, "invalid salt");
    }
}
