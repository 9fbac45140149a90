//! Shipping orchestration
//!
//! High-level carrier operations over fulfillment records: send, cancel,
//! tracking refresh, label retrieval, manifests and pickups. Composes the
//! Banlingkit client with the payload mapper and writes results back through
//! the store.
//!
//! Batches run item by item and abort on the first failure; already-persisted
//! items are NOT rolled back. Callers see which picking failed through the
//! error and can compensate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::carrier::{
    BanlingkitClient, BanlingkitMapper, CarrierCredentials, CarrierEndpoints, CarrierError,
    CarrierResult,
};
use crate::config::Settings;
use crate::domain::{
    DeliveryState, DocumentFormat, DocumentLayout, Fulfillment, LabelDocument, ManifestFormat,
    TrackingEvent,
};
use crate::label::{LabelItem, LabelOrientation, LabelRenderer, LabelSpec};
use crate::store::FulfillmentStore;

/// Process code reported to the carrier's manifest endpoint.
const MANIFEST_PROCESS_CODE: &str = "ERP";

/// One configured carrier account with its client.
pub struct AccountHandle {
    pub code: String,
    pub credentials: CarrierCredentials,
    pub storehouse_code: String,
    pub document_layout: DocumentLayout,
    pub document_format: DocumentFormat,
    pub document_offset: i32,
    pub client: BanlingkitClient,
}

/// Per-picking result of a send batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShipOutcome {
    pub picking: String,
    pub tracking_code: String,
    pub tracking_link: String,
    /// The carrier API cannot quote prices; rating happens elsewhere
    pub exact_price: f64,
    pub attachment: String,
}

/// Result of a pickup scheduling call.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PickupOutcome {
    pub status: u16,
    pub pickup_code: String,
}

/// Carrier operations orchestrator.
pub struct ShippingService {
    store: Arc<FulfillmentStore>,
    accounts: HashMap<String, AccountHandle>,
    renderer: LabelRenderer,
    orientation: LabelOrientation,
}

impl ShippingService {
    /// Build the service from settings: one client per configured account.
    pub fn from_settings(settings: &Settings, store: Arc<FulfillmentStore>) -> Self {
        let endpoints: CarrierEndpoints = settings.carrier.endpoints.clone();
        let mut accounts = HashMap::new();
        for account in &settings.carrier.accounts {
            accounts.insert(
                account.code.clone(),
                AccountHandle {
                    code: account.code.clone(),
                    credentials: CarrierCredentials::new(
                        account.client_id.clone(),
                        account.salt.clone(),
                        account.environment,
                    ),
                    storehouse_code: account.storehouse_code.clone(),
                    document_layout: account.document_layout,
                    document_format: account.document_format,
                    document_offset: account.document_offset,
                    client: BanlingkitClient::new(endpoints.clone()),
                },
            );
        }

        let orientation = match settings.label.orientation.as_deref() {
            Some("landscape") => LabelOrientation::Landscape,
            _ => LabelOrientation::Portrait,
        };

        ShippingService {
            store,
            accounts,
            renderer: LabelRenderer::new(settings.label.font_path.clone()),
            orientation,
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn account(&self, code: &str) -> CarrierResult<&AccountHandle> {
        self.accounts
            .get(code)
            .ok_or_else(|| CarrierError::NotConfigured(code.to_string()))
    }

    fn picking(&self, name: &str) -> CarrierResult<Fulfillment> {
        self.store
            .get(name)
            .ok_or_else(|| CarrierError::NotFound(format!("picking {}", name)))
    }

    /// Create shipments for a batch of pickings.
    ///
    /// Refuses to re-ship: a picking already tracked under its carrier
    /// account fails with `AlreadyShipped` and nothing is mutated. On
    /// success the tracking code is persisted, exactly one PDF attachment is
    /// created (carrier document when returned, local render otherwise) and
    /// an audit note is posted.
    pub async fn send_shipping(&self, picking_refs: &[String]) -> CarrierResult<Vec<ShipOutcome>> {
        let mut outcomes = Vec::with_capacity(picking_refs.len());

        for name in picking_refs {
            let picking = self.picking(name)?;
            let handle = self.account(&picking.carrier_code)?;

            // The account is resolved from the record itself, so a present
            // code always belongs to this carrier. This read is a fast path
            // only; the write-back below re-checks under the entry lock.
            if let Some(tracking) = &picking.tracking_code {
                return Err(CarrierError::AlreadyShipped {
                    picking: name.clone(),
                    tracking: tracking.clone(),
                });
            }

            let request =
                BanlingkitMapper::build_shipment_request(&picking, &handle.storehouse_code);
            let result = handle
                .client
                .create_shipment(&handle.credentials, &request)
                .await?;

            let tracking_code = result.tracking_code;
            // No ready-made document: render the same label the
            // /delivery/print_label endpoint serves
            let document = match result.documents.into_iter().next() {
                Some(document) => document,
                None => self.render_local_label(&picking, &tracking_code)?,
            };

            let attachment_name = format!("{}.pdf", tracking_code);
            let stored = LabelDocument {
                file_name: attachment_name.clone(),
                ..document
            };

            // Re-validate under the entry lock: a concurrent send may have
            // shipped this picking while our carrier call was in flight
            let written = self.store.update(name, |p| {
                if let Some(existing) = &p.tracking_code {
                    return Err(CarrierError::AlreadyShipped {
                        picking: name.clone(),
                        tracking: existing.clone(),
                    });
                }
                p.tracking_code = Some(tracking_code.clone());
                p.delivery_state = DeliveryState::ShippingRecorded;
                p.shipped_at = Some(Utc::now());
                p.attachments.push(stored.clone());
                p.post_note(format!("Banlingkit shipping documents ({})", tracking_code));
                Ok(())
            });
            match written {
                Some(Ok(())) => {}
                Some(Err(err)) => return Err(err),
                None => return Err(CarrierError::NotFound(format!("picking {}", name))),
            }

            info!(picking = %name, tracking_code = %tracking_code, "shipment recorded");
            outcomes.push(ShipOutcome {
                picking: name.clone(),
                tracking_code: tracking_code.clone(),
                tracking_link: handle.client.tracking_link(&tracking_code),
                exact_price: 0.0,
                attachment: attachment_name,
            });
        }

        Ok(outcomes)
    }

    /// Cancel the expedition for every picking in the batch that carries a
    /// tracking code. A carrier fault aborts the batch and leaves that
    /// picking's tracking code intact; already-cancelled items stay
    /// cancelled.
    pub async fn cancel_shipment(&self, picking_refs: &[String]) -> CarrierResult<Vec<String>> {
        let mut cancelled = Vec::new();

        for name in picking_refs {
            let picking = self.picking(name)?;
            let tracking = match &picking.tracking_code {
                Some(tracking) => tracking.clone(),
                None => continue,
            };
            let handle = self.account(&picking.carrier_code)?;

            let faults = handle
                .client
                .cancel_shipment(&handle.credentials, &tracking)
                .await?;
            if !faults.is_empty() {
                warn!(picking = %name, "carrier refused cancellation");
                return Err(CarrierError::Rejected(faults));
            }

            let written = self.store.update(name, |p| {
                p.tracking_code = None;
                p.delivery_state = DeliveryState::CanceledShipment;
                p.post_note(format!("Shipment {} cancelled", tracking));
            });
            if written.is_none() {
                warn!(picking = %name, "picking vanished before cancellation was recorded");
            }
            cancelled.push(name.clone());
        }

        Ok(cancelled)
    }

    /// Refresh the tracking history and derived delivery state of a picking.
    ///
    /// No-op for unshipped pickings. A shipped picking for which the carrier
    /// reports zero events is an error: the code exists, so an empty history
    /// means the lookup failed.
    pub async fn update_tracking(&self, picking_ref: &str) -> CarrierResult<()> {
        let picking = self.picking(picking_ref)?;
        let tracking = match &picking.tracking_code {
            Some(tracking) => tracking.clone(),
            None => return Ok(()),
        };
        let handle = self.account(&picking.carrier_code)?;

        let events = handle
            .client
            .get_tracking(&handle.credentials, &tracking)
            .await?;
        let (history, state) = summarize_tracking(&events).ok_or_else(|| {
            CarrierError::NotFound(format!("no tracking events for {}", tracking))
        })?;

        self.store
            .update(picking_ref, |p| {
                p.tracking_history = Some(history);
                p.delivery_state = state;
            })
            .ok_or_else(|| CarrierError::NotFound(format!("picking {}", picking_ref)))
    }

    /// Fetch (or locally re-render) the label for a tracking code.
    ///
    /// Returns `Ok(None)` when the reference or account is absent; callers
    /// treat that as "no label available", not an error.
    pub async fn get_label(
        &self,
        account_code: &str,
        tracking_code: &str,
    ) -> CarrierResult<Option<LabelDocument>> {
        if tracking_code.is_empty() {
            return Ok(None);
        }
        let handle = match self.accounts.get(account_code) {
            Some(handle) => handle,
            None => return Ok(None),
        };

        let documents = handle
            .client
            .get_documents(
                &handle.credentials,
                tracking_code,
                handle.document_layout,
                handle.document_format,
                handle.document_offset,
            )
            .await?;

        let document = match documents.into_iter().next() {
            Some(document) => document,
            None => match self.store.get_by_tracking(tracking_code) {
                Some(picking) => self.render_local_label(&picking, tracking_code)?,
                None => return Ok(None),
            },
        };

        if let Some(picking) = self.store.get_by_tracking(tracking_code) {
            let written = self.store.update(&picking.name, |p| {
                p.attachments.push(document.clone());
                p.post_note(format!("Banlingkit Express label for {}", tracking_code));
            });
            if written.is_none() {
                warn!(picking = %picking.name, "picking vanished before label was attached");
            }
        }
        Ok(Some(document))
    }

    /// Render the local fallback label for a picking. Also backs the
    /// `/delivery/print_label` endpoint.
    pub fn render_local_label(
        &self,
        picking: &Fulfillment,
        tracking_code: &str,
    ) -> CarrierResult<LabelDocument> {
        let spec = LabelSpec {
            tracking_code: tracking_code.to_string(),
            recipient: picking.recipient.clone(),
            sender_name: picking.sender().name.clone(),
            items: picking
                .lines
                .iter()
                .map(|line| LabelItem {
                    name: line.name.clone(),
                    quantity: line.qty_done,
                })
                .collect(),
            orientation: self.orientation,
        };
        self.renderer
            .render(&spec)
            .map_err(|e| CarrierError::Render(e.to_string()))
    }

    /// Gather manifests for a date range across carrier accounts.
    ///
    /// Accounts sharing credentials would produce identical manifests, so
    /// they are de-duplicated first. Files are named after the account and
    /// the date range.
    pub async fn get_manifest(
        &self,
        account_codes: Option<&[String]>,
        format: ManifestFormat,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> CarrierResult<Vec<LabelDocument>> {
        let selected: Vec<&AccountHandle> = match account_codes {
            Some(codes) => codes
                .iter()
                .map(|code| self.account(code))
                .collect::<CarrierResult<Vec<_>>>()?,
            None => self.accounts.values().collect(),
        };

        let mut seen = HashSet::new();
        let from = from_date.format("%Y-%m-%d").to_string();
        let to = to_date.format("%Y-%m-%d").to_string();
        let mut manifests = Vec::new();

        for handle in selected {
            if !seen.insert(handle.credentials.clone()) {
                continue;
            }
            let (faults, documents) = handle
                .client
                .report_shipping(&handle.credentials, MANIFEST_PROCESS_CODE, format, &from, &to)
                .await?;
            if !faults.is_empty() {
                return Err(CarrierError::Rejected(faults));
            }
            for document in documents {
                manifests.push(LabelDocument {
                    file_name: format!(
                        "{}-{}-{}.{}",
                        handle.credentials.client_id,
                        from.replace('-', ""),
                        to.replace('-', ""),
                        format.extension()
                    ),
                    ..document
                });
            }
        }
        Ok(manifests)
    }

    /// Schedule a carrier pickup window. Hours come in as fractional hours
    /// (10.5 = 10:30) and are clamped into the day before formatting.
    pub async fn create_pickup(
        &self,
        account_code: &str,
        delivery_date: NaiveDate,
        min_hour: f64,
        max_hour: f64,
    ) -> CarrierResult<PickupOutcome> {
        let handle = self.account(account_code)?;
        let (min_hour, max_hour) = clamp_pickup_hours(min_hour, max_hour);

        let (status, pickup_code) = handle
            .client
            .create_pickup_request(
                &handle.credentials,
                &delivery_date.format("%Y-%m-%d").to_string(),
                &float_time_to_hhmm(min_hour),
                &float_time_to_hhmm(max_hour),
            )
            .await?;

        Ok(PickupOutcome {
            status,
            pickup_code,
        })
    }

    /// Public tracking-page link for a shipped picking.
    pub fn tracking_link(&self, account_code: &str, tracking_code: &str) -> Option<String> {
        self.accounts
            .get(account_code)
            .map(|handle| handle.client.tracking_link(tracking_code))
    }
}

/// Map a carrier status code onto the internal delivery state. Codes outside
/// the table count as incidences so they surface for manual review.
pub fn map_delivery_state(status_code: &str) -> DeliveryState {
    match status_code {
        "0" => DeliveryState::ShippingRecorded,
        "1" | "2" | "3" => DeliveryState::InTransit,
        "4" => DeliveryState::WarehouseDelivered,
        "5" => DeliveryState::CustomerDelivered,
        "6" => DeliveryState::CanceledShipment,
        _ => DeliveryState::Incidence,
    }
}

/// Collapse a tracking event list into a newline-joined history plus the
/// delivery state of the last event. Events arrive oldest first. `None` for
/// an empty list.
pub fn summarize_tracking(events: &[TrackingEvent]) -> Option<(String, DeliveryState)> {
    let current = events.last()?;
    let history = events
        .iter()
        .map(|e| e.history_line())
        .collect::<Vec<_>>()
        .join("\n");
    Some((history, map_delivery_state(&current.status_code)))
}

/// Clamp a pickup window into [00:00, 23:59]; the upper bound is never left
/// below the lower one.
pub fn clamp_pickup_hours(min_hour: f64, max_hour: f64) -> (f64, f64) {
    let min_hour = min_hour.clamp(0.0, 23.99);
    let max_hour = max_hour.clamp(0.0, 23.99).max(min_hour);
    (min_hour, max_hour)
}

/// Format fractional hours as `HH:MM` (23.99 -> "23:59").
pub fn float_time_to_hhmm(hours: f64) -> String {
    let total_minutes = hours * 60.0;
    let h = (total_minutes / 60.0).floor();
    let m = ((total_minutes - h * 60.0).round()).min(59.0);
    format!("{:02}:{:02}", h as u32, m as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CarrierAccountSettings, Settings};
    use crate::domain::{Address, OrderLine};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn service_with_account() -> (ShippingService, Arc<FulfillmentStore>) {
        let store = Arc::new(FulfillmentStore::new());
        let mut settings = Settings::default();
        settings.carrier.accounts.push(CarrierAccountSettings {
            code: "bl-main".to_string(),
            client_id: "000002ODOO1".to_string(),
            salt: "s3cret".to_string(),
            environment: crate::carrier::Environment::Test,
            storehouse_code: "ST00002".to_string(),
            document_layout: DocumentLayout::Single,
            document_format: DocumentFormat::Pdf,
            document_offset: 0,
        });
        let service = ShippingService::from_settings(&settings, store.clone());
        (service, store)
    }

    fn picking(name: &str, tracking: Option<&str>) -> Fulfillment {
        Fulfillment {
            name: name.to_string(),
            order_ref: Some("S00042".to_string()),
            carrier_code: "bl-main".to_string(),
            currency: "EUR".to_string(),
            recipient: Address {
                name: "Jane Doe".to_string(),
                ..Default::default()
            },
            recipient_entity: None,
            warehouse_address: None,
            company_address: Address::default(),
            lines: vec![OrderLine {
                name: "Mug".to_string(),
                name_en: "Mug".to_string(),
                specification: None,
                specification_en: None,
                barcode: None,
                unit_price: 10.0,
                qty_ordered: 1.0,
                qty_done: 1.0,
            }],
            tracking_code: tracking.map(str::to_string),
            delivery_state: DeliveryState::default(),
            tracking_history: None,
            attachments: Vec::new(),
            notes: Vec::new(),
            shipped_at: None,
        }
    }

    #[test]
    fn test_map_delivery_state_table() {
        assert_eq!(map_delivery_state("0"), DeliveryState::ShippingRecorded);
        assert_eq!(map_delivery_state("2"), DeliveryState::InTransit);
        assert_eq!(map_delivery_state("4"), DeliveryState::WarehouseDelivered);
        assert_eq!(map_delivery_state("5"), DeliveryState::CustomerDelivered);
        assert_eq!(map_delivery_state("6"), DeliveryState::CanceledShipment);
        // Unmapped codes default to incidence
        assert_eq!(map_delivery_state("99"), DeliveryState::Incidence);
        assert_eq!(map_delivery_state("weird"), DeliveryState::Incidence);
    }

    #[test]
    fn test_summarize_tracking() {
        let events = vec![
            TrackingEvent {
                timestamp: Utc::now(),
                status_code: "1".into(),
                status_description: "Picked up".into(),
                incident_code: None,
                incident_description: None,
            },
            TrackingEvent {
                timestamp: Utc::now(),
                status_code: "5".into(),
                status_description: "Delivered".into(),
                incident_code: None,
                incident_description: None,
            },
        ];
        let (history, state) = summarize_tracking(&events).unwrap();
        assert_eq!(history.lines().count(), 2);
        // Last event drives the state
        assert_eq!(state, DeliveryState::CustomerDelivered);

        // A shipped picking with zero events is a failed lookup, not a history
        assert!(summarize_tracking(&[]).is_none());
    }

    #[test]
    fn test_clamp_pickup_hours() {
        // Out-of-range minimum clamps to the end of day
        assert_eq!(clamp_pickup_hours(25.0, 26.0), (23.99, 23.99));
        // Max is raised up to min after clamping
        assert_eq!(clamp_pickup_hours(10.0, 5.0), (10.0, 10.0));
        assert_eq!(clamp_pickup_hours(-2.0, 8.0), (0.0, 8.0));
        assert_eq!(clamp_pickup_hours(9.0, 17.5), (9.0, 17.5));
    }

    #[test]
    fn test_float_time_to_hhmm() {
        assert_eq!(float_time_to_hhmm(23.99), "23:59");
        assert_eq!(float_time_to_hhmm(0.0), "00:00");
        assert_eq!(float_time_to_hhmm(10.5), "10:30");
        assert_eq!(float_time_to_hhmm(9.25), "09:15");
    }

    #[tokio::test]
    async fn test_send_refuses_already_shipped_without_mutation() {
        let (service, store) = service_with_account();
        store.upsert(picking("WH/OUT/00017", Some("BL123")));

        let result = service
            .send_shipping(&["WH/OUT/00017".to_string()])
            .await;
        assert!(matches!(
            result,
            Err(CarrierError::AlreadyShipped { ref tracking, .. }) if tracking == "BL123"
        ));

        // Nothing mutated
        let unchanged = store.get("WH/OUT/00017").unwrap();
        assert_eq!(unchanged.tracking_code.as_deref(), Some("BL123"));
        assert!(unchanged.attachments.is_empty());
        assert!(unchanged.notes.is_empty());
    }

    #[tokio::test]
    async fn test_send_unknown_picking_is_not_found() {
        let (service, _store) = service_with_account();
        let result = service.send_shipping(&["WH/OUT/404".to_string()]).await;
        assert!(matches!(result, Err(CarrierError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_unknown_account_is_not_configured() {
        let (service, store) = service_with_account();
        let mut p = picking("WH/OUT/00018", None);
        p.carrier_code = "other-carrier".to_string();
        store.upsert(p);
        let result = service.send_shipping(&["WH/OUT/00018".to_string()]).await;
        assert!(matches!(result, Err(CarrierError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_update_tracking_noop_without_code() {
        let (service, store) = service_with_account();
        store.upsert(picking("WH/OUT/00019", None));
        assert!(service.update_tracking("WH/OUT/00019").await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_skips_untracked_pickings() {
        let (service, store) = service_with_account();
        store.upsert(picking("WH/OUT/00020", None));
        let cancelled = service
            .cancel_shipment(&["WH/OUT/00020".to_string()])
            .await
            .unwrap();
        assert!(cancelled.is_empty());
    }

    #[tokio::test]
    async fn test_get_label_absent_reference_or_account() {
        let (service, _store) = service_with_account();
        assert!(service.get_label("bl-main", "").await.unwrap().is_none());
        assert!(service
            .get_label("missing-account", "BL123")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_render_local_label_carries_tracking_code() {
        let (service, _store) = service_with_account();
        let document = service
            .render_local_label(&picking("WH/OUT/00021", None), "BL124")
            .unwrap();
        assert!(document.content.starts_with(b"%PDF"));
        assert_eq!(document.file_name, "label_BL124.pdf");
    }

    #[test]
    fn test_tracking_link() {
        let (service, _store) = service_with_account();
        let link = service.tracking_link("bl-main", "BL123").unwrap();
        assert!(link.ends_with("#nums=BL123"));
        assert!(service.tracking_link("missing", "BL123").is_none());
    }

    fn service_with_mock_carrier(
        server: &MockServer,
    ) -> (ShippingService, Arc<FulfillmentStore>) {
        let store = Arc::new(FulfillmentStore::new());
        let mut settings = Settings::default();
        settings.carrier.endpoints.test = server.base_url();
        settings.carrier.accounts.push(CarrierAccountSettings {
            code: "bl-main".to_string(),
            client_id: "000002ODOO1".to_string(),
            salt: "s3cret".to_string(),
            environment: crate::carrier::Environment::Test,
            storehouse_code: "ST00002".to_string(),
            document_layout: DocumentLayout::Single,
            document_format: DocumentFormat::Pdf,
            document_offset: 0,
        });
        let service = ShippingService::from_settings(&settings, store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn test_send_assigns_tracking_and_single_attachment() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(Method::POST).path("/invoice/create");
            then.status(200)
                .json_body(json!({ "code": 1, "message": "ok" }));
        });
        let (service, store) = service_with_mock_carrier(&server);
        store.upsert(picking("WH/OUT/00030", None));

        let outcomes = service
            .send_shipping(&["WH/OUT/00030".to_string()])
            .await
            .unwrap();
        create.assert();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].tracking_code, "000002ODOO1S00042-WH-OUT-00030");

        let shipped = store.get("WH/OUT/00030").unwrap();
        assert_eq!(
            shipped.tracking_code.as_deref(),
            Some("000002ODOO1S00042-WH-OUT-00030")
        );
        assert_eq!(shipped.delivery_state, DeliveryState::ShippingRecorded);
        assert!(shipped.shipped_at.is_some());
        // No carrier document in the response: exactly one locally rendered PDF
        assert_eq!(shipped.attachments.len(), 1);
        assert_eq!(
            shipped.attachments[0].file_name,
            "000002ODOO1S00042-WH-OUT-00030.pdf"
        );
        assert!(shipped.attachments[0].content.starts_with(b"%PDF"));
        assert_eq!(shipped.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sends_record_exactly_one_shipment() {
        let server = MockServer::start();
        let _create = server.mock(|when, then| {
            when.method(Method::POST).path("/invoice/create");
            then.status(200)
                .delay(Duration::from_millis(100))
                .json_body(json!({ "code": 1 }));
        });
        let (service, store) = service_with_mock_carrier(&server);
        store.upsert(picking("WH/OUT/00031", None));
        let service = Arc::new(service);

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.send_shipping(&["WH/OUT/00031".to_string()]).await })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.send_shipping(&["WH/OUT/00031".to_string()]).await })
        };
        let first = first.await.unwrap();
        let second = second.await.unwrap();

        // Exactly one send wins; the other fails with the assigned code
        assert!(first.is_ok() != second.is_ok());
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(
            loser,
            Err(CarrierError::AlreadyShipped { ref tracking, .. })
                if tracking == "000002ODOO1S00042-WH-OUT-00031"
        ));

        let shipped = store.get("WH/OUT/00031").unwrap();
        assert_eq!(shipped.attachments.len(), 1);
        assert_eq!(shipped.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_success_clears_tracking_code() {
        let server = MockServer::start();
        let cancel = server.mock(|when, then| {
            when.method(Method::POST).path("/invoice/cancel");
            then.status(200).json_body(json!({ "code": 1 }));
        });
        let (service, store) = service_with_mock_carrier(&server);
        store.upsert(picking("WH/OUT/00032", Some("BL900")));

        let cancelled = service
            .cancel_shipment(&["WH/OUT/00032".to_string()])
            .await
            .unwrap();
        cancel.assert();

        assert_eq!(cancelled, vec!["WH/OUT/00032".to_string()]);
        let record = store.get("WH/OUT/00032").unwrap();
        assert!(record.tracking_code.is_none());
        assert_eq!(record.delivery_state, DeliveryState::CanceledShipment);
        assert_eq!(record.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_fault_leaves_tracking_code_intact() {
        let server = MockServer::start();
        let _cancel = server.mock(|when, then| {
            when.method(Method::POST).path("/invoice/cancel");
            then.status(200).json_body(json!({
                "code": 0,
                "data": [{ "errorCode": "31", "errorMessage": "Shipment already collected" }]
            }));
        });
        let (service, store) = service_with_mock_carrier(&server);
        store.upsert(picking("WH/OUT/00033", Some("BL901")));

        let result = service.cancel_shipment(&["WH/OUT/00033".to_string()]).await;
        assert!(matches!(result, Err(CarrierError::Rejected(_))));

        let record = store.get("WH/OUT/00033").unwrap();
        assert_eq!(record.tracking_code.as_deref(), Some("BL901"));
        assert_ne!(record.delivery_state, DeliveryState::CanceledShipment);
        assert!(record.notes.is_empty());
    }

    #[tokio::test]
    async fn test_update_tracking_empty_history_is_an_error() {
        let server = MockServer::start();
        let _tracks = server.mock(|when, then| {
            when.method(Method::POST).path("/invoice/tracks");
            then.status(200).json_body(json!({ "code": 1, "data": [] }));
        });
        let (service, store) = service_with_mock_carrier(&server);
        store.upsert(picking("WH/OUT/00034", Some("BL902")));

        let result = service.update_tracking("WH/OUT/00034").await;
        assert!(matches!(result, Err(CarrierError::NotFound(_))));
    }
}
