//! Shipment lifecycle endpoints: send, cancel, tracking refresh, link

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::shipping::ShipOutcome;
use crate::AppState;

use super::{carrier_error_response, ErrorResponse};
use crate::api::handlers::pickings::PickingView;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendRequest {
    pub picking_refs: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SendResponse {
    pub success: bool,
    pub outcomes: Vec<ShipOutcome>,
}

/// POST /api/v1/shipments/send - Create shipments for a batch of pickings
///
/// Items are processed in order and the batch aborts on the first failure;
/// shipments already recorded by then stay recorded.
#[utoipa::path(
    post,
    path = "/api/v1/shipments/send",
    tag = "shipments",
    request_body = SendRequest,
    responses(
        (status = 200, description = "All shipments created", body = SendResponse),
        (status = 409, description = "A picking is already shipped", body = ErrorResponse),
        (status = 422, description = "Carrier rejected a shipment", body = ErrorResponse),
        (status = 502, description = "Carrier unreachable", body = ErrorResponse)
    )
)]
pub async fn send_shipping(
    state: web::Data<AppState>,
    body: web::Json<SendRequest>,
) -> HttpResponse {
    info!(count = body.picking_refs.len(), "processing send batch");

    match state.shipping.send_shipping(&body.picking_refs).await {
        Ok(outcomes) => HttpResponse::Ok().json(SendResponse {
            success: true,
            outcomes,
        }),
        Err(e) => {
            error!(error = %e, "send batch failed");
            carrier_error_response(&e)
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub picking_refs: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    pub success: bool,
    /// Pickings whose shipment was cancelled; untracked ones are skipped
    pub cancelled: Vec<String>,
}

/// POST /api/v1/shipments/cancel - Cancel shipments for a batch of pickings
#[utoipa::path(
    post,
    path = "/api/v1/shipments/cancel",
    tag = "shipments",
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Cancellations processed", body = CancelResponse),
        (status = 422, description = "Carrier refused a cancellation", body = ErrorResponse)
    )
)]
pub async fn cancel_shipment(
    state: web::Data<AppState>,
    body: web::Json<CancelRequest>,
) -> HttpResponse {
    match state.shipping.cancel_shipment(&body.picking_refs).await {
        Ok(cancelled) => HttpResponse::Ok().json(CancelResponse {
            success: true,
            cancelled,
        }),
        Err(e) => {
            error!(error = %e, "cancel batch failed");
            carrier_error_response(&e)
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackRequest {
    pub picking_ref: String,
}

/// POST /api/v1/shipments/track - Refresh tracking state for one picking
#[utoipa::path(
    post,
    path = "/api/v1/shipments/track",
    tag = "shipments",
    request_body = TrackRequest,
    responses(
        (status = 200, description = "Tracking refreshed", body = PickingView),
        (status = 404, description = "Unknown picking or no events", body = ErrorResponse)
    )
)]
pub async fn update_tracking(
    state: web::Data<AppState>,
    body: web::Json<TrackRequest>,
) -> HttpResponse {
    if let Err(e) = state.shipping.update_tracking(&body.picking_ref).await {
        error!(picking = %body.picking_ref, error = %e, "tracking refresh failed");
        return carrier_error_response(&e);
    }
    match state.store.get(&body.picking_ref) {
        Some(picking) => HttpResponse::Ok().json(PickingView::from(&picking)),
        None => HttpResponse::NotFound().json(ErrorResponse::new(
            "NOT_FOUND",
            format!("picking '{}' is not registered", body.picking_ref),
        )),
    }
}

#[derive(Serialize, ToSchema)]
pub struct TrackingLinkResponse {
    pub success: bool,
    pub tracking_code: String,
    pub url: String,
}

/// GET /api/v1/shipments/{tracking}/link - Public tracking-page URL
#[utoipa::path(
    get,
    path = "/api/v1/shipments/{tracking}/link",
    tag = "shipments",
    responses(
        (status = 200, description = "Tracking link", body = TrackingLinkResponse),
        (status = 404, description = "Unknown tracking code", body = ErrorResponse)
    )
)]
pub async fn tracking_link(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let tracking = path.into_inner();
    let url = state
        .store
        .get_by_tracking(&tracking)
        .and_then(|picking| state.shipping.tracking_link(&picking.carrier_code, &tracking));

    match url {
        Some(url) => HttpResponse::Ok().json(TrackingLinkResponse {
            success: true,
            tracking_code: tracking,
            url,
        }),
        None => HttpResponse::NotFound().json(ErrorResponse::new(
            "NOT_FOUND",
            format!("no shipment with tracking code '{}'", tracking),
        )),
    }
}
