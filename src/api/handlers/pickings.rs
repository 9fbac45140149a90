//! Fulfillment record endpoints
//!
//! The seam through which the host order-management system hands over
//! picking data and reads carrier results back.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{AuditNote, DeliveryState, Fulfillment};
use crate::AppState;

use super::ErrorResponse;

/// Carrier-facing view of a picking. Attachment bytes stay out of it; the
/// label endpoints serve those.
#[derive(Serialize, ToSchema)]
pub struct PickingView {
    pub name: String,
    pub order_ref: Option<String>,
    pub carrier_code: String,
    pub tracking_code: Option<String>,
    pub delivery_state: DeliveryState,
    pub tracking_history: Option<String>,
    pub attachments: Vec<String>,
    pub notes: Vec<AuditNote>,
    pub shipped_at: Option<DateTime<Utc>>,
}

impl From<&Fulfillment> for PickingView {
    fn from(picking: &Fulfillment) -> Self {
        PickingView {
            name: picking.name.clone(),
            order_ref: picking.order_ref.clone(),
            carrier_code: picking.carrier_code.clone(),
            tracking_code: picking.tracking_code.clone(),
            delivery_state: picking.delivery_state,
            tracking_history: picking.tracking_history.clone(),
            attachments: picking
                .attachments
                .iter()
                .map(|a| a.file_name.clone())
                .collect(),
            notes: picking.notes.clone(),
            shipped_at: picking.shipped_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    pub picking: PickingView,
}

/// POST /api/v1/pickings - Register or replace a fulfillment record
#[utoipa::path(
    post,
    path = "/api/v1/pickings",
    tag = "pickings",
    request_body = Fulfillment,
    responses(
        (status = 201, description = "Picking registered", body = RegisterResponse)
    )
)]
pub async fn register_picking(
    state: web::Data<AppState>,
    body: web::Json<Fulfillment>,
) -> HttpResponse {
    let picking = body.into_inner();
    info!(picking = %picking.name, carrier = %picking.carrier_code, "registering picking");

    let view = PickingView::from(&picking);
    state.store.upsert(picking);

    HttpResponse::Created().json(RegisterResponse {
        success: true,
        picking: view,
    })
}

/// GET /api/v1/pickings/{name} - Inspect a fulfillment record
///
/// Picking references contain slashes (`WH/OUT/00017`), so the route uses a
/// tail match.
#[utoipa::path(
    get,
    path = "/api/v1/pickings/{name}",
    tag = "pickings",
    responses(
        (status = 200, description = "Picking found", body = PickingView),
        (status = 404, description = "Unknown picking", body = ErrorResponse)
    )
)]
pub async fn get_picking(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let name = path.into_inner();
    match state.store.get(&name) {
        Some(picking) => HttpResponse::Ok().json(PickingView::from(&picking)),
        None => HttpResponse::NotFound().json(ErrorResponse::new(
            "NOT_FOUND",
            format!("picking '{}' is not registered", name),
        )),
    }
}
