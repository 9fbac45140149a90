//! Label endpoints: carrier-hosted fetch and the local print fallback

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::LabelDocument;
use crate::AppState;

use super::{carrier_error_response, ErrorResponse};

#[derive(Serialize, ToSchema)]
pub struct LabelResponse {
    pub success: bool,
    pub document: LabelDocument,
}

/// GET /api/v1/shipments/{tracking}/label - Fetch (or re-render) the label
///
/// "No label available" is a 404, not a carrier error: the source treated a
/// missing reference or account as a boolean-false result.
#[utoipa::path(
    get,
    path = "/api/v1/shipments/{tracking}/label",
    tag = "labels",
    responses(
        (status = 200, description = "Label document, content base64", body = LabelResponse),
        (status = 404, description = "No label available", body = ErrorResponse),
        (status = 502, description = "Carrier unreachable", body = ErrorResponse)
    )
)]
pub async fn get_label(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let tracking = path.into_inner();
    let account_code = state
        .store
        .get_by_tracking(&tracking)
        .map(|picking| picking.carrier_code)
        .unwrap_or_default();

    match state.shipping.get_label(&account_code, &tracking).await {
        Ok(Some(document)) => HttpResponse::Ok().json(LabelResponse {
            success: true,
            document,
        }),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new(
            "NOT_FOUND",
            format!("no label available for '{}'", tracking),
        )),
        Err(e) => {
            error!(tracking = %tracking, error = %e, "label fetch failed");
            carrier_error_response(&e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PrintLabelQuery {
    pub tracking_no: Option<String>,
}

/// GET /delivery/print_label?tracking_no=<code> - Render the label locally
///
/// Inbound endpoint consumed by the host order-management UI; also the
/// fallback document URL handed out when the carrier returns no label.
/// Serves raw `application/pdf` bytes, 404 when no fulfillment matches.
#[utoipa::path(
    get,
    path = "/delivery/print_label",
    tag = "labels",
    params(
        ("tracking_no" = Option<String>, Query, description = "Tracking code of the shipment")
    ),
    responses(
        (status = 200, description = "PDF label", content_type = "application/pdf"),
        (status = 404, description = "Unknown tracking code", body = ErrorResponse)
    )
)]
pub async fn print_label(
    state: web::Data<AppState>,
    query: web::Query<PrintLabelQuery>,
) -> HttpResponse {
    let tracking = match query.tracking_no.as_deref() {
        Some(tracking) if !tracking.is_empty() => tracking.to_string(),
        _ => {
            return HttpResponse::NotFound()
                .json(ErrorResponse::new("NOT_FOUND", "tracking_no is required"))
        }
    };

    let picking = match state.store.get_by_tracking(&tracking) {
        Some(picking) => picking,
        None => {
            return HttpResponse::NotFound().json(ErrorResponse::new(
                "NOT_FOUND",
                format!("no shipment with tracking code '{}'", tracking),
            ))
        }
    };

    match state.shipping.render_local_label(&picking, &tracking) {
        Ok(document) => {
            info!(tracking = %tracking, bytes = document.content.len(), "label rendered");
            HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    "Content-Disposition",
                    format!("inline; filename=\"label_{}.pdf\"", tracking),
                ))
                .body(document.content)
        }
        Err(e) => {
            error!(tracking = %tracking, error = %e, "label rendering failed");
            carrier_error_response(&e)
        }
    }
}
