//! Pickup scheduling endpoint

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::shipping::PickupOutcome;
use crate::AppState;

use super::{carrier_error_response, ErrorResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PickupRequest {
    pub account_code: String,
    pub delivery_date: NaiveDate,
    /// Fractional hours, 10.5 = 10:30. Clamped into [0, 23.99]
    pub min_hour: f64,
    #[serde(default = "default_max_hour")]
    pub max_hour: f64,
}

fn default_max_hour() -> f64 {
    23.99
}

#[derive(Serialize, ToSchema)]
pub struct PickupResponse {
    pub success: bool,
    pub outcome: PickupOutcome,
}

/// POST /api/v1/pickup - Schedule a carrier pickup window
#[utoipa::path(
    post,
    path = "/api/v1/pickup",
    tag = "pickups",
    request_body = PickupRequest,
    responses(
        (status = 200, description = "Pickup scheduled", body = PickupResponse),
        (status = 400, description = "Unknown account code", body = ErrorResponse),
        (status = 502, description = "Carrier unreachable", body = ErrorResponse)
    )
)]
pub async fn create_pickup(
    state: web::Data<AppState>,
    body: web::Json<PickupRequest>,
) -> HttpResponse {
    info!(
        account = %body.account_code,
        date = %body.delivery_date,
        "scheduling pickup"
    );

    match state
        .shipping
        .create_pickup(
            &body.account_code,
            body.delivery_date,
            body.min_hour,
            body.max_hour,
        )
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(PickupResponse {
            success: true,
            outcome,
        }),
        Err(e) => {
            error!(error = %e, "pickup scheduling failed");
            carrier_error_response(&e)
        }
    }
}
