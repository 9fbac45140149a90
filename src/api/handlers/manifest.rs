//! Manifest endpoint: batch shipment reports across carrier accounts

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::{LabelDocument, ManifestFormat};
use crate::AppState;

use super::{carrier_error_response, ErrorResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManifestRequest {
    /// Accounts to query; all configured accounts when omitted
    #[serde(default)]
    pub account_codes: Option<Vec<String>>,
    #[serde(default = "default_format")]
    pub format: ManifestFormat,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

fn default_format() -> ManifestFormat {
    ManifestFormat::Xlsx
}

#[derive(Serialize, ToSchema)]
pub struct ManifestResponse {
    pub success: bool,
    pub documents: Vec<LabelDocument>,
}

/// POST /api/v1/manifest - Gather shipment manifests for a date range
#[utoipa::path(
    post,
    path = "/api/v1/manifest",
    tag = "manifests",
    request_body = ManifestRequest,
    responses(
        (status = 200, description = "Manifests, content base64", body = ManifestResponse),
        (status = 400, description = "Unknown account code", body = ErrorResponse),
        (status = 422, description = "Carrier reported an error", body = ErrorResponse)
    )
)]
pub async fn get_manifest(
    state: web::Data<AppState>,
    body: web::Json<ManifestRequest>,
) -> HttpResponse {
    if body.from_date > body.to_date {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "INVALID_RANGE",
            "from_date must not be after to_date",
        ));
    }

    info!(
        from = %body.from_date,
        to = %body.to_date,
        format = body.format.as_str(),
        "gathering manifests"
    );

    match state
        .shipping
        .get_manifest(
            body.account_codes.as_deref(),
            body.format,
            body.from_date,
            body.to_date,
        )
        .await
    {
        Ok(documents) => HttpResponse::Ok().json(ManifestResponse {
            success: true,
            documents,
        }),
        Err(e) => {
            error!(error = %e, "manifest gathering failed");
            carrier_error_response(&e)
        }
    }
}
