//! HTTP request handlers

pub mod health;
pub mod label;
pub mod manifest;
pub mod pickings;
pub mod pickup;
pub mod shipments;

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::carrier::CarrierError;

/// Error response envelope
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ApiError,
}

#[derive(Serialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            error: ApiError {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

/// Translate a carrier error into the HTTP response the host UI expects.
/// Transport failures map to 502 so the caller can tell a dead carrier
/// endpoint from a rejected request.
pub fn carrier_error_response(err: &CarrierError) -> HttpResponse {
    let message = err.to_string();
    match err {
        CarrierError::NotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse::new("NOT_FOUND", message))
        }
        CarrierError::AlreadyShipped { .. } => {
            HttpResponse::Conflict().json(ErrorResponse::new("ALREADY_SHIPPED", message))
        }
        CarrierError::Rejected(_) => HttpResponse::UnprocessableEntity()
            .json(ErrorResponse::new("CARRIER_REJECTED", message)),
        CarrierError::NotConfigured(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("ACCOUNT_NOT_CONFIGURED", message))
        }
        CarrierError::Http(_) => {
            HttpResponse::BadGateway().json(ErrorResponse::new("CARRIER_UNREACHABLE", message))
        }
        CarrierError::Api { .. } | CarrierError::Parse(_) => {
            HttpResponse::BadGateway().json(ErrorResponse::new("CARRIER_ERROR", message))
        }
        CarrierError::Render(_) | CarrierError::Internal(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("INTERNAL", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let response = carrier_error_response(&CarrierError::NotFound("picking X".to_string()));
        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);

        let response = carrier_error_response(&CarrierError::AlreadyShipped {
            picking: "WH/OUT/1".to_string(),
            tracking: "BL1".to_string(),
        });
        assert_eq!(response.status(), actix_web::http::StatusCode::CONFLICT);

        let response = carrier_error_response(&CarrierError::Rejected(vec![]));
        assert_eq!(
            response.status(),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY
        );

        let response = carrier_error_response(&CarrierError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_GATEWAY);
    }
}
