//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    health::HealthResponse,
    label::LabelResponse,
    manifest::{ManifestRequest, ManifestResponse},
    pickings::{PickingView, RegisterResponse},
    pickup::{PickupRequest, PickupResponse},
    shipments::{
        CancelRequest, CancelResponse, SendRequest, SendResponse, TrackRequest,
        TrackingLinkResponse,
    },
    ApiError, ErrorResponse,
};
use crate::domain::{
    Address, AuditNote, CarrierFault, DeliveryState, DocumentFormat, DocumentLayout, Fulfillment,
    LabelDocument, ManifestFormat, OrderLine, TrackingEvent,
};
use crate::shipping::{PickupOutcome, ShipOutcome};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Banlingkit Express API",
        version = "1.0.0",
        description = "Order-fulfillment integration with the Banlingkit Express parcel carrier: \
                       shipments, tracking, cancellation, labels, manifests and pickups",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "pickings", description = "Fulfillment record intake and inspection"),
        (name = "shipments", description = "Shipment lifecycle operations"),
        (name = "labels", description = "Label fetching and printing"),
        (name = "manifests", description = "Batch shipment reports"),
        (name = "pickups", description = "Carrier pickup scheduling")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::pickings::register_picking,
        crate::api::handlers::pickings::get_picking,
        crate::api::handlers::shipments::send_shipping,
        crate::api::handlers::shipments::cancel_shipment,
        crate::api::handlers::shipments::update_tracking,
        crate::api::handlers::shipments::tracking_link,
        crate::api::handlers::label::get_label,
        crate::api::handlers::label::print_label,
        crate::api::handlers::manifest::get_manifest,
        crate::api::handlers::pickup::create_pickup,
    ),
    components(
        schemas(
            // Health schemas
            HealthResponse,
            // Picking schemas
            PickingView,
            RegisterResponse,
            // Shipment schemas
            SendRequest,
            SendResponse,
            CancelRequest,
            CancelResponse,
            TrackRequest,
            TrackingLinkResponse,
            ShipOutcome,
            // Label schemas
            LabelResponse,
            // Manifest / pickup schemas
            ManifestRequest,
            ManifestResponse,
            PickupRequest,
            PickupResponse,
            PickupOutcome,
            // Error schemas
            ErrorResponse,
            ApiError,
            // Domain schemas
            Fulfillment,
            Address,
            OrderLine,
            AuditNote,
            DeliveryState,
            TrackingEvent,
            CarrierFault,
            LabelDocument,
            DocumentLayout,
            DocumentFormat,
            ManifestFormat,
        )
    )
)]
pub struct ApiDoc;
