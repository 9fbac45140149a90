//! API module - HTTP routes and handlers

pub mod handlers;
pub mod openapi;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/pickings")
                    .route("", web::post().to(handlers::pickings::register_picking))
                    // Picking references contain slashes, hence the tail match
                    .route("/{name:.*}", web::get().to(handlers::pickings::get_picking)),
            )
            .service(
                web::scope("/shipments")
                    .route("/send", web::post().to(handlers::shipments::send_shipping))
                    .route("/cancel", web::post().to(handlers::shipments::cancel_shipment))
                    .route("/track", web::post().to(handlers::shipments::update_tracking))
                    .route("/{tracking}/label", web::get().to(handlers::label::get_label))
                    .route("/{tracking}/link", web::get().to(handlers::shipments::tracking_link)),
            )
            .route("/manifest", web::post().to(handlers::manifest::get_manifest))
            .route("/pickup", web::post().to(handlers::pickup::create_pickup)),
    )
    // Inbound label endpoint consumed by the host order-management UI
    .route("/delivery/print_label", web::get().to(handlers::label::print_label))
    .route("/health", web::get().to(handlers::health::health_check))
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
