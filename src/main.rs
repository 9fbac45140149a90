//! Banlingkit Express integration service
//!
//! Connects an order-fulfillment system to the Banlingkit Express parcel
//! carrier: shipment creation, tracking, cancellation, manifests, pickup
//! scheduling and printable PDF labels.

use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

mod api;
mod carrier;
mod config;
mod domain;
mod label;
mod shipping;
mod store;

use crate::config::Settings;
use crate::shipping::ShippingService;
use crate::store::FulfillmentStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<FulfillmentStore>,
    pub shipping: Arc<ShippingService>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("banlingkit_express=info".parse().unwrap())
                .add_directive("actix_web=info".parse().unwrap()),
        )
        .json()
        .init();

    // Load configuration
    let settings = Settings::load().expect("Failed to load configuration");
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting Banlingkit Express integration v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    let store = Arc::new(FulfillmentStore::new());
    let shipping = Arc::new(ShippingService::from_settings(&settings, store.clone()));
    info!("Configured {} carrier account(s)", shipping.account_count());
    if shipping.account_count() == 0 {
        tracing::warn!("No carrier accounts configured; shipment operations will fail");
    }

    let workers = settings
        .server
        .workers
        .unwrap_or_else(|| num_cpus::get() * 2);

    // Create shared application state
    let app_state = web::Data::new(AppState {
        settings: settings.clone(),
        store,
        shipping,
    });

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "banlingkit-express"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION"))),
            )
            // Routes
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
