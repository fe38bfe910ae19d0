//! Storefront and manager HTTP API.
//!
//! `/api/*` is what the shop frontend talks to; `/manager/*` backs the
//! restaurateur's screens.

pub mod error;
pub mod handlers;

use crate::application::catalog::CatalogService;
use crate::application::dashboard::OrderDashboard;
use crate::application::ordering::OrderIntake;
use crate::application::ranking::RankingEngine;
use crate::domain::ports::{CatalogStoreRef, OrderStoreRef};
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub intake: Arc<OrderIntake>,
    pub dashboard: Arc<OrderDashboard>,
}

impl AppState {
    pub fn new(catalog: CatalogStoreRef, orders: OrderStoreRef, ranking: RankingEngine) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(catalog.clone())),
            intake: Arc::new(OrderIntake::new(catalog.clone(), orders.clone())),
            dashboard: Arc::new(OrderDashboard::new(catalog, orders, ranking)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/products", get(handlers::product_list))
        .route("/api/order", post(handlers::register_order))
        .route("/manager/restaurants", get(handlers::restaurants))
        .route("/manager/products", get(handlers::availability_matrix))
        .route(
            "/manager/restaurants/{restaurant_id}/menu/{product_id}",
            put(handlers::set_availability),
        )
        .route("/manager/orders", get(handlers::open_orders))
        .route(
            "/manager/orders/{order_id}/restaurant",
            put(handlers::assign_restaurant),
        )
        .route("/manager/orders/{order_id}/status", put(handlers::set_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, address: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
