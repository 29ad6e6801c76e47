//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a REST API using Axum for the signup service.
// It is a thin transport: participants arrive fully described (profile or free-text name, role
// and forbidden flag) and every call maps to one service operation.
//
// | Component      | Description                                                |
// |----------------|------------------------------------------------------------|
// | API            | Main API structure coordinating routes and services        |
// | Routes         | Handler functions for API endpoints                        |
// | States         | Shared application state                                   |
// | DTOs           | Data transfer objects for API requests/responses           |
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name           | Description                                       | Key Methods       |
// |----------------|---------------------------------------------------|-------------------|
// | AppState       | Shared application state                          | new               |
// | Api            | Main API structure                                | routes, serve     |
//--------------------------------------------------------------------------------------------------

mod dto;
mod error;
mod routes;

use axum::{
    Extension, Router,
    http::{Method, header},
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::services::signup::SignupService;

pub use dto::*;
pub use error::{ApiError, ApiResult};

/// Shared application state accessible by all handlers
pub struct AppState {
    pub service: SignupService,
}

impl AppState {
    pub fn new(service: SignupService) -> Self {
        Self { service }
    }
}

/// Main API structure
pub struct Api {
    /// API address
    addr: SocketAddr,
    /// Shared application state
    state: Arc<AppState>,
}

impl Api {
    pub fn new(addr: SocketAddr, service: SignupService) -> Self {
        let state = Arc::new(AppState::new(service));
        Self { addr, state }
    }

    /// Creates all routes for the API
    pub fn routes(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

        Router::new()
            // Health check
            .route("/health", get(routes::health))
            // Event lifecycle
            .route("/events", post(routes::create_event))
            .route("/events/:id", get(routes::get_event))
            .route("/events/:id/history", get(routes::get_history))
            .route("/events/:id/post", put(routes::attach_post))
            .route("/events/:id/settings", put(routes::update_settings))
            // Registrations
            .route("/events/:id/registration", post(routes::lookup_registration))
            .route("/events/:id/couples", post(routes::add_couple))
            .route("/events/:id/singles", post(routes::add_single))
            .route("/events/:id/withdrawals", post(routes::remove_dancer))
            // Attach application state
            .layer(Extension(self.state.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Starts the API server and runs until shutdown
    pub async fn serve(self) -> std::io::Result<()> {
        let app = self.routes();

        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "API listening");
        axum::serve(listener, app).await
    }
}
