//! Application startup and lifecycle management.

use crate::config::{GarageConfig, StorageBackend};
use crate::handlers::{self, catalog, documents, parties};
use crate::services::{init_metrics, Database, DocumentEngine, MemoryStore, Store};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{http_request_span, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GarageConfig,
    pub store: Arc<dyn Store>,
    pub engine: DocumentEngine,
}

impl AppState {
    pub fn new(config: GarageConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            engine: DocumentEngine::new(store.clone()),
            store,
        }
    }
}

/// All HTTP routes with the shared middleware stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/invoices",
            get(documents::list_invoices).post(documents::create_invoice),
        )
        .route(
            "/invoices/:id",
            get(documents::get_document)
                .put(documents::update_invoice)
                .delete(documents::delete_document),
        )
        .route(
            "/quotations",
            get(documents::list_quotations).post(documents::create_quotation),
        )
        .route(
            "/quotations/:id",
            get(documents::get_document)
                .put(documents::update_quotation)
                .delete(documents::delete_document),
        )
        .route("/clients/search", get(parties::search_clients))
        .route("/clients/:id", get(parties::get_client))
        .route("/vehicles/search", get(parties::search_vehicles))
        .route("/vehicles/:id", get(parties::get_vehicle))
        .route("/parts", get(catalog::list_parts).post(catalog::create_part))
        .route("/parts/:id", get(catalog::get_part))
        .route(
            "/technicians",
            get(catalog::list_technicians).post(catalog::create_technician),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(http_request_span::<axum::body::Body>)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application, connecting to the configured storage.
    pub async fn build(config: GarageConfig) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = match &config.storage {
            StorageBackend::Postgres(database) => {
                let db = Database::new(
                    &database.url,
                    database.max_connections,
                    database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    e
                })?;

                db.run_migrations().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to run migrations");
                    e
                })?;

                Arc::new(db)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Self::build_with_store(config, store).await
    }

    /// Build the application over an existing store.
    pub async fn build_with_store(
        config: GarageConfig,
        store: Arc<dyn Store>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let addr = config.common.bind_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Garage service listener bound");

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, store),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a handle to the storage backend.
    pub fn store(&self) -> Arc<dyn Store> {
        self.state.store.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = %self.state.config.service_name,
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        let app = router(self.state);
        axum::serve(self.listener, app).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
