//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::InvoicingConfig;
use crate::handlers::{api, health, pages};
use crate::repositories::{Database, HealthCheck, Repositories};
use crate::services::{InvoiceProductsService, InvoicesService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: InvoicingConfig,
    pub invoices_service: InvoicesService,
    pub invoice_products_service: InvoiceProductsService,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(config: InvoicingConfig, repositories: Repositories) -> Self {
        Self {
            config,
            invoices_service: InvoicesService::new(&repositories),
            invoice_products_service: InvoiceProductsService::new(&repositories),
            health: repositories.health,
        }
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(config: InvoicingConfig) -> Self {
        Self::new(config, Repositories::in_memory())
    }
}

pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(pages::index))
        .route("/invoices", get(pages::index))
        .route("/invoices/index", get(pages::index))
        .route(
            "/invoices/create",
            get(pages::create_page).post(pages::create),
        )
        .route(
            "/invoices/edit/:invoice_id",
            get(pages::edit_page).post(pages::edit),
        )
        .route("/invoices/delete", post(pages::delete))
        .route("/invoices/detail/:invoice_id", get(pages::detail))
        .route("/invoices/filter-results", post(pages::filter_results))
        .route("/invoices/export-excel", post(pages::export_excel))
        .route(
            "/invoices/add-invoice-product",
            post(pages::add_invoice_product),
        )
        .route(
            "/invoices/update-invoice-product",
            post(pages::update_invoice_product),
        )
        .route(
            "/invoices/delete-invoice-product",
            post(pages::delete_invoice_product),
        )
        .route("/invoices/print/:invoice_id", get(pages::print));

    let api = Router::new()
        .route(
            "/api/invoices",
            get(api::list_invoices).post(api::create_invoice),
        )
        .route("/api/invoices/export", post(api::export_invoices))
        .route(
            "/api/invoices/:invoice_id",
            get(api::get_invoice)
                .put(api::update_invoice)
                .delete(api::delete_invoice),
        )
        .route(
            "/api/invoices/:invoice_id/products",
            post(api::add_invoice_product),
        )
        .route(
            "/api/invoice-products/:invoice_product_id",
            put(api::update_invoice_product).delete(api::delete_invoice_product),
        );

    Router::new()
        .merge(pages)
        .merge(api)
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Connects to PostgreSQL and runs migrations when a database URL is
    /// configured; otherwise serves from the in-memory store.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        let repositories = match config.database.url.as_deref() {
            Some(url) => {
                let db = Database::new(
                    url,
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to PostgreSQL: {}", e);
                    e
                })?;

                db.run_migrations().await.map_err(|e| {
                    tracing::error!("Failed to run database migrations: {}", e);
                    e
                })?;

                Repositories::postgres(db)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Repositories::in_memory()
            }
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Invoicing service listening on port {}", port);

        let router = build_router(AppState::new(config, repositories));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
