mod api;
mod clients;
mod config;
mod domain;
mod error;
mod middleware;
mod storage;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clients::{AuthClient, Authorizer, StaticAuthorizer};
use config::Config;
use domain::catalog::ConnectorCatalog;
use domain::resolver::ConnectorResolver;
use error::AppResult;
use storage::memory::InMemoryStore;
use storage::ConnectorStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<ConnectorCatalog>,
    pub store: Arc<dyn ConnectorStore>,
    pub resolver: ConnectorResolver,
    pub started_at: Instant,
}

impl AppState {
    /// Build the catalog and collaborators described by the configuration.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let catalog = Arc::new(match &config.catalog_path {
            Some(path) => ConnectorCatalog::from_file(path)?,
            None => ConnectorCatalog::builtin(),
        });

        let authorizer: Arc<dyn Authorizer> = match &config.auth_service_url {
            Some(url) => Arc::new(AuthClient::with_api_key(
                url.clone(),
                config.internal_api_key.clone(),
            )),
            None => Arc::new(StaticAuthorizer::new(config.static_permissions.clone())),
        };

        let store: Arc<dyn ConnectorStore> = Arc::new(InMemoryStore::new());

        let resolver = ConnectorResolver::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            Arc::new(config.demo_connectors.clone()),
            authorizer,
        );

        Ok(Self {
            config,
            catalog,
            store,
            resolver,
            started_at: Instant::now(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "connector_registry=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let port = config.port;

    info!("Starting connector-registry on port {}", port);
    match &config.auth_service_url {
        Some(url) => info!("Auth service URL: {}", url),
        None => info!("No auth service configured, using static permissions"),
    }

    let app_state = AppState::from_config(config).context("Failed to initialize connector catalog")?;
    info!(
        "Loaded {} connector types and {} demo connectors",
        app_state.catalog.len(),
        app_state.config.demo_connectors.len()
    );
    let app_state = web::Data::new(app_state);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_origin("http://127.0.0.1:5173")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(api::configure_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
