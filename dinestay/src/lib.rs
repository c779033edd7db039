//! # dinestay: hotel and restaurant catalog service
//!
//! `dinestay` exposes a REST API over two parallel collections, hotels and restaurants. Each entry
//! carries contact details, a category, hosted images and embedded user reviews with an aggregate
//! rating.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Handlers are written once, generic
//! over a [`types::ResourceType`] marker, and mounted for both kinds under `/api/v1`. They talk to
//! two seams held in [`AppState`]:
//!
//! - a [`db::handlers::ResourceStore`]: PostgreSQL in production, in-memory for development
//! - a [`media::MediaHost`]: Cloudinary in production, a dummy host otherwise
//!
//! Sessions are issued by a separate account service; this service only verifies the HS256 token
//! found in the session cookie or a bearer header (see [`auth`]).
//!
//! ### Public reads
//!
//! `GET /api/v1/hotels` accepts `keyword`, field filters such as `category=Luxury` or
//! `ratings[gte]=4`, and `page`. The [`query`] module turns these into a [`query::ResourceQuery`]
//! which both stores evaluate the same way. Responses carry the page, the total count and the
//! filtered count.
//!
//! ### Admin writes
//!
//! Creating or updating a resource uploads its images first. If any upload fails, the ones that
//! succeeded are destroyed again before the error is returned. Replaced images are released only
//! after the record points at the new set, and deleted images before the record is removed.
//!
//! ### Reviews
//!
//! A user has at most one review per resource. Submitting again replaces it. Every review write
//! recomputes the rating and count and is saved with a version check, retried on conflict.
//!
//! ## Getting started
//!
//! ```bash
//! DINESTAY_SECRET_KEY=... dinestay -f config.yaml
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod query;
pub mod reviews;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
pub mod types;

use axum::{Router, http::HeaderValue, routing::get};
use bon::Builder;
pub use config::Config;
use config::{CorsOrigin, DatabaseConfig};
use db::handlers::{InMemoryResourceStore, PgResourceStore, ResourceStore};
use media::MediaHost;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use types::{Hotels, Restaurants};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .store(Arc::new(InMemoryResourceStore::new()))
///     .media(media::create_media_host(&config.media)?)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ResourceStore>,
    pub media: Arc<dyn MediaHost>,
}

/// Get the dinestay database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the configured store. Returns the pool too, when there is one, so it can be closed
/// on shutdown.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn ResourceStore>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Postgres { url, pool } => {
            info!("Using PostgreSQL store");
            let mut options = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs));
            if pool.idle_timeout_secs > 0 {
                options = options.idle_timeout(Duration::from_secs(pool.idle_timeout_secs));
            }
            if pool.max_lifetime_secs > 0 {
                options = options.max_lifetime(Duration::from_secs(pool.max_lifetime_secs));
            }

            let pg = options.connect(url).await?;
            migrator().run(&pg).await?;
            Ok((Arc::new(PgResourceStore::new(pg.clone())), Some(pg)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory store: data will be lost on shutdown");
            Ok((Arc::new(InMemoryResourceStore::new()), None))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;
    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(cors_config.allow_credentials)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: both resource kinds under `/api/v1`, a health probe, CORS and
/// request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let api = Router::new()
        .merge(api::handlers::resource_routes::<Hotels>())
        .merge(api::handlers::resource_routes::<Restaurants>());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors),
        );

    Ok(router)
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] connects the store (running migrations for PostgreSQL),
///    builds the media host and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves, then closes the pool and flushes telemetry
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting dinestay with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        let media = media::create_media_host(&config.media)?;

        let state = AppState::builder().config(config.clone()).store(store).media(media).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("dinestay listening on http://{}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
