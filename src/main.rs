use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telecom_insights_api::config::Config;
use telecom_insights_api::db::Database;
use telecom_insights_api::handlers::{self, AppState};
use telecom_insights_api::object_store::{Credentials, ObjectStoreClient};
use telecom_insights_api::repository::CustomerRepository;
use telecom_insights_api::sources::{
    DataSource, DatabaseSource, FilesystemSource, ObjectStoreSource,
};

/// Builds the data sources in fallback order: local file, object store,
/// relational database. Sources that are not configured, or whose client
/// cannot be constructed, are left out.
fn build_sources(config: &Config) -> Vec<Box<dyn DataSource>> {
    let mut sources: Vec<Box<dyn DataSource>> =
        vec![Box::new(FilesystemSource::new(config.customer_data_path.clone()))];

    if let Some(ref store) = config.object_store {
        let credentials = match (&store.access_key, &store.secret_key) {
            (Some(access_key), Some(secret_key)) => Some(Credentials {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            }),
            _ => None,
        };
        match ObjectStoreClient::new(
            &store.endpoint,
            store.region.clone(),
            credentials,
            config.source_timeout,
        ) {
            Ok(client) => {
                tracing::info!("✓ Object store client initialized: {}", store.endpoint);
                sources.push(Box::new(ObjectStoreSource::new(
                    client,
                    store.bucket.clone(),
                    store.object_key.clone(),
                    store.staging_path.clone(),
                )));
            }
            Err(e) => tracing::error!("Failed to initialize object store client: {}", e),
        }
    }

    if let Some(ref database_url) = config.database_url {
        match Database::connect_lazy(database_url, config.source_timeout) {
            Ok(db) => {
                tracing::info!("✓ Database pool configured");
                sources.push(Box::new(DatabaseSource::new(
                    db.pool,
                    config.customer_table.clone(),
                )));
            }
            Err(e) => tracing::error!("Failed to configure database pool: {}", e),
        }
    }

    sources
}

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the data sources and the customer
/// repository, then serves the API with rate limiting on every route except
/// the health check.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telecom_insights_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let repository = CustomerRepository::new(build_sources(&config));
    tracing::info!(
        "Customer repository initialized (sources: {:?})",
        repository.source_names()
    );

    let app_state = Arc::new(AppState {
        repository: Arc::new(repository),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Health check bypasses rate limiting
    let app = handlers::compose(
        app_state,
        handlers::api_routes().layer(ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        })),
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
