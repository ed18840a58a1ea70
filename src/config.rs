use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Local or mounted CSV file tried first.
    pub customer_data_path: PathBuf,
    /// Object store source; `None` when `MINIO_ENDPOINT` is unset.
    pub object_store: Option<ObjectStoreConfig>,
    /// Relational source; `None` when no database URL is configured.
    pub database_url: Option<String>,
    pub customer_table: String,
    pub source_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: String,
    pub object_key: String,
    pub region: String,
    pub staging_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            customer_data_path: std::env::var("CUSTOMER_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/customers.csv")),
            object_store: ObjectStoreConfig::from_env()?,
            database_url: non_empty_var("DATABASE_URL")
                .or_else(|| non_empty_var("DB_URL"))
                .map(|url| {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })
                .transpose()?,
            customer_table: std::env::var("CUSTOMER_TABLE")
                .unwrap_or_else(|_| "customers".to_string())
                .trim()
                .to_string(),
            source_timeout: Duration::from_secs(
                std::env::var("SOURCE_TIMEOUT_SECS")
                    .ok()
                    .map(|v| {
                        v.parse::<u64>().map_err(|_| {
                            anyhow::anyhow!("SOURCE_TIMEOUT_SECS must be a whole number of seconds")
                        })
                    })
                    .transpose()?
                    .unwrap_or(30),
            ),
        };

        if !is_valid_table_name(&config.customer_table) {
            anyhow::bail!(
                "CUSTOMER_TABLE must be a plain or schema-qualified identifier, got '{}'",
                config.customer_table
            );
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Customer data path: {}", config.customer_data_path.display());
        if let Some(ref store) = config.object_store {
            tracing::info!(
                "Object store source configured: {}/{}/{}",
                store.endpoint,
                store.bucket,
                store.object_key
            );
        }
        if config.database_url.is_some() {
            tracing::info!("Database source configured (table '{}')", config.customer_table);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

impl ObjectStoreConfig {
    fn from_env() -> anyhow::Result<Option<Self>> {
        let Some(endpoint) = non_empty_var("MINIO_ENDPOINT") else {
            return Ok(None);
        };
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            anyhow::bail!("MINIO_ENDPOINT must start with http:// or https://");
        }

        Ok(Some(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_key: non_empty_var("MINIO_ACCESS_KEY"),
            secret_key: non_empty_var("MINIO_SECRET_KEY"),
            bucket: non_empty_var("MINIO_BUCKET").unwrap_or_else(|| "telecom-data".to_string()),
            object_key: non_empty_var("MINIO_OBJECT")
                .unwrap_or_else(|| "customers.csv".to_string()),
            region: non_empty_var("MINIO_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            staging_path: non_empty_var("MINIO_STAGING_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("customers_download.csv")),
        }))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Table names are interpolated into `SELECT * FROM <table>`, so only bare
/// or schema-qualified identifiers are accepted.
pub fn is_valid_table_name(name: &str) -> bool {
    let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("table name pattern is valid");
    identifier.is_match(name)
}
