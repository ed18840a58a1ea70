/// Providers of the full customer table.
///
/// Each source either yields every row it holds or fails as a whole; the
/// repository decides what to do with a failure. Individual cells that
/// cannot be decoded are coerced to `None` here and defaulted later.
use crate::errors::SourceError;
use crate::models::CustomerRow;
use crate::object_store::ObjectStoreClient;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Deserializer};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::path::{Path, PathBuf};

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<CustomerRow>, SourceError>;
}

// ============ Filesystem ============

/// CSV file on local or mounted storage.
pub struct FilesystemSource {
    path: PathBuf,
}

impl FilesystemSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for FilesystemSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch(&self) -> Result<Vec<CustomerRow>, SourceError> {
        read_csv_file(&self.path).await
    }
}

async fn read_csv_file(path: &Path) -> Result<Vec<CustomerRow>, SourceError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(SourceError::Missing(path.to_path_buf()));
    }
    let bytes = tokio::fs::read(path).await?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode_csv(bytes.as_slice())
}

// ============ Object Store ============

/// CSV object in an S3-compatible bucket, staged to a local file before parsing.
pub struct ObjectStoreSource {
    client: ObjectStoreClient,
    bucket: String,
    object_key: String,
    staging_path: PathBuf,
}

impl ObjectStoreSource {
    pub fn new(
        client: ObjectStoreClient,
        bucket: impl Into<String>,
        object_key: impl Into<String>,
        staging_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            object_key: object_key.into(),
            staging_path: staging_path.into(),
        }
    }
}

#[async_trait]
impl DataSource for ObjectStoreSource {
    fn name(&self) -> &str {
        "object-store"
    }

    async fn fetch(&self) -> Result<Vec<CustomerRow>, SourceError> {
        let body = self.client.get_object(&self.bucket, &self.object_key).await?;

        if let Some(parent) = self.staging_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.staging_path, &body).await?;
        tracing::debug!(
            "Staged {}/{} at {}",
            self.bucket,
            self.object_key,
            self.staging_path.display()
        );

        read_csv_file(&self.staging_path).await
    }
}

// ============ Relational Database ============

/// `SELECT * FROM <table>` against PostgreSQL.
pub struct DatabaseSource {
    pool: PgPool,
    table: String,
}

impl DatabaseSource {
    /// `table` must already be validated as an identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl DataSource for DatabaseSource {
    fn name(&self) -> &str {
        "database"
    }

    async fn fetch(&self) -> Result<Vec<CustomerRow>, SourceError> {
        let query = format!("SELECT * FROM {}", self.table);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        tracing::debug!("Fetched {} rows from table {}", rows.len(), self.table);
        Ok(rows.iter().map(customer_row_from_pg).collect())
    }
}

fn customer_row_from_pg(row: &PgRow) -> CustomerRow {
    CustomerRow {
        customer_id: pg_f64(row, "customer_id").and_then(non_negative_integer),
        name: pg_string(row, "name"),
        region: pg_string(row, "region"),
        avg_monthly_data_gb: pg_f64(row, "avg_monthly_data_gb"),
        avg_monthly_minutes: pg_f64(row, "avg_monthly_minutes"),
        avg_monthly_sms: pg_f64(row, "avg_monthly_sms"),
        avg_monthly_spend: pg_f64(row, "avg_monthly_spend"),
    }
}

fn pg_string(row: &PgRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column).ok().flatten()
}

/// Decodes whatever numeric type the column was declared with.
/// Missing columns and undecodable cells both come back as `None`.
fn pg_f64(row: &PgRow, column: &str) -> Option<f64> {
    if let Ok(v) = row.try_get::<Option<f64>, _>(column) {
        return v;
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(column) {
        return v.map(f64::from);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(column) {
        return v.map(|v| v as f64);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(column) {
        return v.map(f64::from);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(column) {
        return v.map(f64::from);
    }
    if let Ok(v) = row.try_get::<Option<BigDecimal>, _>(column) {
        return v.and_then(|d| d.to_f64());
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(column) {
        return v.and_then(|s| parse_number(&s));
    }
    tracing::debug!("Column '{}' missing or not numeric, defaulting", column);
    None
}

// ============ CSV Decoding ============

#[derive(Debug, Deserialize)]
struct CsvCustomerRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    customer_id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    avg_monthly_data_gb: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    avg_monthly_minutes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    avg_monthly_sms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    avg_monthly_spend: Option<f64>,
}

impl From<CsvCustomerRecord> for CustomerRow {
    fn from(record: CsvCustomerRecord) -> Self {
        Self {
            customer_id: record.customer_id,
            name: record.name,
            region: record.region,
            avg_monthly_data_gb: record.avg_monthly_data_gb,
            avg_monthly_minutes: record.avg_monthly_minutes,
            avg_monthly_sms: record.avg_monthly_sms,
            avg_monthly_spend: record.avg_monthly_spend,
        }
    }
}

/// Decodes a headed CSV document into raw customer rows.
///
/// Column order is irrelevant and unknown columns are ignored. Rows that
/// cannot be decoded at all are skipped with a warning.
pub fn decode_csv<R: std::io::Read>(reader: R) -> Result<Vec<CustomerRow>, SourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    // Surface unreadable headers as a source failure
    csv_reader.headers()?;

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<CsvCustomerRecord>().enumerate() {
        match record {
            Ok(record) => rows.push(CustomerRow::from(record)),
            Err(e) => tracing::warn!("Skipping undecodable CSV row {}: {}", index + 1, e),
        }
    }

    Ok(rows)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| {
        let parsed = parse_number(s);
        if parsed.is_none() && !s.is_empty() {
            tracing::debug!("Malformed numeric cell '{}', coercing to 0", s);
        }
        parsed
    }))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.and_then(non_negative_integer))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts ids written as `12` or `12.0`; anything else is dropped.
fn non_negative_integer(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
