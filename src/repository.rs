use crate::models::CustomerTable;
use crate::sources::DataSource;
use moka::future::Cache;
use std::sync::Arc;

const TABLE_KEY: &str = "customers";

/// Owns the cached customer table and the ordered list of sources it is
/// loaded from.
///
/// The cache holds at most one fully built table. Concurrent first requests
/// are coalesced into a single load, and an empty load result is never
/// cached, so a later request retries the sources.
pub struct CustomerRepository {
    sources: Vec<Box<dyn DataSource>>,
    cache: Cache<&'static str, Arc<CustomerTable>>,
}

impl CustomerRepository {
    /// `sources` are tried in the given order.
    pub fn new(sources: Vec<Box<dyn DataSource>>) -> Self {
        Self {
            sources,
            cache: Cache::builder().build(),
        }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns the cached table, loading it from the first source that
    /// yields rows when nothing is cached yet.
    ///
    /// Never fails: when every source fails or is empty, an empty table is
    /// returned and the next call tries again.
    pub async fn load(&self) -> Arc<CustomerTable> {
        if let Some(table) = self.cache.get(&TABLE_KEY).await {
            tracing::debug!("Customer table cache HIT ({} rows)", table.len());
            return table;
        }

        self.cache
            .optionally_get_with(TABLE_KEY, self.load_from_sources())
            .await
            .unwrap_or_else(|| Arc::new(CustomerTable::empty()))
    }

    async fn load_from_sources(&self) -> Option<Arc<CustomerTable>> {
        tracing::info!("Customer table cache MISS - trying {} sources", self.sources.len());

        for source in &self.sources {
            tracing::info!("Loading customers from {} source", source.name());
            match source.fetch().await {
                Ok(rows) if rows.is_empty() => {
                    tracing::warn!("{} source returned no rows, trying next", source.name());
                }
                Ok(rows) => {
                    let table = CustomerTable::from_rows(rows);
                    tracing::info!(
                        "✓ Loaded {} customers from {} source",
                        table.len(),
                        source.name()
                    );
                    return Some(Arc::new(table));
                }
                Err(e) => {
                    tracing::warn!("{} source unavailable: {}", source.name(), e);
                }
            }
        }

        tracing::warn!("No source produced customer data, serving empty table");
        None
    }
}
