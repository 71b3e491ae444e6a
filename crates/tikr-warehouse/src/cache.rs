use crate::api::{PriceQuery, PriceSource};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tikr_table::RawTable;
use tracing::{debug, trace};

/// Fetched tables keyed by `(ticker, start, end)`.
///
/// Entries live until the caller invalidates them; there is no eviction.
#[derive(Debug, Default)]
pub struct PriceCache {
    tables: HashMap<PriceQuery, Arc<RawTable>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &PriceQuery) -> Option<Arc<RawTable>> {
        self.tables.get(query).cloned()
    }

    pub fn insert(&mut self, query: PriceQuery, table: RawTable) -> Arc<RawTable> {
        let table = Arc::new(table);
        self.tables.insert(query, table.clone());
        table
    }

    /// Return the cached table, or fetch it from `source` and keep it.
    ///
    /// A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<S>(&mut self, source: &S, query: &PriceQuery) -> Result<Arc<RawTable>>
    where
        S: PriceSource + ?Sized,
    {
        if let Some(table) = self.get(query) {
            trace!("cache hit for {query}");
            return Ok(table);
        }

        debug!("cache miss for {query}; fetching from {}", source.name());
        let table = source.fetch(query).await?;
        Ok(self.insert(query.clone(), table))
    }

    /// Drop one entry; returns whether it was present.
    pub fn invalidate(&mut self, query: &PriceQuery) -> bool {
        let removed = self.tables.remove(query).is_some();
        if removed {
            debug!("invalidated {query}");
        }
        removed
    }

    pub fn clear(&mut self) {
        debug!("clearing {} cached tables", self.tables.len());
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
