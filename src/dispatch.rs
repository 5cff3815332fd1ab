//! Bounded concurrent lookup dispatch
//!
//! Every unique input prefix becomes one unit of work: normalize, then
//! resolve through the shared cache. At most `workers` units are in flight at
//! once and rows are collected in completion order.

use crate::asn::cache::LookupCache;
use crate::asn::lookup::LookupResult;
use crate::asn::service::{PrefixResolver, RdapResolver};
use crate::asn::ResolveError;
use crate::config::LookupConfig;
use crate::prefix::{normalize, RawPrefix};
use crate::report::{OutputRecord, ProgressReporter};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Drop missing values and exact duplicates, keeping first occurrences
pub fn unique_prefixes<I>(prefixes: I) -> Vec<RawPrefix>
where
    I: IntoIterator<Item = Option<RawPrefix>>,
{
    let mut seen = HashSet::new();
    prefixes
        .into_iter()
        .flatten()
        .filter(|raw| seen.insert(raw.clone()))
        .collect()
}

/// Runs prefix lookups with bounded concurrency
#[derive(Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn PrefixResolver>,
    cache: Arc<LookupCache>,
    workers: usize,
}

impl Dispatcher {
    /// Create a dispatcher from its parts; `workers` is clamped to at least 1
    pub fn new(resolver: Arc<dyn PrefixResolver>, cache: Arc<LookupCache>, workers: usize) -> Self {
        Self {
            resolver,
            cache,
            workers: workers.max(1),
        }
    }

    /// Create a registry-backed dispatcher with a fresh cache
    pub fn from_config(config: &LookupConfig) -> Result<Self, ResolveError> {
        let resolver = RdapResolver::new(config)?;
        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(LookupCache::new(config.cache_size)),
            config.workers,
        ))
    }

    /// The cache shared by this dispatcher's lookups
    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Number of lookups allowed in flight
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Look up every unique prefix, returning one row per unique raw value.
    ///
    /// Rows come back in completion order. `progress` is told the total up
    /// front and again after every finished prefix.
    pub async fn dispatch<I>(&self, prefixes: I, progress: &dyn ProgressReporter) -> Vec<OutputRecord>
    where
        I: IntoIterator<Item = Option<RawPrefix>>,
    {
        let unique = unique_prefixes(prefixes);
        let total = unique.len();
        tracing::info!(
            "dispatching {total} unique prefixes across {} workers",
            self.workers
        );

        progress.on_progress(0, total);
        let mut completed = 0;
        let mut records = Vec::with_capacity(total);
        let mut pending = stream::iter(unique)
            .map(|raw| self.process(raw))
            .buffer_unordered(self.workers);

        while let Some(record) = pending.next().await {
            completed += 1;
            progress.on_progress(completed, total);
            records.push(record);
        }

        let stats = self.cache.stats();
        tracing::info!(
            "finished {completed} prefixes (cache: {} entries, {} hits, {} misses)",
            stats.entries,
            stats.hits,
            stats.misses
        );
        records
    }

    /// Handle one raw prefix from normalization to output row
    pub async fn process(&self, raw: RawPrefix) -> OutputRecord {
        let Some(prefix) = normalize(&raw) else {
            tracing::warn!("invalid prefix {:?}", raw.as_str());
            return OutputRecord::new(raw.as_str(), LookupResult::invalid_prefix());
        };

        let resolver = Arc::clone(&self.resolver);
        let target = prefix.clone();
        let result = self
            .cache
            .get_or_compute(&prefix, move || async move { resolver.resolve(&target).await })
            .await;

        if result.is_error() {
            tracing::warn!("{prefix}: {}", result.provider);
        }
        OutputRecord::new(prefix.into_string(), result)
    }
}
