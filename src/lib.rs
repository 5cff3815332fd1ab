//! pfx2asn - concurrent ASN and provider lookup for IP prefixes
//!
//! This library normalizes raw prefix values, resolves each unique prefix
//! to its origin ASN and provider name through a shared LRU cache, and
//! collects one output row per input value.
//!
//! ```no_run
//! use pfx2asn::{lookup_prefixes, LookupConfig, NoProgress, RawPrefix};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LookupConfig::builder().workers(4).build()?;
//!     let prefixes = vec![Some(RawPrefix::from("8.8.8.8")), Some(RawPrefix::from("1.1.1.0/24"))];
//!
//!     for row in lookup_prefixes(&config, prefixes, &NoProgress).await? {
//!         println!("{} AS{} {}", row.prefix, row.asn, row.provider);
//!     }
//!     Ok(())
//! }
//! ```

pub mod asn;
pub mod config;
pub mod dispatch;
pub mod prefix;
pub mod report;
pub mod table;

// Re-export core types for library users
pub use asn::{LookupCache, LookupResult, PrefixResolver, RdapResolver, ResolveError};
pub use config::{LookupConfig, LookupConfigBuilder};
pub use dispatch::Dispatcher;
pub use prefix::{normalize, NormalizedPrefix, RawPrefix};
pub use report::{NoProgress, OutputRecord, ProgressReporter, ResultCollector, RunSummary};
pub use table::{OutputFormat, TableError};

/// Look up a batch of prefixes with a fresh cache and the registry resolver
///
/// # Errors
///
/// Only fails if the resolver cannot be set up; individual prefix failures
/// are reported inside the returned rows.
pub async fn lookup_prefixes<I>(
    config: &LookupConfig,
    prefixes: I,
    progress: &dyn ProgressReporter,
) -> Result<Vec<OutputRecord>, ResolveError>
where
    I: IntoIterator<Item = Option<RawPrefix>>,
{
    let dispatcher = Dispatcher::from_config(config)?;
    Ok(dispatcher.dispatch(prefixes, progress).await)
}
