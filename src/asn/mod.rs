//! ASN (Autonomous System Number) lookup functionality

pub mod cache;
pub mod lookup;
pub mod rdap;
pub mod service;

pub use cache::{CacheStats, LookupCache};
pub use lookup::{LookupResult, ResolveError, NOT_AVAILABLE};
pub use service::{PrefixResolver, RdapResolver};
