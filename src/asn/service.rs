//! Prefix resolution service
//!
//! This module provides the resolver used by the dispatcher, combining the
//! Cymru origin lookup with an RDAP network query and turning every failure
//! into a [`LookupResult`].

use super::lookup::{
    create_default_resolver, lookup_as_name, lookup_origin, network_address, LookupResult,
    RegistryRecord, ResolveError,
};
use super::rdap;
use crate::config::LookupConfig;
use crate::prefix::NormalizedPrefix;
use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

// Lets the per-prefix timeout fire before the HTTP client's own timer
const HTTP_TIMEOUT_GRACE: Duration = Duration::from_millis(500);

/// Something that can turn a normalized prefix into an (ASN, provider) pair.
///
/// Implementations must never fail: errors are reported inside the
/// returned [`LookupResult`].
#[async_trait]
pub trait PrefixResolver: Send + Sync {
    /// Resolve one prefix
    async fn resolve(&self, prefix: &NormalizedPrefix) -> LookupResult;
}

/// Registry-backed resolver
///
/// # Examples
///
/// ```no_run
/// use pfx2asn::asn::service::{PrefixResolver, RdapResolver};
/// use pfx2asn::config::LookupConfig;
/// use pfx2asn::prefix::{normalize, RawPrefix};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = RdapResolver::new(&LookupConfig::default())?;
///     let prefix = normalize(&RawPrefix::from("8.8.8.8")).expect("valid prefix");
///
///     let result = resolver.resolve(&prefix).await;
///     println!("AS{}: {}", result.asn, result.provider);
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct RdapResolver {
    dns: Arc<TokioResolver>,
    http: reqwest::Client,
    rdap_base_url: String,
    timeout: Duration,
}

impl RdapResolver {
    /// Create a resolver with a default DNS resolver
    pub fn new(config: &LookupConfig) -> Result<Self, ResolveError> {
        Self::with_resolver(config, create_default_resolver())
    }

    /// Create a resolver using a specific DNS resolver
    pub fn with_resolver(
        config: &LookupConfig,
        dns: Arc<TokioResolver>,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            dns,
            http: rdap::build_client(config.lookup_timeout + HTTP_TIMEOUT_GRACE)?,
            rdap_base_url: config.rdap_base_url.clone(),
            timeout: config.lookup_timeout,
        })
    }

    /// Gather the raw registry fields for a prefix
    pub async fn lookup(&self, prefix: &NormalizedPrefix) -> Result<RegistryRecord, ResolveError> {
        let ip = network_address(prefix.as_str())?;

        let (asn, network) = tokio::join!(
            self.lookup_asn(ip),
            rdap::lookup_network(&self.http, &self.rdap_base_url, ip)
        );
        let (asn, description) = asn?;
        let network = network?;

        Ok(RegistryRecord {
            asn: Some(asn),
            asn_description: description.into_iter().collect(),
            network_name: network.name,
        })
    }

    async fn lookup_asn(&self, ip: IpAddr) -> Result<(String, Option<String>), ResolveError> {
        let origin = lookup_origin(&self.dns, ip).await?;
        let name = lookup_as_name(&self.dns, &origin.asn).await;
        tracing::trace!(
            "origin for {ip}: AS{} {} {} {}",
            origin.asn,
            origin.prefix,
            origin.country_code,
            origin.registry
        );
        Ok((origin.asn, name))
    }
}

#[async_trait]
impl PrefixResolver for RdapResolver {
    async fn resolve(&self, prefix: &NormalizedPrefix) -> LookupResult {
        let outcome = match tokio::time::timeout(self.timeout, self.lookup(prefix)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ResolveError::Timeout(self.timeout.as_millis())),
        };

        match outcome {
            Ok(record) => {
                let result = record.into_lookup_result();
                tracing::debug!("{prefix}: AS{} {}", result.asn, result.provider);
                result
            }
            Err(e) => {
                tracing::debug!("{prefix}: lookup failed: {e}");
                LookupResult::from_error(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::{normalize, RawPrefix};

    fn offline_config() -> LookupConfig {
        LookupConfig::builder()
            .rdap_base_url("http://127.0.0.1:9")
            .lookup_timeout(Duration::from_millis(1500))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_network_is_data() {
        let resolver = RdapResolver::new(&offline_config()).unwrap();
        let prefix = normalize(&RawPrefix::from("not-an-ip/abc")).unwrap();

        let result = resolver.resolve(&prefix).await;
        assert_eq!(result.asn, "N/A");
        assert_eq!(
            result.provider,
            "Error: 'not-an-ip/abc' does not appear to be an IPv4 or IPv6 network"
        );
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_data() {
        let resolver = RdapResolver::new(&offline_config()).unwrap();
        let prefix = normalize(&RawPrefix::from("8.8.8.8")).unwrap();

        // The RDAP endpoint refuses connections, so this must come back as
        // an error row rather than a panic or a hang
        let result = resolver.resolve(&prefix).await;
        assert_eq!(result.asn, "N/A");
        assert!(result.is_error(), "unexpected result {result:?}");
    }

    #[tokio::test]
    async fn test_public_prefix_lookup() {
        let resolver = RdapResolver::new(&LookupConfig::default()).unwrap();
        let prefix = normalize(&RawPrefix::from("8.8.8.8")).unwrap();

        let result = resolver.resolve(&prefix).await;
        if !result.is_error() {
            assert_eq!(result.asn, "15169");
            assert!(result.provider.to_uppercase().contains("GOOGLE"));
        }
        // Allow test to pass even if network is unavailable
    }

    #[tokio::test]
    async fn test_hanging_registry_times_out() {
        // Accept connections and never answer
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = LookupConfig::builder()
            .rdap_base_url(format!("http://{addr}"))
            .lookup_timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        let resolver = RdapResolver::new(&config).unwrap();
        let prefix = normalize(&RawPrefix::from("192.0.2.0/24")).unwrap();

        let start = std::time::Instant::now();
        let result = resolver.resolve(&prefix).await;
        let elapsed = start.elapsed();
        server.abort();

        assert_eq!(result.asn, "N/A");
        assert_eq!(result.provider, "Error: lookup timed out after 300ms");
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    }
}
