//! Origin ASN lookup using Team Cymru's DNS whois service

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Placeholder written for any field the registry did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Provider text for rows whose prefix could not be normalized
pub const INVALID_PREFIX: &str = "Error: Invalid prefix format";

/// Error type for a single prefix resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The prefix is not a parseable IP network
    #[error("'{0}' does not appear to be an IPv4 or IPv6 network")]
    InvalidNetwork(String),

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsError(String),

    /// Invalid response format
    #[error("Invalid ASN response format")]
    InvalidFormat,

    /// No ASN data found
    #[error("No ASN data found")]
    NotFound,

    /// HTTP request to the RDAP service failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// RDAP service answered with something unusable
    #[error("RDAP lookup failed: {0}")]
    RdapError(String),

    /// The lookup did not finish in time
    #[error("lookup timed out after {0}ms")]
    Timeout(u128),
}

/// The (ASN, provider) pair stored in the cache and written to the output.
///
/// Failures are values too: `provider` then holds `Error: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Autonomous System Number, or `N/A`
    pub asn: String,
    /// Organization name, `N/A`, or an error description
    pub provider: String,
}

impl LookupResult {
    /// Create a result from an ASN and provider name
    pub fn new(asn: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            asn: asn.into(),
            provider: provider.into(),
        }
    }

    /// Record a failed lookup as data
    pub fn from_error(err: &ResolveError) -> Self {
        Self::new(NOT_AVAILABLE, format!("Error: {err}"))
    }

    /// The fixed result for a prefix that failed normalization
    pub fn invalid_prefix() -> Self {
        Self::new(NOT_AVAILABLE, INVALID_PREFIX)
    }

    /// Whether this result describes a failure
    pub fn is_error(&self) -> bool {
        self.provider.starts_with("Error: ")
    }
}

/// Raw registry fields gathered for one network address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Origin ASN
    pub asn: Option<String>,
    /// ASN description lines
    pub asn_description: Vec<String>,
    /// Network name from the RDAP registration
    pub network_name: Option<String>,
}

impl RegistryRecord {
    /// Shape the raw fields into the output pair.
    ///
    /// Description lines are joined with `", "`. Without a description the
    /// RDAP network name is used instead, and anything still missing
    /// becomes `N/A`.
    pub fn into_lookup_result(self) -> LookupResult {
        let asn = self
            .asn
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let description = self
            .asn_description
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let provider = if description.is_empty() || description == NOT_AVAILABLE {
            self.network_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        } else {
            description
        };

        LookupResult { asn, provider }
    }
}

/// Origin data from the Cymru origin zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginInfo {
    /// Origin ASN (first one if several are announced)
    pub asn: String,
    /// Announced prefix covering the address
    pub prefix: String,
    /// Two-letter country code
    pub country_code: String,
    /// Regional Internet Registry
    pub registry: String,
}

/// First address of the network a prefix names.
///
/// Host bits are allowed, so `10.0.0.7/24` resolves to `10.0.0.0`.
pub fn network_address(prefix: &str) -> Result<IpAddr, ResolveError> {
    prefix
        .trim()
        .parse::<IpNet>()
        .map(|net| net.network())
        .map_err(|_| ResolveError::InvalidNetwork(prefix.to_string()))
}

/// Build the origin zone query name for an address
pub fn form_origin_query(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => form_origin_query_v4(v4),
        IpAddr::V6(v6) => form_origin_query_v6(v6),
    }
}

fn form_origin_query_v4(ip: &Ipv4Addr) -> String {
    let octets = ip.octets();
    format!(
        "{}.{}.{}.{}.origin.asn.cymru.com",
        octets[3], octets[2], octets[1], octets[0]
    )
}

fn form_origin_query_v6(ip: &Ipv6Addr) -> String {
    let mut query = String::with_capacity(96);
    for byte in ip.octets().iter().rev() {
        let _ = write!(query, "{:x}.{:x}.", byte & 0x0f, byte >> 4);
    }
    query.push_str("origin6.asn.cymru.com");
    query
}

/// Parse an origin TXT answer such as `15169 | 8.8.8.0/24 | US | arin | 2023-12-28`
pub fn parse_origin_response(txt: &str) -> Option<OriginInfo> {
    let parts: Vec<&str> = txt.split('|').map(|p| p.trim().trim_matches('"')).collect();
    if parts.len() < 3 {
        return None;
    }

    // Multi-origin prefixes list several ASNs separated by spaces
    let asn = parts[0].split_whitespace().next()?.to_string();
    if !asn.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(OriginInfo {
        asn,
        prefix: parts[1].to_string(),
        country_code: parts[2].to_string(),
        registry: parts.get(3).map(|s| (*s).to_string()).unwrap_or_default(),
    })
}

/// Parse an AS name TXT answer such as `15169 | US | arin | 2000-03-30 | GOOGLE, US`
pub fn parse_as_name_response(txt: &str) -> Option<String> {
    let parts: Vec<&str> = txt.split('|').map(str::trim).collect();
    if parts.len() >= 5 {
        let name = parts[4].trim_matches('"').trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

async fn first_txt(resolver: &TokioResolver, query: String) -> Result<String, ResolveError> {
    let lookup = resolver
        .txt_lookup(query)
        .await
        .map_err(|e| ResolveError::DnsError(e.to_string()))?;

    let record = lookup.iter().next().ok_or(ResolveError::NotFound)?;

    Ok(record
        .iter()
        .map(|data| String::from_utf8_lossy(data))
        .collect::<Vec<_>>()
        .join(""))
}

/// Look up the origin ASN for an address
pub async fn lookup_origin(
    resolver: &TokioResolver,
    ip: IpAddr,
) -> Result<OriginInfo, ResolveError> {
    let txt = first_txt(resolver, form_origin_query(&ip)).await?;
    parse_origin_response(&txt).ok_or(ResolveError::InvalidFormat)
}

/// Look up the registered name of an AS.
///
/// Returns `None` when the name is unavailable; that is not an error for
/// callers, who fall back to other registry fields.
pub async fn lookup_as_name(resolver: &TokioResolver, asn: &str) -> Option<String> {
    match first_txt(resolver, format!("AS{asn}.asn.cymru.com")).await {
        Ok(txt) => parse_as_name_response(&txt),
        Err(e) => {
            tracing::debug!("AS name lookup for AS{asn} failed: {e}");
            None
        }
    }
}

/// Create a default DNS resolver for ASN lookups
pub fn create_default_resolver() -> Arc<TokioResolver> {
    Arc::new(
        TokioResolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .build(),
    )
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod lookup_tests;
