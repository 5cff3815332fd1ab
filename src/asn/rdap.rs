//! RDAP network registration lookups

use super::lookup::ResolveError;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Public RDAP bootstrap service that redirects to the responsible registry
pub const DEFAULT_RDAP_BASE_URL: &str = "https://rdap.org";

/// The subset of an RDAP IP network object we care about
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RdapNetwork {
    /// Registry handle (e.g. `NET-8-8-8-0-2`)
    #[serde(default)]
    pub handle: Option<String>,
    /// Network name (e.g. `GOGL`)
    #[serde(default)]
    pub name: Option<String>,
    /// Country code, when the registry publishes one
    #[serde(default)]
    pub country: Option<String>,
    /// First address of the registered range
    #[serde(default)]
    pub start_address: Option<String>,
    /// Last address of the registered range
    #[serde(default)]
    pub end_address: Option<String>,
}

/// Build the RDAP query URL for an address
pub fn rdap_url(base_url: &str, ip: &IpAddr) -> String {
    format!("{}/ip/{ip}", base_url.trim_end_matches('/'))
}

/// Parse an RDAP JSON body into the network fields
pub fn parse_network(body: &str) -> Result<RdapNetwork, ResolveError> {
    serde_json::from_str(body).map_err(|e| ResolveError::RdapError(e.to_string()))
}

/// Build the HTTP client used for RDAP queries
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ResolveError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ResolveError::HttpError(e.to_string()))
}

/// Query the registry for the network containing `ip`
pub async fn lookup_network(
    client: &reqwest::Client,
    base_url: &str,
    ip: IpAddr,
) -> Result<RdapNetwork, ResolveError> {
    let url = rdap_url(base_url, &ip);
    tracing::trace!("RDAP query {url}");

    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/rdap+json, application/json")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ResolveError::RdapError(format!("request to {url} timed out"))
            } else {
                ResolveError::HttpError(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ResolveError::RdapError(format!("HTTP {status} from {url}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ResolveError::HttpError(e.to_string()))?;

    parse_network(&body)
}
