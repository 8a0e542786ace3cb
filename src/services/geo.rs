use crate::config::GeoConfig;
use crate::error::{AppError, AppResult};
use dashmap::DashMap;
use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Country resolver backed by ip-api.com with an in-memory cache.
///
/// Lookups only ever run inside the background click worker; a failure or
/// timeout degrades to `None` (stored as a NULL country) and never affects
/// the redirect that triggered the click.
#[derive(Clone)]
pub struct GeoResolver {
    client: reqwest::Client,
    /// IP string -> Option<country>. `None` means we already tried and the
    /// lookup failed or returned nothing, so we don't retry endlessly.
    cache: Arc<DashMap<String, Option<String>>>,
    enabled: bool,
}

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
}

impl GeoResolver {
    pub fn new(config: &GeoConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build geo client: {}", e)))?;

        Ok(Self {
            client,
            cache: Arc::new(DashMap::new()),
            enabled: config.enabled,
        })
    }

    /// Look up the country for `ip`.
    ///
    /// Returns `None` for private/loopback/link-local addresses, disabled
    /// lookups, and failed or empty API responses.
    pub async fn lookup(&self, ip: &str) -> Option<String> {
        if !self.enabled || is_private(ip) {
            return None;
        }

        // Covers both successful hits and known misses
        if let Some(entry) = self.cache.get(ip) {
            return entry.value().clone();
        }

        let result = self.fetch_country(ip).await;

        // Store regardless of outcome so repeated clicks from one IP never
        // trigger more than one network request.
        self.cache.insert(ip.to_owned(), result.clone());

        result
    }

    async fn fetch_country(&self, ip: &str) -> Option<String> {
        let url = format!("http://ip-api.com/json/{}?fields=status,country", ip);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| tracing::debug!("geo lookup network error for {}: {}", ip, e))
            .ok()?;

        let body: IpApiResponse = resp
            .json()
            .await
            .map_err(|e| tracing::debug!("geo lookup parse error for {}: {}", ip, e))
            .ok()?;

        if body.status != "success" {
            tracing::debug!("geo lookup returned non-success status for {}", ip);
            return None;
        }

        body.country.filter(|c| !c.is_empty())
    }
}

/// Return `true` for addresses that should never be sent to a public
/// geolocation API: loopback, link-local, private ranges, and IPv6 special
/// addresses.
fn is_private(ip_str: &str) -> bool {
    // Strip IPv6-mapped IPv4 prefix: "::ffff:1.2.3.4" -> "1.2.3.4"
    let ip_str = ip_str.strip_prefix("::ffff:").unwrap_or(ip_str);

    match IpAddr::from_str(ip_str) {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            addr.is_loopback()          // 127.x.x.x
            || addr.is_link_local()     // 169.254.x.x
            || addr.is_unspecified()    // 0.0.0.0
            || addr.is_broadcast()
            // 10.x.x.x
            || octets[0] == 10
            // 172.16.x.x - 172.31.x.x
            || (octets[0] == 172 && (16..=31).contains(&octets[1]))
            // 192.168.x.x
            || (octets[0] == 192 && octets[1] == 168)
        }
        Ok(IpAddr::V6(addr)) => {
            addr.is_loopback()       // ::1
            || addr.is_unspecified() // ::
            // fe80::/10  link-local
            || (addr.segments()[0] & 0xffc0) == 0xfe80
            // fc00::/7   unique-local
            || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
        Err(_) => true, // unparseable -> treat as private / skip
    }
}
