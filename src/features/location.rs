//! IP-based location lookup (ipify + geojs).

use reqwest::blocking::Client;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Location {
    pub city: String,
    pub region: String,
    pub country: String,
}

pub trait LocationProvider {
    fn current_location(&self) -> Result<Location, String>;
}

pub struct IpGeoLocation {
    client: Client,
}

impl IpGeoLocation {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl LocationProvider for IpGeoLocation {
    fn current_location(&self) -> Result<Location, String> {
        let ip = self
            .client
            .get("https://api.ipify.org")
            .send()
            .and_then(|r| r.text())
            .map_err(|e| format!("cannot resolve public IP: {e}"))?;

        let url = format!("https://get.geojs.io/v1/ip/geo/{}.json", ip.trim());
        let data: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.json())
            .map_err(|e| {
                warn!("Geolocation request failed: {e}");
                format!("cannot resolve location: {e}")
            })?;

        let field = |name: &str| {
            data[name]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown")
                .to_string()
        };

        Ok(Location {
            city: field("city"),
            region: field("region"),
            country: field("country"),
        })
    }
}
