//! Weather lookups via OpenWeatherMap.
//!
//! Every failure mode collapses into a human-readable string; the dispatcher
//! never sees an error from this path.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::warn;

use crate::features::encode_component;

pub trait WeatherProvider {
    /// Resolve the backing credential without calling the service.
    fn probe(&self) -> bool;
    fn get_weather(&self, city: &str) -> String;
}

pub struct OpenWeather {
    api_key: Option<String>,
    client: Client,
}

impl OpenWeather {
    pub fn new(api_key: Option<String>, client: Client) -> Self {
        Self { api_key, client }
    }
}

impl WeatherProvider for OpenWeather {
    fn probe(&self) -> bool {
        self.api_key.is_some()
    }

    fn get_weather(&self, city: &str) -> String {
        let Some(key) = &self.api_key else {
            return "Weather functionality is not available (missing API key)".to_string();
        };

        let url = format!(
            "http://api.openweathermap.org/data/2.5/weather?q={}&appid={key}&units=metric",
            encode_component(city)
        );

        let response = match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
        {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                return "Couldn't connect to the weather service. Check your internet connection."
                    .to_string()
            }
            Err(e) if e.is_timeout() => {
                return "The weather service request timed out. Please try again later."
                    .to_string()
            }
            Err(e) => {
                warn!("Weather request failed: {e}");
                return "Sorry, I couldn't fetch the weather information".to_string();
            }
        };

        match response.status() {
            StatusCode::UNAUTHORIZED => return "The weather API key is invalid".to_string(),
            StatusCode::NOT_FOUND => return format!("City '{city}' not found"),
            status if !status.is_success() => {
                return format!("The weather service is unavailable (error {status})")
            }
            _ => {}
        }

        let data: serde_json::Value = match response.json() {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to parse weather response: {e}");
                return "Sorry, I couldn't fetch the weather information".to_string();
            }
        };

        let temp = data["main"]["temp"].as_f64();
        let desc = data["weather"][0]["description"].as_str();
        match (temp, desc) {
            (Some(temp), Some(desc)) => {
                format!("The temperature in {city} is {temp:.0} degrees Celsius with {desc}")
            }
            _ => "Sorry, I couldn't fetch the weather information".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_message_not_an_error() {
        let provider = OpenWeather::new(None, Client::new());
        assert!(!provider.probe());
        let report = provider.get_weather("London");
        assert!(report.contains("missing API key"));
    }

    #[test]
    fn configured_key_passes_probe() {
        let provider = OpenWeather::new(Some("k".into()), Client::new());
        assert!(provider.probe());
    }
}
