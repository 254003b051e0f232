//! Top headlines via NewsAPI.

use reqwest::blocking::Client;
use tracing::warn;

const MAX_HEADLINES: usize = 5;

pub trait NewsProvider {
    /// Resolve the backing credential without calling the service.
    fn probe(&self) -> bool;
    /// Up to five headline titles; failures collapse to one apology line.
    fn headlines(&self) -> Vec<String>;
}

pub struct NewsApi {
    api_key: Option<String>,
    client: Client,
}

impl NewsApi {
    pub fn new(api_key: Option<String>, client: Client) -> Self {
        Self { api_key, client }
    }
}

impl NewsProvider for NewsApi {
    fn probe(&self) -> bool {
        self.api_key.is_some()
    }

    fn headlines(&self) -> Vec<String> {
        let fallback = || vec!["Sorry, I couldn't fetch the news".to_string()];

        let Some(key) = &self.api_key else {
            return fallback();
        };

        let url = format!(
            "https://newsapi.org/v2/top-headlines?sources=techcrunch&apiKey={key}"
        );
        let response = match self.client.get(&url).send() {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("News service returned status {}", response.status());
                return fallback();
            }
            Err(e) => {
                warn!("News request failed: {e}");
                return fallback();
            }
        };

        let data: serde_json::Value = match response.json() {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to parse news response: {e}");
                return fallback();
            }
        };

        let titles: Vec<String> = data["articles"]
            .as_array()
            .map(|articles| {
                articles
                    .iter()
                    .filter_map(|article| article["title"].as_str())
                    .take(MAX_HEADLINES)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if titles.is_empty() {
            fallback()
        } else {
            titles
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_yields_apology_list() {
        let provider = NewsApi::new(None, Client::new());
        assert!(!provider.probe());
        let headlines = provider.headlines();
        assert_eq!(headlines.len(), 1);
        assert!(headlines[0].contains("couldn't fetch"));
    }
}
