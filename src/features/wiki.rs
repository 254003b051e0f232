//! Encyclopedia summaries via the Wikipedia REST API.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::warn;

use crate::features::encode_component;

pub trait WikiProvider {
    /// Resolve the HTTP stack without calling the service.
    fn probe(&self) -> bool;
    fn summarize(&self, query: &str, sentences: usize) -> String;
}

pub struct WikipediaSummary {
    client: Client,
}

impl WikipediaSummary {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl WikiProvider for WikipediaSummary {
    fn probe(&self) -> bool {
        Client::builder().build().is_ok()
    }

    fn summarize(&self, query: &str, sentences: usize) -> String {
        let title = encode_component(&query.replace(' ', "_"));
        let url = format!("https://en.wikipedia.org/api/rest_v1/page/summary/{title}");

        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!("Wikipedia request failed: {e}");
                return format!("Error searching Wikipedia: {e}");
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            return format!("I couldn't find anything on Wikipedia about '{query}'");
        }
        if !response.status().is_success() {
            return format!("Error searching Wikipedia: status {}", response.status());
        }

        let data: serde_json::Value = match response.json() {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to parse Wikipedia response: {e}");
                return format!("Error searching Wikipedia: {e}");
            }
        };

        match data["extract"].as_str() {
            Some(extract) if !extract.is_empty() => first_sentences(extract, sentences),
            _ => format!("I couldn't find anything on Wikipedia about '{query}'"),
        }
    }
}

/// Truncate a summary to the first `count` sentences.
fn first_sentences(text: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    let mut remaining = count;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            remaining -= 1;
            if remaining == 0 {
                return text[..i + c.len_utf8()].trim().to_string();
            }
        }
    }
    text.trim().to_string()
}
