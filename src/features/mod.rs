//! Feature providers behind narrow trait interfaces.
//!
//! Each provider is a thin delegation to an external tool or web API. The
//! dispatcher only ever talks to the traits; concrete implementations are
//! selected once at startup.

pub mod browser;
pub mod location;
pub mod news;
pub mod power;
pub mod screenshot;
pub mod social;
pub mod weather;
pub mod wiki;

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::Config;
use crate::platform::PlatformProfile;
use crate::responder::{OllamaClassifier, Responder, SentimentClassifier};
use crate::speech::{ConsoleSpeech, SpeechIo, SystemSpeech};

/// All collaborators the dispatcher talks to, threaded through explicit
/// construction instead of module-level globals.
pub struct Providers {
    pub speech: Box<dyn SpeechIo>,
    pub browser: Box<dyn browser::Browser>,
    pub weather: Box<dyn weather::WeatherProvider>,
    pub news: Box<dyn news::NewsProvider>,
    pub wiki: Box<dyn wiki::WikiProvider>,
    pub location: Box<dyn location::LocationProvider>,
    pub social: Box<dyn social::SocialProvider>,
    pub screenshot: Box<dyn screenshot::ScreenshotProvider>,
    pub power: Box<dyn power::PowerControl>,
    pub responder: Responder,
}

/// Build the production provider set.
pub fn build_providers(
    config: &Config,
    profile: PlatformProfile,
    voice: String,
    text_mode: bool,
) -> Providers {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client");

    let speech: Box<dyn SpeechIo> = if text_mode {
        Box::new(ConsoleSpeech::new(&config.assistant.name))
    } else {
        Box::new(SystemSpeech::new(
            profile,
            &config.assistant.name,
            voice,
            config.speech.transcriber_cmd.clone(),
        ))
    };

    let classifier = if config.responder.enabled {
        SentimentClassifier::Ollama(OllamaClassifier::new(&config.responder, client.clone()))
    } else {
        SentimentClassifier::Neutral
    };

    Providers {
        speech,
        browser: Box::new(browser::SystemBrowser::new(profile)),
        weather: Box::new(weather::OpenWeather::new(
            config.weather.api_key.clone(),
            client.clone(),
        )),
        news: Box::new(news::NewsApi::new(config.news.api_key.clone(), client.clone())),
        wiki: Box::new(wiki::WikipediaSummary::new(client.clone())),
        location: Box::new(location::IpGeoLocation::new(client)),
        social: Box::new(social::Instagram::new()),
        screenshot: Box::new(screenshot::SystemScreenshot::new(
            profile,
            config.screenshot.dir.clone(),
        )),
        power: Box::new(power::SystemPower::new(profile)),
        responder: Responder::new(classifier),
    }
}

/// Percent-encode a URL query component (RFC 3986 unreserved set kept).
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
