//! Configuration management for friday-rs.
//!
//! Loads config from YAML files in standard locations, then applies
//! environment-variable overrides for the API credentials.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSection {
    pub name: String,
    pub wake_word: String,
    pub language: String,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            name: "Friday".into(),
            wake_word: "friday".into(),
            language: "en-US".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Voice identifier override. Discovered from the platform when unset.
    pub voice: Option<String>,
    /// External transcriber command whose stdout is the recognized text.
    pub transcriber_cmd: Option<String>,
    pub sample_rate: u32,
    /// Seconds to wait for a command before giving up on a listen.
    pub listen_timeout: f64,
    /// Maximum seconds of a single spoken phrase.
    pub phrase_limit: f64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: None,
            transcriber_cmd: None,
            sample_rate: 16000,
            listen_timeout: 5.0,
            phrase_limit: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub default_city: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            // No location extraction from commands; every weather request
            // resolves to this city.
            default_city: "London".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub enabled: bool,
    pub model: String,
    pub host: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "llama3.2:3b".into(),
            host: "http://localhost:11434".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub dir: PathBuf,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Screenshots"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory recursion limit for the application scan.
    pub max_depth: usize,
    /// Soft deadline for the whole scan, in seconds.
    pub time_budget: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            time_budget: 60.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assistant: AssistantSection,
    pub speech: SpeechConfig,
    pub weather: WeatherConfig,
    pub news: NewsConfig,
    pub responder: ResponderConfig,
    pub screenshot: ScreenshotConfig,
    pub scan: ScanConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/friday/config.yaml
    /// 3. /etc/friday/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/friday/config.yaml")),
                Some(PathBuf::from("/etc/friday/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let config = match resolved {
            Some(config_path) => match std::fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", config_path.display());
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to parse {}: {e}, using defaults",
                            config_path.display()
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "Failed to read {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Apply API-key overrides from the environment.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("WEATHER_API_KEY") {
            if !key.is_empty() {
                self.weather.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            if !key.is_empty() {
                self.news.api_key = Some(key);
            }
        }
        self
    }

    /// Write the configuration as YAML. Used only by the setup wizard.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yml::to_string(self)
            .map_err(|e| AppError::Config(format!("cannot serialize config: {e}")))?;
        std::fs::write(path, yaml)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.assistant.name, "Friday");
        assert_eq!(config.weather.default_city, "London");
        assert_eq!(config.scan.max_depth, 3);
        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn partial_yaml_keeps_section_defaults() {
        let yaml = "assistant:\n  name: Jarvis\nweather:\n  default_city: Paris\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.assistant.name, "Jarvis");
        // unset keys inside a present section still default
        assert_eq!(config.assistant.wake_word, "friday");
        assert_eq!(config.weather.default_city, "Paris");
        assert_eq!(config.speech.listen_timeout, 5.0);
    }

    #[test]
    fn env_overrides_api_keys() {
        std::env::set_var("WEATHER_API_KEY", "w-key");
        std::env::set_var("NEWS_API_KEY", "n-key");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.weather.api_key.as_deref(), Some("w-key"));
        assert_eq!(config.news.api_key.as_deref(), Some("n-key"));
        std::env::remove_var("WEATHER_API_KEY");
        std::env::remove_var("NEWS_API_KEY");
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.assistant.name = "Echo".into();
        config.save(&path).unwrap();
        let loaded: Config =
            serde_yml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.assistant.name, "Echo");
    }
}
