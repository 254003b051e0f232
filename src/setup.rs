//! Interactive first-run configuration wizard.
//!
//! The only flow that mutates configuration: prompts for the basics, shows
//! the discovered voices, and writes config.yaml under the user config
//! directory (or an explicit `--config` path).

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AppError;
use crate::platform::PlatformInventory;

pub fn run_wizard(
    config_path: Option<&Path>,
    inventory: &mut PlatformInventory,
) -> Result<(), AppError> {
    let target = match config_path {
        Some(path) => path.to_path_buf(),
        None => dirs::home_dir()
            .map(|h| h.join(".config/friday/config.yaml"))
            .ok_or_else(|| AppError::Config("cannot determine home directory".into()))?,
    };

    println!("============================================");
    println!("    friday-rs setup");
    println!("============================================");

    let mut config = if target.exists() {
        println!("Existing configuration found at {}", target.display());
        Config::load(Some(&target))
    } else {
        Config::default()
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    config.assistant.name = prompt(&mut input, "Assistant name", &config.assistant.name)?;
    config.assistant.wake_word = prompt(&mut input, "Wake word", &config.assistant.wake_word)?;
    config.assistant.language = prompt(&mut input, "Language", &config.assistant.language)?;

    println!(
        "Indexed {} application(s) for app commands.",
        inventory.list_applications().len()
    );

    let voices = inventory.discover_voices().to_vec();
    println!("Available voices:");
    for (i, voice) in voices.iter().take(10).enumerate() {
        println!("  {}. {voice}", i + 1);
    }
    let default_voice = config
        .speech
        .voice
        .clone()
        .or_else(|| voices.first().cloned())
        .unwrap_or_default();
    let voice = prompt(&mut input, "Voice", &default_voice)?;
    config.speech.voice = if voice.is_empty() { None } else { Some(voice) };

    let transcriber = prompt(
        &mut input,
        "Transcriber command (stdout = recognized text)",
        config.speech.transcriber_cmd.as_deref().unwrap_or(""),
    )?;
    config.speech.transcriber_cmd = if transcriber.is_empty() {
        None
    } else {
        Some(transcriber)
    };

    let weather_key = prompt(
        &mut input,
        "OpenWeatherMap API key",
        config.weather.api_key.as_deref().unwrap_or(""),
    )?;
    config.weather.api_key = if weather_key.is_empty() {
        None
    } else {
        Some(weather_key)
    };
    config.weather.default_city =
        prompt(&mut input, "Default weather city", &config.weather.default_city)?;

    let news_key = prompt(
        &mut input,
        "NewsAPI key",
        config.news.api_key.as_deref().unwrap_or(""),
    )?;
    config.news.api_key = if news_key.is_empty() { None } else { Some(news_key) };

    let dir = prompt(
        &mut input,
        "Screenshot directory",
        &config.screenshot.dir.display().to_string(),
    )?;
    config.screenshot.dir = PathBuf::from(dir);

    config.save(&target)?;
    println!("Configuration saved to {}", target.display());
    Ok(())
}

/// Read one answer; an empty line keeps the default.
fn prompt(input: &mut impl BufRead, label: &str, default: &str) -> Result<String, AppError> {
    if default.is_empty() {
        print!("{label}: ");
    } else {
        print!("{label} [{default}]: ");
    }
    std::io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_keeps_default_on_empty_answer() {
        let mut input = std::io::Cursor::new(b"\n".to_vec());
        let answer = prompt(&mut input, "Name", "Friday").unwrap();
        assert_eq!(answer, "Friday");
    }

    #[test]
    fn prompt_takes_typed_answer() {
        let mut input = std::io::Cursor::new(b"Jarvis\n".to_vec());
        let answer = prompt(&mut input, "Name", "Friday").unwrap();
        assert_eq!(answer, "Jarvis");
    }
}
