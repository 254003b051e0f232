//! Speech input/output.
//!
//! `SystemSpeech` speaks through the platform TTS command and listens by
//! running the configured external transcriber under the listen timeout.
//! `ConsoleSpeech` (`--text`) swaps in stdin/stdout behind the same
//! interface. The recognition engine itself stays an external collaborator.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::platform::{command_exists, PlatformProfile};

pub trait SpeechIo {
    /// Resolve the backing speech dependencies without speaking or listening.
    fn probe(&self) -> bool;

    /// Check that voice input is usable before entering the run loop.
    fn verify_microphone(&self) -> bool;

    fn speak(&self, text: &str);

    /// Wait for one command. Yields `None` once the timeout and phrase
    /// limit elapse rather than hanging indefinitely.
    fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Option<String>;

    /// Whether the input source is permanently exhausted (stdin closed).
    fn closed(&self) -> bool {
        false
    }
}

/// Text-mode speech: reads commands from stdin, prints responses.
pub struct ConsoleSpeech {
    name: String,
    lines: Receiver<String>,
    exhausted: std::cell::Cell<bool>,
}

impl ConsoleSpeech {
    pub fn new(name: &str) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut stdin = std::io::stdin().lock();
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::BufRead::read_line(&mut stdin, &mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.trim().to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            name: name.to_string(),
            lines: rx,
            exhausted: std::cell::Cell::new(false),
        }
    }
}

impl SpeechIo for ConsoleSpeech {
    fn probe(&self) -> bool {
        true
    }

    fn verify_microphone(&self) -> bool {
        true
    }

    fn speak(&self, text: &str) {
        println!("{}: {text}", self.name);
    }

    fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Option<String> {
        print!("You: ");
        let _ = std::io::stdout().flush();

        match self.lines.recv_timeout(timeout + phrase_limit) {
            Ok(line) if !line.is_empty() => Some(line),
            Ok(_) => None,
            Err(RecvTimeoutError::Timeout) => {
                debug!("No input within {timeout:?}");
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.exhausted.set(true);
                None
            }
        }
    }

    fn closed(&self) -> bool {
        self.exhausted.get()
    }
}

/// Voice-mode speech: platform TTS out, external transcriber in.
pub struct SystemSpeech {
    profile: PlatformProfile,
    name: String,
    voice: String,
    transcriber: Option<String>,
}

impl SystemSpeech {
    pub fn new(
        profile: PlatformProfile,
        name: &str,
        voice: String,
        transcriber: Option<String>,
    ) -> Self {
        Self {
            profile,
            name: name.to_string(),
            voice,
            transcriber,
        }
    }

    fn tts_program(&self) -> &'static str {
        match self.profile {
            PlatformProfile::Windows => "powershell",
            PlatformProfile::MacOs => "say",
            PlatformProfile::Linux | PlatformProfile::Other => "espeak",
        }
    }

    fn transcriber_program(&self) -> Option<&str> {
        self.transcriber
            .as_deref()
            .and_then(|cmd| cmd.split_whitespace().next())
    }

    fn run_tts(&self, text: &str) -> std::io::Result<std::process::ExitStatus> {
        match self.profile {
            PlatformProfile::Windows => {
                let escaped = text.replace('\'', "''");
                let script = format!(
                    "Add-Type -AssemblyName System.Speech; \
                     (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{escaped}')"
                );
                Command::new("powershell")
                    .args(["-NoProfile", "-Command"])
                    .arg(&script)
                    .status()
            }
            PlatformProfile::MacOs => {
                // catalog entries are reverse-DNS ids; say wants the short name
                let short = self.voice.rsplit('.').next().unwrap_or(&self.voice);
                if short.is_empty() {
                    Command::new("say").arg(text).status()
                } else {
                    Command::new("say").args(["-v", short, text]).status()
                }
            }
            PlatformProfile::Linux | PlatformProfile::Other => {
                if self.voice.is_empty() {
                    Command::new("espeak").arg(text).status()
                } else {
                    Command::new("espeak")
                        .arg("-v")
                        .arg(&self.voice)
                        .arg(text)
                        .status()
                }
            }
        }
    }
}

impl SpeechIo for SystemSpeech {
    fn probe(&self) -> bool {
        let tts_ok = command_exists(self.tts_program());
        if !tts_ok {
            warn!("TTS command '{}' not found", self.tts_program());
        }
        let input_ok = match self.transcriber_program() {
            Some(program) => command_exists(program),
            None => false,
        };
        if !input_ok {
            warn!("No usable transcriber command configured (speech.transcriber_cmd)");
        }
        tts_ok && input_ok
    }

    fn verify_microphone(&self) -> bool {
        match self.transcriber_program() {
            Some(program) if command_exists(program) => true,
            Some(program) => {
                warn!("Transcriber '{program}' not found on PATH");
                false
            }
            None => false,
        }
    }

    fn speak(&self, text: &str) {
        println!("{}: {text}", self.name);
        match self.run_tts(text) {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("TTS exited with {status}"),
            Err(e) => warn!("TTS failed: {e}"),
        }
    }

    fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Option<String> {
        let command = self.transcriber.as_deref()?;
        let mut parts = command.split_whitespace();
        let program = parts.next()?;

        let mut child = match Command::new(program)
            .args(parts)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start transcriber: {e}");
                return None;
            }
        };

        let deadline = Instant::now() + timeout + phrase_limit;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        warn!("Transcriber exited with {status}");
                        return None;
                    }
                    let mut text = String::new();
                    if let Some(mut stdout) = child.stdout.take() {
                        if let Err(e) = stdout.read_to_string(&mut text) {
                            warn!("Failed to read transcript: {e}");
                            return None;
                        }
                    }
                    let text = text.trim().to_lowercase();
                    if text.is_empty() {
                        return None;
                    }
                    info!("Heard: {text}");
                    return Some(text);
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        debug!("No command within {:?}", timeout + phrase_limit);
                        let _ = child.kill();
                        let _ = child.wait();
                        return None;
                    }
                    thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    warn!("Transcriber wait failed: {e}");
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_speech_without_transcriber_fails_probe() {
        let speech = SystemSpeech::new(PlatformProfile::Linux, "Friday", String::new(), None);
        assert!(!speech.probe());
        assert!(!speech.verify_microphone());
    }

    #[test]
    fn transcriber_listen_returns_lowercased_stdout() {
        let speech = SystemSpeech::new(
            PlatformProfile::Linux,
            "Friday",
            String::new(),
            Some("echo Open YouTube".into()),
        );
        let heard = speech.listen(Duration::from_secs(2), Duration::from_secs(2));
        assert_eq!(heard.as_deref(), Some("open youtube"));
    }

    #[test]
    fn transcriber_listen_times_out() {
        let speech = SystemSpeech::new(
            PlatformProfile::Linux,
            "Friday",
            String::new(),
            Some("sleep 30".into()),
        );
        let started = Instant::now();
        let heard = speech.listen(Duration::from_millis(200), Duration::from_millis(200));
        assert!(heard.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
