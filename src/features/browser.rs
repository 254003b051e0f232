//! Browser launching through the platform URL opener.

use std::process::Command;
use tracing::{debug, warn};

use crate::features::encode_component;
use crate::platform::{command_exists, PlatformProfile};

pub trait Browser {
    /// Resolve the opener command without opening anything.
    fn probe(&self) -> bool;
    fn open_url(&self, url: &str);
    fn search_video(&self, query: &str);
    fn search_web(&self, query: &str);
}

pub struct SystemBrowser {
    profile: PlatformProfile,
}

impl SystemBrowser {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    fn opener(&self) -> &'static str {
        match self.profile {
            PlatformProfile::Windows => "cmd",
            PlatformProfile::MacOs => "open",
            PlatformProfile::Linux | PlatformProfile::Other => "xdg-open",
        }
    }

    fn launch(&self, url: &str) {
        let url = if url.contains("://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };

        let result = match self.profile {
            PlatformProfile::Windows => Command::new("cmd")
                .args(["/C", "start", ""])
                .arg(&url)
                .status(),
            PlatformProfile::MacOs => Command::new("open").arg(&url).status(),
            PlatformProfile::Linux | PlatformProfile::Other => {
                Command::new("xdg-open").arg(&url).status()
            }
        };

        match result {
            Ok(status) if status.success() => debug!("Opened {url}"),
            Ok(status) => warn!("Opener exited with {status} for {url}"),
            Err(e) => warn!("Failed to open {url}: {e}"),
        }
    }
}

impl Browser for SystemBrowser {
    fn probe(&self) -> bool {
        command_exists(self.opener())
    }

    fn open_url(&self, url: &str) {
        self.launch(url);
    }

    fn search_video(&self, query: &str) {
        self.launch(&format!(
            "https://www.youtube.com/results?search_query={}",
            encode_component(query)
        ));
    }

    fn search_web(&self, query: &str) {
        self.launch(&format!(
            "https://www.google.com/search?q={}",
            encode_component(query)
        ));
    }
}
