//! System power control and application lifecycle.
//!
//! All operations are fire-and-forget: failures are logged, never returned.
//! Shutdown is the one destructive path and only runs when the caller has
//! already collected an explicit confirmation.

use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::platform::PlatformProfile;

pub const CONFIRM_PROMPT: &str = "Please confirm by saying 'confirm shutdown'";

pub trait PowerControl {
    /// Without confirmation this only returns the confirmation prompt; with
    /// it, the delayed OS shutdown is issued.
    fn request_shutdown(&self, confirmed: bool) -> String;
    fn cancel_shutdown(&self) -> String;
    fn restart(&self);
    fn sleep(&self);
    fn open_application(&self, path: &Path);
    fn close_application(&self, name: &str);
}

pub struct SystemPower {
    profile: PlatformProfile,
}

impl SystemPower {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    fn run(&self, program: &str, args: &[&str]) {
        match Command::new(program).args(args).status() {
            Ok(status) if status.success() => debug!("{program} {args:?} completed"),
            Ok(status) => warn!("{program} exited with {status}"),
            Err(e) => warn!("Failed to run {program}: {e}"),
        }
    }
}

impl PowerControl for SystemPower {
    fn request_shutdown(&self, confirmed: bool) -> String {
        if !confirmed {
            return CONFIRM_PROMPT.to_string();
        }

        match self.profile {
            PlatformProfile::Windows => self.run("shutdown", &["/s", "/t", "60"]),
            _ => self.run("shutdown", &["-h", "+1"]),
        }
        "Shutting down in one minute. To cancel, say 'cancel shutdown'".to_string()
    }

    fn cancel_shutdown(&self) -> String {
        match self.profile {
            PlatformProfile::Windows => self.run("shutdown", &["/a"]),
            _ => self.run("shutdown", &["-c"]),
        }
        "Shutdown canceled".to_string()
    }

    fn restart(&self) {
        match self.profile {
            PlatformProfile::Windows => self.run("shutdown", &["/r", "/t", "5"]),
            _ => self.run("shutdown", &["-r", "now"]),
        }
    }

    fn sleep(&self) {
        match self.profile {
            PlatformProfile::Windows => {
                self.run("rundll32.exe", &["powrprof.dll,SetSuspendState", "0,1,0"])
            }
            PlatformProfile::MacOs => self.run("pmset", &["sleepnow"]),
            PlatformProfile::Linux | PlatformProfile::Other => {
                self.run("systemctl", &["suspend"])
            }
        }
    }

    fn open_application(&self, path: &Path) {
        let Some(path_str) = path.to_str() else {
            warn!("Application path is not valid UTF-8: {}", path.display());
            return;
        };
        match self.profile {
            PlatformProfile::Windows => self.run("cmd", &["/C", "start", "", path_str]),
            PlatformProfile::MacOs => self.run("open", &[path_str]),
            PlatformProfile::Linux | PlatformProfile::Other => self.run("xdg-open", &[path_str]),
        }
    }

    fn close_application(&self, name: &str) {
        match self.profile {
            PlatformProfile::Windows => self.run("taskkill", &["/f", "/im", name]),
            _ => self.run("pkill", &[name]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfirmed_shutdown_only_prompts() {
        let power = SystemPower::new(PlatformProfile::Linux);
        let message = power.request_shutdown(false);
        assert_eq!(message, CONFIRM_PROMPT);
    }
}
