//! Screen capture through the platform screenshot tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use tracing::debug;

use crate::platform::{command_exists, PlatformProfile};

const LINUX_CAPTURE_TOOLS: [&str; 3] = ["gnome-screenshot", "scrot", "import"];

pub trait ScreenshotProvider {
    /// Resolve the capture tool without taking a screenshot.
    fn probe(&self) -> bool;
    /// Capture the screen; returns the saved file path.
    fn capture(&self, name: Option<&str>) -> Result<PathBuf, String>;
}

pub struct SystemScreenshot {
    profile: PlatformProfile,
    dir: PathBuf,
}

impl SystemScreenshot {
    pub fn new(profile: PlatformProfile, dir: PathBuf) -> Self {
        Self { profile, dir }
    }

    fn linux_tool() -> Option<&'static str> {
        LINUX_CAPTURE_TOOLS
            .iter()
            .copied()
            .find(|tool| command_exists(tool))
    }

    fn run_capture(&self, path: &Path) -> Result<(), String> {
        let status = match self.profile {
            PlatformProfile::Windows => {
                let script = format!(
                    "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
                     $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
                     $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
                     $g = [System.Drawing.Graphics]::FromImage($bmp); \
                     $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
                     $bmp.Save('{}')",
                    path.display()
                );
                Command::new("powershell")
                    .args(["-NoProfile", "-Command"])
                    .arg(&script)
                    .status()
            }
            PlatformProfile::MacOs => Command::new("screencapture")
                .arg("-x")
                .arg(path)
                .status(),
            PlatformProfile::Linux | PlatformProfile::Other => {
                let Some(tool) = Self::linux_tool() else {
                    return Err("no screenshot tool found".to_string());
                };
                match tool {
                    "gnome-screenshot" => Command::new(tool).arg("-f").arg(path).status(),
                    "import" => Command::new(tool)
                        .args(["-window", "root"])
                        .arg(path)
                        .status(),
                    _ => Command::new(tool).arg(path).status(),
                }
            }
        };

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(format!("capture tool exited with {status}")),
            Err(e) => Err(format!("cannot run capture tool: {e}")),
        }
    }
}

impl ScreenshotProvider for SystemScreenshot {
    fn probe(&self) -> bool {
        match self.profile {
            PlatformProfile::Windows => command_exists("powershell"),
            PlatformProfile::MacOs => command_exists("screencapture"),
            PlatformProfile::Linux | PlatformProfile::Other => Self::linux_tool().is_some(),
        }
    }

    fn capture(&self, name: Option<&str>) -> Result<PathBuf, String> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("cannot create {}: {e}", self.dir.display()))?;

        let name = match name {
            Some(name) => name.to_string(),
            None => Local::now().format("%Y%m%d_%H%M%S").to_string(),
        };
        let path = self.dir.join(format!("{name}.png"));

        self.run_capture(&path)?;
        debug!("Screenshot saved to {}", path.display());
        Ok(path)
    }
}
