//! Platform discovery: installed applications and synthesized voices.
//!
//! Walks per-OS application roots with a depth limit and a cooperative time
//! budget, and shells out to the platform voice lister. Results are cached
//! for the process lifetime; a restart picks up newly installed software.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ScanConfig;

const WINDOWS_VOICE_ROOT: &str = r"HKLM\SOFTWARE\Microsoft\Speech\Voices\Tokens";
const WINDOWS_FALLBACK_VOICE: &str =
    r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Speech\Voices\Tokens\TTS_MS_EN-US_ZIRA_11.0";
const MAC_FALLBACK_VOICE: &str = "com.apple.speech.synthesis.voice.samantha";
const LINUX_FALLBACK_VOICE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformProfile {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl PlatformProfile {
    /// Detect the running OS family. Immutable after process start.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows"),
            Self::MacOs => write!(f, "macOS"),
            Self::Linux => write!(f, "Linux"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Fixed application roots per OS family.
fn default_roots(profile: PlatformProfile) -> Vec<PathBuf> {
    let home = dirs::home_dir();
    match profile {
        PlatformProfile::Windows => {
            let mut roots = vec![
                PathBuf::from("C:/Program Files"),
                PathBuf::from("C:/Program Files (x86)"),
            ];
            if let Some(home) = &home {
                roots.push(home.join("AppData/Local"));
                roots.push(home.join("AppData/Local/Programs"));
            }
            roots.push(PathBuf::from("C:/Windows/System32"));
            roots
        }
        PlatformProfile::MacOs => {
            let mut roots = vec![PathBuf::from("/Applications")];
            if let Some(home) = &home {
                roots.push(home.join("Applications"));
            }
            roots.push(PathBuf::from("/System/Applications"));
            roots
        }
        PlatformProfile::Linux | PlatformProfile::Other => {
            let mut roots = vec![
                PathBuf::from("/usr/bin"),
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/opt"),
            ];
            if let Some(home) = &home {
                roots.push(home.join(".local/bin"));
            }
            roots
        }
    }
}

/// Check whether a command resolves on PATH (or is an existing absolute path).
pub fn command_exists(name: &str) -> bool {
    let direct = Path::new(name);
    if direct.is_absolute() {
        return direct.exists();
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(name);
        candidate.is_file() || candidate.with_extension("exe").is_file()
    })
}

/// Discovers installed applications and synthesized voices for the current
/// OS. Owns the application index exclusively; both caches are built lazily
/// and kept for the process lifetime.
pub struct PlatformInventory {
    profile: PlatformProfile,
    roots: Vec<PathBuf>,
    max_depth: usize,
    time_budget: Duration,
    apps: Option<HashMap<String, PathBuf>>,
    voices: Option<Vec<String>>,
    scans: u64,
}

impl PlatformInventory {
    pub fn new(profile: PlatformProfile, scan: &ScanConfig) -> Self {
        Self::with_roots(
            profile,
            default_roots(profile),
            scan.max_depth,
            Duration::from_secs_f64(scan.time_budget),
        )
    }

    /// Construct with explicit roots. The scan only ever visits these.
    pub fn with_roots(
        profile: PlatformProfile,
        roots: Vec<PathBuf>,
        max_depth: usize,
        time_budget: Duration,
    ) -> Self {
        Self {
            profile,
            roots,
            max_depth,
            time_budget,
            apps: None,
            voices: None,
            scans: 0,
        }
    }

    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    /// Number of full application scans performed so far.
    pub fn scans_performed(&self) -> u64 {
        self.scans
    }

    /// Build (or return the cached) application index.
    pub fn discover_applications(&mut self) -> &HashMap<String, PathBuf> {
        if self.apps.is_none() {
            let index = self.scan();
            self.apps = Some(index);
        }
        self.apps.get_or_insert_with(HashMap::new)
    }

    /// Case-insensitive lookup; builds the index on first use.
    pub fn find_application(&mut self, name: &str) -> Option<PathBuf> {
        let key = name.to_lowercase();
        if let Some(path) = self.apps.as_ref().and_then(|apps| apps.get(&key)) {
            return Some(path.clone());
        }
        self.discover_applications().get(&key).cloned()
    }

    /// Sorted names of every indexed application.
    pub fn list_applications(&mut self) -> Vec<String> {
        let mut names: Vec<String> = self.discover_applications().keys().cloned().collect();
        names.sort();
        names
    }

    fn scan(&mut self) -> HashMap<String, PathBuf> {
        let started = Instant::now();
        let deadline = started + self.time_budget;
        let mut index = HashMap::new();

        for root in &self.roots {
            if Instant::now() >= deadline {
                warn!(
                    "Application scan stopped after {:.1?}; partial index kept",
                    started.elapsed()
                );
                break;
            }
            scan_directory(self.profile, root, &mut index, 0, self.max_depth, deadline);
        }

        self.scans += 1;
        info!(
            "Discovered {} application(s) in {:.1?}",
            index.len(),
            started.elapsed()
        );
        index
    }

    /// Enumerate platform voices; first entry is the default. Enumeration
    /// failures degrade to a one-element fallback catalog, never an error.
    pub fn discover_voices(&mut self) -> &[String] {
        if self.voices.is_none() {
            let catalog = match self.profile {
                PlatformProfile::Windows => windows_voices(),
                PlatformProfile::MacOs => mac_voices(),
                PlatformProfile::Linux | PlatformProfile::Other => linux_voices(),
            };
            info!("Discovered {} voice(s)", catalog.len());
            self.voices = Some(catalog);
        }
        self.voices.get_or_insert_with(Vec::new)
    }

    pub fn default_voice(&mut self) -> String {
        self.discover_voices().first().cloned().unwrap_or_default()
    }
}

fn scan_directory(
    profile: PlatformProfile,
    dir: &Path,
    index: &mut HashMap<String, PathBuf>,
    depth: usize,
    max_depth: usize,
    deadline: Instant,
) {
    if depth > max_depth || Instant::now() >= deadline {
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            debug!("Permission denied: {}", dir.display());
            return;
        }
        Err(e) => {
            debug!("Cannot read {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            // .app bundles are directories; index them without descending
            if profile == PlatformProfile::MacOs
                && path.extension().is_some_and(|ext| ext == "app")
            {
                record(index, &path);
                continue;
            }
            if Instant::now() >= deadline {
                return;
            }
            scan_directory(profile, &path, index, depth + 1, max_depth, deadline);
        } else if file_type.is_file() && is_candidate(profile, &path) {
            record(index, &path);
        }
    }
}

/// First match wins on name collision.
fn record(index: &mut HashMap<String, PathBuf>, path: &Path) {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    index
        .entry(stem.to_lowercase())
        .or_insert_with(|| path.to_path_buf());
}

fn is_candidate(profile: PlatformProfile, path: &Path) -> bool {
    match profile {
        PlatformProfile::Windows => path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe")),
        // bundles are handled at the directory level
        PlatformProfile::MacOs => false,
        PlatformProfile::Linux | PlatformProfile::Other => is_executable(path),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension().is_none()
}

fn windows_voices() -> Vec<String> {
    let output = match Command::new("reg")
        .args(["query", WINDOWS_VOICE_ROOT])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            warn!("reg query exited with {}", output.status);
            return vec![WINDOWS_FALLBACK_VOICE.to_string()];
        }
        Err(e) => {
            warn!("Voice registry enumeration failed: {e}");
            return vec![WINDOWS_FALLBACK_VOICE.to_string()];
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let voices: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("HKEY_LOCAL_MACHINE"))
        .map(str::to_string)
        .collect();

    if voices.is_empty() {
        vec![WINDOWS_FALLBACK_VOICE.to_string()]
    } else {
        voices
    }
}

fn mac_voices() -> Vec<String> {
    let output = match Command::new("say").args(["-v", "?"]).output() {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            warn!("say -v ? exited with {}", output.status);
            return vec![MAC_FALLBACK_VOICE.to_string()];
        }
        Err(e) => {
            warn!("Voice listing failed: {e}");
            return vec![MAC_FALLBACK_VOICE.to_string()];
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let voices: Vec<String> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(|name| format!("com.apple.speech.synthesis.voice.{}", name.to_lowercase()))
        .collect();

    if voices.is_empty() {
        vec![MAC_FALLBACK_VOICE.to_string()]
    } else {
        voices
    }
}

fn linux_voices() -> Vec<String> {
    let output = match Command::new("espeak").arg("--voices").output() {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            warn!("espeak --voices exited with {}", output.status);
            return vec![LINUX_FALLBACK_VOICE.to_string()];
        }
        Err(e) => {
            warn!("Voice listing failed: {e}");
            return vec![LINUX_FALLBACK_VOICE.to_string()];
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let voices: Vec<String> = stdout
        .lines()
        .skip(1) // header row
        .filter_map(|line| line.split_whitespace().nth(3))
        .map(str::to_string)
        .collect();

    if voices.is_empty() {
        vec![LINUX_FALLBACK_VOICE.to_string()]
    } else {
        voices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    fn inventory_over(
        profile: PlatformProfile,
        roots: Vec<PathBuf>,
        max_depth: usize,
    ) -> PlatformInventory {
        PlatformInventory::with_roots(profile, roots, max_depth, Duration::from_secs(60))
    }

    #[test]
    fn windows_scan_indexes_exe_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Notepad.exe"), b"").unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let mut inventory =
            inventory_over(PlatformProfile::Windows, vec![dir.path().to_path_buf()], 3);
        let apps = inventory.discover_applications();
        assert_eq!(apps.len(), 1);
        assert!(apps.contains_key("notepad"));
    }

    #[cfg(unix)]
    #[test]
    fn linux_scan_requires_executable_bit() {
        let dir = tempfile::tempdir().unwrap();
        let exec = dir.path().join("gedit");
        let plain = dir.path().join("notes");
        fs::write(&exec, b"").unwrap();
        fs::write(&plain, b"").unwrap();
        make_executable(&exec);

        let mut inventory =
            inventory_over(PlatformProfile::Linux, vec![dir.path().to_path_buf()], 3);
        let apps = inventory.discover_applications();
        assert!(apps.contains_key("gedit"));
        assert!(!apps.contains_key("notes"));
    }

    #[test]
    fn mac_scan_indexes_bundles_without_descending() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("TextEdit.app");
        fs::create_dir_all(bundle.join("Contents/MacOS")).unwrap();
        fs::write(bundle.join("Contents/MacOS/Inner.exe"), b"").unwrap();

        let mut inventory =
            inventory_over(PlatformProfile::MacOs, vec![dir.path().to_path_buf()], 5);
        let apps = inventory.discover_applications();
        assert_eq!(apps.len(), 1);
        assert!(apps.contains_key("textedit"));
    }

    #[test]
    fn scan_respects_max_depth() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a/b/c/d");
        fs::create_dir_all(&deep).unwrap();
        fs::write(dir.path().join("shallow.exe"), b"").unwrap();
        fs::write(deep.join("deep.exe"), b"").unwrap();

        let mut inventory =
            inventory_over(PlatformProfile::Windows, vec![dir.path().to_path_buf()], 2);
        let apps = inventory.discover_applications();
        assert!(apps.contains_key("shallow"));
        assert!(!apps.contains_key("deep"));
    }

    #[test]
    fn first_match_wins_across_roots() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("app.exe"), b"").unwrap();
        fs::write(second.path().join("app.exe"), b"").unwrap();

        let mut inventory = inventory_over(
            PlatformProfile::Windows,
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            2,
        );
        let path = inventory.find_application("app").unwrap();
        assert!(path.starts_with(first.path()));
    }

    #[test]
    fn zero_budget_yields_subset_of_full_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.exe"), b"").unwrap();
        fs::write(dir.path().join("two.exe"), b"").unwrap();

        let mut starved = PlatformInventory::with_roots(
            PlatformProfile::Windows,
            vec![dir.path().to_path_buf()],
            3,
            Duration::ZERO,
        );
        let partial: Vec<String> = starved.list_applications();

        let mut full =
            inventory_over(PlatformProfile::Windows, vec![dir.path().to_path_buf()], 3);
        let complete = full.list_applications();

        for name in &partial {
            assert!(complete.contains(name));
        }
        assert_eq!(complete.len(), 2);
    }

    #[test]
    fn find_application_caches_for_process_lifetime() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Notepad.exe"), b"").unwrap();

        let mut inventory =
            inventory_over(PlatformProfile::Windows, vec![dir.path().to_path_buf()], 3);
        let first = inventory.find_application("NOTEPAD").unwrap();
        assert_eq!(inventory.scans_performed(), 1);

        // new file after the scan is invisible until restart
        fs::write(dir.path().join("Calc.exe"), b"").unwrap();
        let second = inventory.find_application("notepad").unwrap();
        assert_eq!(first, second);
        assert!(inventory.find_application("calc").is_none());
        assert_eq!(inventory.scans_performed(), 1);
    }

    #[test]
    fn missing_root_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.exe"), b"").unwrap();
        let mut inventory = inventory_over(
            PlatformProfile::Windows,
            vec![PathBuf::from("/definitely/not/here"), dir.path().to_path_buf()],
            3,
        );
        assert!(inventory.find_application("app").is_some());
    }

    #[test]
    fn default_voice_is_never_an_error() {
        // on hosts without espeak this exercises the fallback catalog
        let mut inventory = inventory_over(PlatformProfile::Other, vec![], 1);
        let catalog = inventory.discover_voices();
        assert!(!catalog.is_empty());
        assert!(!inventory.default_voice().is_empty());
    }
}
