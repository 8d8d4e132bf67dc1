//! Locating a Chrome/Chromium executable.

use std::env;
use std::path::PathBuf;
use which::which;

pub const CHROME_ENV: &str = "THREADBOT_CHROME";
const SKIP_OS_PATHS_ENV: &str = "THREADBOT_SKIP_OS_PATHS";

/// Configured path first, then `THREADBOT_CHROME`, then PATH, then install locations.
pub fn resolve_chrome_path(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if !path.as_os_str().is_empty() && path.exists() {
            return Some(path.clone());
        }
    }
    detect_chrome_executable()
}

pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var(CHROME_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var(SKIP_OS_PATHS_ENV)
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(value) = env::var(key) {
                let root = PathBuf::from(value.trim());
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Chromium/Application/chrome.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn configured_path_wins_when_present() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("my-chrome");
        fs::write(&exe_path, b"").unwrap();
        assert_eq!(resolve_chrome_path(Some(&exe_path)), Some(exe_path));
    }

    #[test]
    fn detects_from_env_var() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("env-chrome");
        fs::write(&exe_path, b"").unwrap();
        let original = env::var(CHROME_ENV).ok();
        env::set_var(CHROME_ENV, exe_path.to_string_lossy().to_string());
        let detected = detect_chrome_executable();
        match original {
            Some(value) => env::set_var(CHROME_ENV, value),
            None => env::remove_var(CHROME_ENV),
        }
        assert_eq!(detected, Some(exe_path));
    }
}
