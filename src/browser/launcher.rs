use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::config::ProxyExtension;

/// Find the Chrome/Chromium binary on the current platform. With `beta` set,
/// only the Google Chrome Beta install locations are probed.
pub fn find_chrome_binary(beta: bool) -> Result<PathBuf> {
    let candidates = if beta {
        chrome_beta_candidates()
    } else {
        chrome_candidates()
    };

    for candidate in &candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            tracing::info!("Found Chrome at: {}", path.display());
            return Ok(path);
        }
    }

    if !beta {
        // Try PATH lookup
        for name in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium-browser",
            "chromium",
        ] {
            if let Ok(path) = which::which(name) {
                tracing::info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }
    }

    bail!(
        "Could not find {}. Searched:\n{}",
        if beta { "Google Chrome Beta" } else { "Chrome or Chromium" },
        candidates.join("\n")
    )
}

fn chrome_candidates() -> Vec<String> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "macos")]
    {
        candidates.extend([
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into(),
            "/Applications/Chromium.app/Contents/MacOS/Chromium".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(format!(
                "{}/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                home
            ));
        }
    }

    #[cfg(target_os = "linux")]
    {
        candidates.extend([
            "/usr/bin/google-chrome".into(),
            "/usr/bin/google-chrome-stable".into(),
            "/usr/bin/chromium-browser".into(),
            "/usr/bin/chromium".into(),
            "/snap/bin/chromium".into(),
        ]);
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(pf) = std::env::var("PROGRAMFILES") {
            candidates.push(format!("{}\\Google\\Chrome\\Application\\chrome.exe", pf));
        }
        if let Ok(pf86) = std::env::var("PROGRAMFILES(X86)") {
            candidates.push(format!("{}\\Google\\Chrome\\Application\\chrome.exe", pf86));
        }
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            candidates.push(format!("{}\\Google\\Chrome\\Application\\chrome.exe", local));
        }
    }

    candidates
}

fn chrome_beta_candidates() -> Vec<String> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "macos")]
    candidates.push(
        "/Applications/Google Chrome Beta.app/Contents/MacOS/Google Chrome Beta".into(),
    );

    #[cfg(target_os = "linux")]
    candidates.push("/usr/bin/google-chrome-beta".into());

    #[cfg(target_os = "windows")]
    candidates.push("C:/Program Files/Google/Chrome Beta/Application/chrome.exe".into());

    candidates
}

/// Chrome launch arguments for a sniping session. Incognito by default; a
/// configured proxy extension needs a real profile, so it replaces incognito
/// with the extension load and profile args.
pub fn chrome_args(proxy: Option<&ProxyExtension>) -> Vec<String> {
    let mut args = vec![
        "--no-first-run".to_string(),
        "--no-default-browser-check".into(),
        "--disable-background-networking".into(),
        "--disable-client-side-phishing-detection".into(),
        "--disable-default-apps".into(),
        "--disable-hang-monitor".into(),
        "--disable-popup-blocking".into(),
        "--disable-prompt-on-repost".into(),
        "--disable-sync".into(),
        "--disable-translate".into(),
        "--metrics-recording-only".into(),
        "--safebrowsing-disable-auto-update".into(),
    ];

    match proxy {
        Some(ext) => {
            args.push(format!("--load-extension={}", ext.extension_dir.display()));
            args.push(format!("--user-data-dir={}", ext.user_data_dir.display()));
            args.push(format!("--profile-directory={}", ext.profile));
        }
        None => {
            args.push("--incognito".into());
            args.push("--disable-extensions".into());
        }
    }

    args
}
