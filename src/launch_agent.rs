//! Launch-at-login toggle backed by a macOS LaunchAgent.
//!
//! Creates and removes a LaunchAgent plist file in ~/Library/LaunchAgents/
//! to enable automatic startup at login.

use directories::BaseDirs;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const AGENT_LABEL: &str = "com.tomabar";

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Could not determine home directory")]
    NoHomeDir,
    #[error("Could not determine executable path: {0}")]
    NoExePath(io::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn launch_agents_dir() -> Result<PathBuf, PlatformError> {
    let base = BaseDirs::new().ok_or(PlatformError::NoHomeDir)?;
    Ok(base.home_dir().join("Library").join("LaunchAgents"))
}

fn plist_path() -> Result<PathBuf, PlatformError> {
    Ok(launch_agents_dir()?.join(format!("{AGENT_LABEL}.plist")))
}

fn generate_plist(exe: &Path) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <false/>
</dict>
</plist>
"#,
        label = AGENT_LABEL,
        exe = exe.display()
    )
}

/// Returns true if the app is registered to launch at login.
pub fn is_enabled() -> bool {
    plist_path().map(|p| p.exists()).unwrap_or(false)
}

/// Registers or unregisters the app to launch at login.
pub fn set_enabled(enabled: bool) -> Result<(), PlatformError> {
    let path = plist_path()?;
    if enabled {
        let exe = env::current_exe().map_err(PlatformError::NoExePath)?;
        write_agent(&path, &exe)
    } else {
        remove_agent(&path)
    }
}

fn write_agent(path: &Path, exe: &Path) -> Result<(), PlatformError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, generate_plist(exe))?;
    Ok(())
}

fn remove_agent(path: &Path) -> Result<(), PlatformError> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
