// Host preconditions checked before touching the runtime

use crate::errors::{LaunchError, Result};
use std::path::PathBuf;
use std::process::Command;

/// Host user's home directory
pub fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or(LaunchError::NoHomeDir)
}

/// Whether `groups` output lists `group` as one of its entries
pub fn has_group(groups_output: &str, group: &str) -> bool {
    groups_output
        .split_whitespace()
        .any(|g| g.trim_end_matches(':') == group)
}

/// Effective user id, read from the owner of `/proc/self`
#[cfg(target_os = "linux")]
pub fn current_uid() -> Result<u32> {
    use std::os::unix::fs::MetadataExt;

    Ok(std::fs::metadata("/proc/self")?.uid())
}

/// Value exported to the container as `HOST_UID`.
///
/// On Linux the image remaps its user to this uid so files in the shared
/// directory stay owned by the caller; elsewhere it is left empty.
#[cfg(target_os = "linux")]
pub fn host_uid() -> Result<String> {
    Ok(current_uid()?.to_string())
}

#[cfg(not(target_os = "linux"))]
pub fn host_uid() -> Result<String> {
    Ok(String::new())
}

#[cfg(target_os = "linux")]
fn running_as_root() -> Result<bool> {
    Ok(current_uid()? == 0)
}

#[cfg(not(target_os = "linux"))]
fn running_as_root() -> Result<bool> {
    Ok(false)
}

/// Refuse to continue when docker would be unusable or unsafe (Linux only)
pub fn check_host() -> Result<()> {
    if !cfg!(target_os = "linux") {
        return Ok(());
    }

    let output = Command::new("groups").output()?;
    let groups = String::from_utf8_lossy(&output.stdout);
    if !has_group(&groups, "docker") {
        return Err(LaunchError::NotInDockerGroup);
    }

    if running_as_root()? {
        return Err(LaunchError::RunningAsRoot);
    }

    Ok(())
}
