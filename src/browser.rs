// Default browser launch

use crate::errors::{LaunchError, Result};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// Program and arguments that open `url` on this platform.
///
/// `$BROWSER` wins when set; otherwise the desktop's opener is used.
pub fn browser_command(url: &str, browser_env: Option<&str>) -> (String, Vec<String>) {
    if let Some(browser) = browser_env.map(str::trim).filter(|b| !b.is_empty()) {
        return (browser.to_string(), vec![url.to_string()]);
    }

    if cfg!(target_os = "macos") {
        ("open".to_string(), vec![url.to_string()])
    } else if cfg!(windows) {
        (
            "cmd".to_string(),
            vec![
                "/C".to_string(),
                "start".to_string(),
                String::new(),
                url.to_string(),
            ],
        )
    } else {
        ("xdg-open".to_string(), vec![url.to_string()])
    }
}

/// Open `url` without waiting for the browser to exit
pub fn open(url: &str) -> Result<()> {
    let browser = std::env::var("BROWSER").ok();
    let (program, args) = browser_command(url, browser.as_deref());
    tracing::debug!(%program, ?args, "opening browser");

    spawn_reaped(&program, &args)?;
    Ok(())
}

/// Spawn `program` and reap it from a background thread
fn spawn_reaped(program: &str, args: &[String]) -> Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| LaunchError::Browser(format!("{}: {}", program, e)))?;

    Ok(thread::spawn(move || child.wait().ok()))
}
