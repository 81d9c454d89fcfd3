// Error display with remediation hints
use crate::errors::LaunchError;
use colored::Colorize;

/// Display an error with helpful suggestions
pub fn display_error_with_suggestions(error: &LaunchError) {
    eprintln!("\n{}: {}", "Error".bright_red().bold(), error);

    let hints = suggestions_for(error);
    if hints.is_empty() {
        return;
    }

    eprintln!("\n{}:", "Suggestions".bright_yellow());
    for hint in hints {
        eprintln!("  • {}", hint);
    }
}

fn suggestions_for(error: &LaunchError) -> Vec<String> {
    match error {
        LaunchError::NotInDockerGroup => vec![
            format!(
                "Add yourself to the docker group: {}",
                "sudo addgroup $USER docker".bright_cyan()
            ),
            "Then, log out and log back in before you can use Docker.".to_string(),
        ],

        LaunchError::RuntimeUnavailable => vec![
            format!("Check that Docker is installed: {}", "docker --version".bright_cyan()),
            format!("Check that the daemon is running: {}", "docker info".bright_cyan()),
        ],

        LaunchError::PullFailed { image, .. } => vec![
            format!("Verify the image name and tag: {}", image.bright_cyan()),
            "Check your network connection and registry login".to_string(),
        ],

        LaunchError::NoFreePort => vec![
            "Stop other notebook servers listening near port 8888".to_string(),
            format!("Pick another base port with {} in the config file", "base_port".bright_cyan()),
        ],

        LaunchError::ContainerStopped(name) => vec![
            format!("Inspect its output: {}", format!("docker logs {}", name).bright_cyan()),
            format!("Run again with {} to see runtime commands", "--verbose".bright_cyan()),
        ],

        LaunchError::Config(_) => vec![
            "Check the YAML syntax of the config file".to_string(),
            format!("Run with {} to ignore it", "--config /dev/null".bright_cyan()),
        ],

        LaunchError::RunningAsRoot => {
            vec!["Run the launcher as the regular user that owns the shared directory".to_string()]
        }

        _ => Vec::new(),
    }
}
