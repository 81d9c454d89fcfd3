use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Docker failed. Please make sure docker was properly installed and has been started.")]
    RuntimeUnavailable,

    #[error("Failed to pull image '{image}' (exit code {code})")]
    PullFailed { image: String, code: i32 },

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Could not find a free port.")]
    NoFreePort,

    #[error("You are not a member of the docker group.")]
    NotInDockerGroup,

    #[error("You are running as root. This is not safe. Please run as a regular user.")]
    RunningAsRoot,

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Docker container {0} is no longer running")]
    ContainerStopped(String),

    #[error("Aborted by user")]
    Aborted,

    #[error("Failed to open browser: {0}")]
    Browser(String),

    #[error("Could not install Ctrl-C handler: {0}")]
    Interrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::PullFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
