// Container runtime invocations
// Every call shells out to the runtime CLI with an explicit argv (no shell)

use crate::errors::{LaunchError, Result};
use regex::Regex;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;

/// Operations the launcher needs from a container runtime
pub trait ContainerRuntime {
    /// Output of `<runtime> --version`
    fn version(&self) -> Result<String>;

    /// Local image id for `image`, if present
    fn image_id(&self, image: &str) -> Result<Option<String>>;

    /// Pull `image`, streaming progress to the terminal
    fn pull(&self, image: &str) -> Result<()>;

    fn dangling_images(&self) -> Result<Vec<String>>;

    fn remove_image(&self, id: &str) -> Result<()>;

    fn remove_volume(&self, name: &str) -> Result<()>;

    /// `<runtime> <args...>` for a detached `run`
    fn run_detached(&self, args: &[String]) -> Result<()>;

    /// Contents of a file inside the container
    fn read_file(&self, container: &str, path: &str) -> Result<String>;

    /// Follow a file inside the container from its beginning
    fn follow_file(&self, container: &str, path: &str) -> Result<LogTail>;

    /// Echo new lines of a file to the terminal until the tail exits
    fn stream_file(&self, container: &str, path: &str) -> Result<()>;

    fn is_running(&self, container: &str) -> Result<bool>;

    /// Ask the image's init process to shut the container down
    fn stop_server(&self, container: &str) -> Result<()>;
}

/// Line stream over a followed log; kills the producing process on drop
pub struct LogTail {
    reader: Box<dyn BufRead>,
    child: Option<Child>,
}

impl LogTail {
    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            child: None,
        }
    }

    fn from_child(mut child: Child) -> Result<Self> {
        let stdout = child.stdout.take().ok_or_else(|| {
            LaunchError::CommandFailed("tail process has no stdout".to_string())
        })?;
        Ok(Self {
            reader: Box::new(BufReader::new(stdout)),
            child: Some(child),
        })
    }

    pub fn reader(&mut self) -> &mut dyn BufRead {
        &mut self.reader
    }
}

impl Drop for LogTail {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Runtime driven through the `docker` CLI (or a compatible one such as podman)
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        tracing::debug!(program = %self.program, ?args, "runtime command");
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd
    }

    /// Run to completion and return stdout; non-zero exit is `CommandFailed`
    fn output(&self, args: &[&str]) -> Result<String> {
        let output = self.command(args).stdin(Stdio::null()).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaunchError::CommandFailed(format!(
                "{} {}: {}",
                self.program,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl ContainerRuntime for DockerCli {
    fn version(&self) -> Result<String> {
        self.output(&["--version"])
            .map(|v| v.trim().to_string())
            .map_err(|_| LaunchError::RuntimeUnavailable)
    }

    fn image_id(&self, image: &str) -> Result<Option<String>> {
        let out = self
            .output(&["images", "-q", image])
            .map_err(|_| LaunchError::RuntimeUnavailable)?;
        Ok(out.lines().next().map(str::trim).filter(|id| !id.is_empty()).map(String::from))
    }

    fn pull(&self, image: &str) -> Result<()> {
        let status = self
            .command(&["pull", image])
            .status()
            .map_err(|_| LaunchError::RuntimeUnavailable)?;

        if !status.success() {
            return Err(LaunchError::PullFailed {
                image: image.to_string(),
                code: status.code().unwrap_or(1),
            });
        }
        Ok(())
    }

    fn dangling_images(&self) -> Result<Vec<String>> {
        let out = self.output(&["images", "-f", "dangling=true", "-q"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect())
    }

    fn remove_image(&self, id: &str) -> Result<()> {
        self.output(&["rmi", "-f", id]).map(|_| ())
    }

    fn remove_volume(&self, name: &str) -> Result<()> {
        self.output(&["volume", "rm", "-f", name]).map(|_| ())
    }

    fn run_detached(&self, args: &[String]) -> Result<()> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let container_id = self.output(&args)?;
        tracing::debug!(container_id = %container_id.trim(), "container started");
        Ok(())
    }

    fn read_file(&self, container: &str, path: &str) -> Result<String> {
        self.output(&["exec", container, "cat", path])
    }

    fn follow_file(&self, container: &str, path: &str) -> Result<LogTail> {
        let child = self
            .command(&["exec", container, "tail", "-F", path])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        LogTail::from_child(child)
    }

    fn stream_file(&self, container: &str, path: &str) -> Result<()> {
        let status = self
            .command(&["exec", container, "tail", "-F", "-n", "0", path])
            .status()?;

        if !status.success() {
            return Err(LaunchError::CommandFailed(format!(
                "tail of {} in {} exited with {}",
                path, container, status
            )));
        }
        Ok(())
    }

    fn is_running(&self, container: &str) -> Result<bool> {
        let filter = format!("name={}", container);
        let out = self.output(&["ps", "-q", "-f", filter.as_str()])?;
        Ok(!out.trim().is_empty())
    }

    fn stop_server(&self, container: &str) -> Result<()> {
        self.output(&["exec", container, "killall", "my_init"]).map(|_| ())
    }
}

fn docker_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Docker version (\d+(?:\.\d+)*)").expect("valid regex"))
}

/// Flag that removes the container when it exits.
///
/// Docker clients before 1.13 reject `--rm` together with `-d`; those get
/// `-t` instead. Newer docker releases and other runtimes (podman) get `--rm`.
pub fn rm_flag(version_output: &str) -> &'static str {
    let legacy = docker_version_regex()
        .captures(version_output)
        .and_then(|caps| caps.get(1))
        .map(|v| {
            version_compare::compare_to(v.as_str(), "1.13", version_compare::Cmp::Lt)
                .unwrap_or(false)
        })
        .unwrap_or(false);

    if legacy {
        "-t"
    } else {
        "--rm"
    }
}
