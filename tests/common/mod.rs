/// Common test utilities for coupler-jupyter integration tests
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Stand-in for the docker CLI: records each invocation and answers with
/// canned output. `FAKE_IMAGE_ID` and `FAKE_PULL_STATUS` steer the image step.
const FAKE_DOCKER: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/calls.log"
case "$1" in
  --version) echo "Docker version 24.0.7, build afdd53b" ;;
  images)
    if [ "$2" = "-q" ]; then echo "${FAKE_IMAGE_ID-sha256cafe}"; fi ;;
  pull) exit "${FAKE_PULL_STATUS:-0}" ;;
  run) echo "0123456789ab" ;;
  exec)
    case "$3" in
      cat|tail) echo "[I 10:02:11.123 NotebookApp]     http://0.0.0.0:8888/?token=feedbeef" ;;
    esac ;;
  ps) echo "0123456789ab" ;;
esac
exit 0
"#;

/// A scratch home directory with a fake runtime and a config pointing at it
#[allow(dead_code)]
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub bin_dir: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home = temp_dir.path().join("home");
        let bin_dir = temp_dir.path().join("bin");
        fs::create_dir_all(&home).expect("Failed to create home");
        fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");

        let docker = bin_dir.join("docker");
        fs::write(&docker, FAKE_DOCKER).expect("Failed to write fake docker");
        fs::set_permissions(&docker, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake docker executable");

        let config_path = temp_dir.path().join("jupyter.yml");
        let env = TestEnv {
            temp_dir,
            home,
            bin_dir,
            config_path,
        };
        env.write_config(&format!("runtime: {}\n", docker.display()));
        env
    }

    /// Replace the config; host checks are always disabled
    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, format!("host_checks: false\n{}", content))
            .expect("Failed to write config file");
    }

    #[allow(dead_code)]
    pub fn runtime_path(&self) -> PathBuf {
        self.bin_dir.join("docker")
    }

    /// Run the launcher with the test config and extra environment
    pub fn launch(&self, args: &[&str], envs: &[(&str, &str)]) -> CommandResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_coupler-jupyter"));
        cmd.arg("--config")
            .arg(&self.config_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("HOME", &self.home)
            .env_remove("RUST_LOG")
            .env_remove("BROWSER");
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute coupler-jupyter");
        CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        }
    }

    /// Runtime invocations recorded by the fake docker, one per line
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.bin_dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Result of running a command
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl CommandResult {
    /// Assert the command succeeded
    pub fn assert_success(&self) {
        if !self.success {
            panic!(
                "Command failed:\nstdout: {}\nstderr: {}\nexit code: {:?}",
                self.stdout, self.stderr, self.exit_code
            );
        }
    }

    /// Assert the command failed
    #[allow(dead_code)]
    pub fn assert_failure(&self) {
        if self.success {
            panic!(
                "Command succeeded when it should have failed:\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
    }

    /// Assert stdout contains text
    #[allow(dead_code)]
    pub fn assert_stdout_contains(&self, text: &str) {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain '{}'\nstdout: {}",
            text,
            self.stdout
        );
    }

    /// Assert stderr contains text
    #[allow(dead_code)]
    pub fn assert_stderr_contains(&self, text: &str) {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain '{}'\nstderr: {}",
            text,
            self.stderr
        );
    }
}
