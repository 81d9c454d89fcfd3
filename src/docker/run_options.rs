// Assembles the `docker run` argv for the notebook container

use rand::Rng;
use std::path::{Path, PathBuf};

/// Everything that goes into starting the notebook container
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub container: String,
    pub image: String,
    pub port: u16,
    pub rm_flag: String,
    /// `HOST_UID` passed to the image's init; empty off Linux
    pub host_uid: String,
    /// Home directory of the notebook user inside the image
    pub container_home: String,
    /// Host directory shared as `<container_home>/shared`
    pub workdir: PathBuf,
    /// Host user's home, source of `.ssh` and `.gitconfig`
    pub user_home: PathBuf,
    pub config_volume: String,
    /// Project volume; empty means none
    pub project_volume: String,
    pub extra_args: Vec<String>,
}

impl RunOptions {
    /// Volume and working-directory flags
    pub fn mounts(&self) -> Vec<String> {
        let home = &self.container_home;
        let mut args = vec![
            "-v".to_string(),
            format!("{}:{}/shared", self.workdir.display(), home),
            "-v".to_string(),
            format!("{}:{}/.config", self.config_volume, home),
            "-v".to_string(),
            format!("{}:{}/.ssh", self.user_home.join(".ssh").display(), home),
        ];

        let gitconfig = self.user_home.join(".gitconfig");
        if gitconfig.is_file() {
            args.push("-v".to_string());
            args.push(format!("{}:{}/.gitconfig_host", gitconfig.display(), home));
        }

        if !self.project_volume.is_empty() {
            args.push("-v".to_string());
            args.push(format!("{}:{}/project", self.project_volume, home));
        }

        args.push("-w".to_string());
        args.push(format!("{}/shared", home));
        args
    }

    /// Shell command the image runs; server output goes to the log file
    pub fn server_command(&self, log_path: &str) -> String {
        format!(
            "jupyter-notebook --no-browser --ip=0.0.0.0 --port {} >> {} 2>&1",
            self.port, log_path
        )
    }

    /// Full argument list after the runtime binary
    pub fn to_args(&self, log_path: &str) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            self.rm_flag.clone(),
            "--name".to_string(),
            self.container.clone(),
            "-p".to_string(),
            format!("127.0.0.1:{port}:{port}", port = self.port),
            "--hostname".to_string(),
            self.container.clone(),
            "--env".to_string(),
            format!("HOST_UID={}", self.host_uid),
        ];

        args.extend(self.mounts());
        args.extend(self.extra_args.iter().cloned());
        args.push(self.image.clone());
        args.push(self.server_command(log_path));
        args
    }
}

/// `<app>-` followed by six random lowercase letters
pub fn container_name<R: Rng>(app: &str, rng: &mut R) -> String {
    let suffix: String = (0..6).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    format!("{}-{}", app, suffix)
}

/// Create `<home>/.ssh` so it can be bind-mounted
pub fn ensure_ssh_dir(user_home: &Path) -> std::io::Result<()> {
    let ssh = user_home.join(".ssh");
    if !ssh.exists() {
        std::fs::create_dir(&ssh)?;
    }
    Ok(())
}
