// End-to-end launch: image, volumes, container start, then supervise
// until the URL is found and the user stops the server.

use crate::cli::{Args, Settings};
use crate::clock::{Clock, SystemClock};
use crate::config::LaunchConfig;
use crate::docker::ports::find_free_port;
use crate::docker::run_options::{container_name, ensure_ssh_dir, RunOptions};
use crate::docker::runtime::{rm_flag, ContainerRuntime, DockerCli};
use crate::errors::{LaunchError, Result};
use crate::interrupt::{GraceDecision, Interrupts};
use crate::logscan::UrlScanner;
use crate::{browser, host};
use colored::Colorize;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a launch session ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// URL reported; container left running in the background
    Detached { container: String },
    /// User confirmed Ctrl-C and the server was asked to shut down
    Stopped { container: String },
}

/// Host-side facts that go into the run options
#[derive(Debug, Clone)]
pub struct HostEnv {
    pub workdir: PathBuf,
    pub user_home: PathBuf,
    pub host_uid: String,
}

impl HostEnv {
    pub fn detect() -> Result<Self> {
        Ok(Self {
            workdir: std::env::current_dir()?,
            user_home: host::user_home()?,
            host_uid: host::host_uid()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingUrl,
    Serving,
}

pub struct Launcher<'a> {
    settings: &'a Settings,
    runtime: &'a dyn ContainerRuntime,
    clock: &'a dyn Clock,
    interrupts: Interrupts,
}

impl<'a> Launcher<'a> {
    pub fn new(
        settings: &'a Settings,
        runtime: &'a dyn ContainerRuntime,
        clock: &'a dyn Clock,
        interrupts: Interrupts,
    ) -> Self {
        Self {
            settings,
            runtime,
            clock,
            interrupts,
        }
    }

    fn config(&self) -> &LaunchConfig {
        &self.settings.config
    }

    /// Start the container and supervise it
    pub fn run(&self, host: &HostEnv) -> Result<SessionOutcome> {
        self.prepare_image()?;
        ensure_ssh_dir(&host.user_home)?;
        self.prepare_volumes();

        eprintln!("Starting up docker image...");
        let options = self.run_options(host)?;
        self.runtime
            .run_detached(&options.to_args(&self.config().log_path()))?;
        tracing::info!(container = %options.container, port = options.port, "container started");

        let scanner = UrlScanner::new(
            self.config().url_marker.clone(),
            options.port,
            self.settings.notebook.clone(),
        );
        self.supervise(&options.container, &scanner)
    }

    /// Pull when asked or when the image is missing, then drop the image it replaced
    pub fn prepare_image(&self) -> Result<()> {
        let image = &self.settings.image;
        let existing = self.runtime.image_id(image)?;

        if !self.settings.pull && existing.is_some() {
            return Ok(());
        }

        self.runtime.pull(image)?;

        if let Some(old) = existing {
            let dangling = self.runtime.dangling_images().unwrap_or_default();
            if dangling.iter().any(|id| *id == old) {
                tracing::debug!(image_id = %old, "removing superseded image");
                if let Err(e) = self.runtime.remove_image(&old) {
                    tracing::warn!("could not remove image {}: {}", old, e);
                }
            }
        }

        Ok(())
    }

    /// Apply --reset and --clear; failures are reported and the launch goes on
    pub fn prepare_volumes(&self) {
        if self.settings.reset {
            self.remove_volume(&self.settings.config_volume());
        }

        if self.settings.clear && !self.settings.volume.is_empty() {
            self.remove_volume(&self.settings.volume);
        }
    }

    fn remove_volume(&self, name: &str) {
        if let Err(e) = self.runtime.remove_volume(name) {
            eprintln!("{}", e);
        }
    }

    fn run_options(&self, host: &HostEnv) -> Result<RunOptions> {
        let config = self.config();
        let rm_flag = rm_flag(&self.runtime.version()?);

        Ok(RunOptions {
            container: container_name(&config.app, &mut rand::thread_rng()),
            image: self.settings.image.clone(),
            port: find_free_port(config.base_port, config.port_retries)?,
            rm_flag: rm_flag.to_string(),
            host_uid: host.host_uid.clone(),
            container_home: config.container_home.clone(),
            workdir: host.workdir.clone(),
            user_home: host.user_home.clone(),
            config_volume: self.settings.config_volume(),
            project_volume: self.settings.volume.clone(),
            extra_args: self.settings.extra_run_args.clone(),
        })
    }

    /// Wait for the URL, then keep echoing the log until the user stops the server.
    ///
    /// Runtime command failures are retried while the container is still up;
    /// any other error asks the container to shut down before it is returned.
    pub fn supervise(&self, container: &str, scanner: &UrlScanner) -> Result<SessionOutcome> {
        let mut phase = Phase::AwaitingUrl;

        loop {
            let step = self.step(container, scanner, &mut phase);

            if self.interrupts.take() {
                match self
                    .interrupts
                    .await_confirmation(self.clock, self.config().interrupt_grace())
                {
                    GraceDecision::Stop => return Ok(self.stop(container)),
                    GraceDecision::Resume => continue,
                }
            }

            match step {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {}
                Err(LaunchError::CommandFailed(msg)) => {
                    tracing::debug!(%msg, "runtime command failed");
                    match self.runtime.is_running(container) {
                        Ok(true) => self.clock.sleep(POLL_INTERVAL),
                        _ => return Err(LaunchError::ContainerStopped(container.to_string())),
                    }
                }
                Err(e) => {
                    tracing::warn!(container, "stopping container after error: {}", e);
                    self.stop_quietly(container);
                    return Err(e);
                }
            }
        }
    }

    fn step(
        &self,
        container: &str,
        scanner: &UrlScanner,
        phase: &mut Phase,
    ) -> Result<Option<SessionOutcome>> {
        if *phase == Phase::AwaitingUrl {
            match self.wait_for_url(container, scanner)? {
                Some(url) => {
                    self.announce(&url);
                    *phase = Phase::Serving;
                }
                None => {
                    if !self.interrupts.pending() {
                        self.clock.sleep(POLL_INTERVAL);
                    }
                    return Ok(None);
                }
            }
        }

        if self.settings.detach {
            println!("Started container {} in background.", container);
            println!(
                "To stop it, use \"{} stop {}\".",
                self.config().runtime,
                container
            );
            return Ok(Some(SessionOutcome::Detached {
                container: container.to_string(),
            }));
        }

        println!("Press Ctrl-C to stop the server.");
        self.clock.sleep(POLL_INTERVAL);
        if self.interrupts.pending() {
            return Ok(None);
        }

        // Blocks until the container exits or Ctrl-C kills the tail
        self.runtime
            .stream_file(container, &self.config().log_path())?;

        if !self.interrupts.pending() && !self.runtime.is_running(container)? {
            return Err(LaunchError::ContainerStopped(container.to_string()));
        }
        Ok(None)
    }

    /// Wait for the server log to appear, then scan it for the URL
    fn wait_for_url(&self, container: &str, scanner: &UrlScanner) -> Result<Option<String>> {
        let log_path = self.config().log_path();

        while self.runtime.read_file(container, &log_path)?.trim().is_empty() {
            if self.interrupts.pending() {
                return Ok(None);
            }
            self.clock.sleep(POLL_INTERVAL);
        }

        let mut tail = self.runtime.follow_file(container, &log_path)?;
        let url = scanner.scan(tail.reader())?;
        Ok(url)
    }

    fn announce(&self, url: &str) {
        println!("Copy/paste this URL into your browser when you connect for the first time:");
        println!("     {}", url.bright_cyan());

        if self.settings.open_browser {
            if let Err(e) = browser::open(url) {
                tracing::warn!("{}", e);
            }
        }
    }

    fn stop(&self, container: &str) -> SessionOutcome {
        println!("*** Stopping the server.");
        self.stop_quietly(container);
        SessionOutcome::Stopped {
            container: container.to_string(),
        }
    }

    fn stop_quietly(&self, container: &str) {
        if let Err(e) = self.runtime.stop_server(container) {
            tracing::warn!("could not stop {}: {}", container, e);
            eprintln!(
                "To stop it, use \"{} stop {}\".",
                self.config().runtime,
                container
            );
        }
    }
}

/// Entry point behind the binary: load config, check the host, launch
pub fn launch(args: Args) -> Result<SessionOutcome> {
    let config = LaunchConfig::load(args.config.as_deref())?;
    let assume_yes = args.yes;
    let settings = Settings::resolve(args, config);

    if settings.config.host_checks {
        host::check_host()?;
    }

    if settings.clear
        && !settings.volume.is_empty()
        && !assume_yes
        && std::io::stdin().is_terminal()
    {
        confirm_clear(&settings.volume)?;
    }

    let host = HostEnv::detect()?;
    let runtime = DockerCli::new(settings.config.runtime.clone());
    let interrupts = Interrupts::install()?;

    Launcher::new(&settings, &runtime, &SystemClock, interrupts).run(&host)
}

fn confirm_clear(volume: &str) -> Result<()> {
    let proceed = Confirm::new()
        .with_prompt(format!(
            "Remove all data in volume '{}'? This cannot be undone",
            volume
        ))
        .default(false)
        .interact()
        .map_err(|e| LaunchError::CommandFailed(format!("confirmation prompt: {}", e)))?;

    if proceed {
        Ok(())
    } else {
        Err(LaunchError::Aborted)
    }
}
