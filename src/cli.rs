// Command-line surface and merging with file-backed defaults
use crate::config::LaunchConfig;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

/// Launch Jupyter Notebook within a Docker notebook image and
/// automatically open up the URL in the default web browser.
#[derive(Parser, Debug, Default)]
#[command(name = "coupler-jupyter")]
#[command(version)]
pub struct Args {
    /// The Docker image to use. The default is unifem/coupler-desktop.
    #[arg(short, long)]
    pub image: Option<String>,

    /// Tag of the image. The default is latest. If the image already has a tag, its tag prevails.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// A data volume to be mounted at ~/project. The default is coupler_project.
    #[arg(short, long)]
    pub volume: Option<String>,

    /// Pull the latest Docker image. The default is not to pull.
    #[arg(short, long)]
    pub pull: bool,

    /// Reset configurations to default.
    #[arg(short, long)]
    pub reset: bool,

    /// Clear the project data volume (please use with caution).
    #[arg(short, long)]
    pub clear: bool,

    /// Run in background and print container id
    #[arg(short, long)]
    pub detach: bool,

    /// The notebook to open.
    #[arg(default_value = "")]
    pub notebook: String,

    /// Do not start web browser
    #[arg(short, long)]
    pub no_browser: bool,

    /// All the arguments after -a will be passed to the "docker run" command.
    /// Useful for specifying resources and environment variables.
    #[arg(
        short = 'a',
        long = "args",
        num_args = 0..,
        allow_hyphen_values = true,
        value_name = "DOCKER_RUN_ARGS"
    )]
    pub args: Vec<String>,

    /// Read defaults from this YAML file instead of the user config directory
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log every runtime command to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Do not ask for confirmation before clearing the project volume
    #[arg(short, long)]
    pub yes: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// Launch parameters after applying command-line overrides to the config
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: LaunchConfig,
    /// Image reference including its tag
    pub image: String,
    /// Tag as given (used to name the config volume)
    pub tag: String,
    pub volume: String,
    pub pull: bool,
    pub reset: bool,
    pub clear: bool,
    pub detach: bool,
    pub notebook: String,
    pub open_browser: bool,
    pub extra_run_args: Vec<String>,
}

impl Settings {
    pub fn resolve(args: Args, config: LaunchConfig) -> Self {
        let tag = args.tag.unwrap_or_else(|| config.tag.clone());
        let image = args.image.unwrap_or_else(|| config.default_image());
        let volume = args.volume.unwrap_or_else(|| config.default_volume());

        Self {
            image: resolve_image(&image, &tag),
            tag,
            volume,
            pull: args.pull,
            reset: args.reset,
            clear: args.clear,
            detach: args.detach,
            notebook: args.notebook,
            open_browser: !args.no_browser,
            extra_run_args: args.args,
            config,
        }
    }

    /// Named volume holding the in-container `~/.config`
    pub fn config_volume(&self) -> String {
        format!("{}{}_config", self.config.app, self.tag)
    }
}

/// Append `:<tag>` unless the image already names a tag
pub fn resolve_image(image: &str, tag: &str) -> String {
    if image.contains(':') || tag.is_empty() {
        image.to_string()
    } else {
        format!("{}:{}", image, tag)
    }
}

/// Write completions for `shell` to stdout
pub fn print_completions(shell: Shell) {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_resolve_image_appends_tag() {
        assert_eq!(
            resolve_image("unifem/coupler-desktop", "latest"),
            "unifem/coupler-desktop:latest"
        );
    }

    #[test]
    fn test_resolve_image_keeps_existing_tag() {
        assert_eq!(
            resolve_image("unifem/coupler-desktop:dev", "latest"),
            "unifem/coupler-desktop:dev"
        );
    }

    #[test]
    fn test_resolve_image_empty_tag() {
        assert_eq!(resolve_image("myimage", ""), "myimage");
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(parse(&["coupler-jupyter"]), LaunchConfig::default());
        assert_eq!(settings.image, "unifem/coupler-desktop:latest");
        assert_eq!(settings.tag, "latest");
        assert_eq!(settings.volume, "coupler_project");
        assert_eq!(settings.notebook, "");
        assert_eq!(settings.config_volume(), "couplerlatest_config");
        assert!(settings.open_browser);
        assert!(!settings.detach);
        assert!(settings.extra_run_args.is_empty());
    }

    #[test]
    fn test_flags_override_config() {
        let config = LaunchConfig {
            image: Some("example/custom".to_string()),
            tag: "v1".to_string(),
            ..LaunchConfig::default()
        };
        let args = parse(&[
            "coupler-jupyter",
            "-t",
            "v2",
            "-v",
            "scratch",
            "-n",
            "-d",
            "demo.ipynb",
        ]);

        let settings = Settings::resolve(args, config);
        assert_eq!(settings.image, "example/custom:v2");
        assert_eq!(settings.volume, "scratch");
        assert_eq!(settings.notebook, "demo.ipynb");
        assert_eq!(settings.config_volume(), "couplerv2_config");
        assert!(!settings.open_browser);
        assert!(settings.detach);
    }

    #[test]
    fn test_empty_volume_is_kept_empty() {
        let settings = Settings::resolve(
            parse(&["coupler-jupyter", "--volume", ""]),
            LaunchConfig::default(),
        );
        assert_eq!(settings.volume, "");
    }

    #[test]
    fn test_run_args_pass_through() {
        let args = parse(&[
            "coupler-jupyter",
            "notes.ipynb",
            "-a",
            "--cpus",
            "2",
            "--env",
            "FOO=bar",
        ]);
        assert_eq!(args.notebook, "notes.ipynb");
        assert_eq!(args.args, vec!["--cpus", "2", "--env", "FOO=bar"]);
    }

    #[test]
    fn test_bare_run_args_flag() {
        let args = parse(&["coupler-jupyter", "-a"]);
        assert!(args.args.is_empty());
    }

    #[test]
    fn test_run_args_swallow_launcher_flags() {
        let args = parse(&["coupler-jupyter", "-a", "-e", "FOO=1", "-d", "-v", "/a:/b"]);
        assert!(!args.detach);
        assert_eq!(args.args, vec!["-e", "FOO=1", "-d", "-v", "/a:/b"]);
    }
}
