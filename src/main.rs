use clap::Parser;
use coupler_jupyter::cli::{self, Args};
use coupler_jupyter::{launcher, logging, suggestions};

fn main() {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        cli::print_completions(shell);
        return;
    }

    logging::init(args.verbose);

    if let Err(e) = launcher::launch(args) {
        suggestions::display_error_with_suggestions(&e);
        std::process::exit(e.exit_code());
    }
}
