use clap::Parser;
use cubby::cli::commands::Cli;
use cubby::cli::handlers;

fn main() {
    let cli = Cli::parse();
    cubby::logging::init_logging(&handlers::configured_log_level(cli.workspace_dir.as_deref()));

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
