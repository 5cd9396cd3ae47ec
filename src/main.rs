use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::io::IsTerminal;

use stubcheck::cli::{Cli, Commands, run};
use stubcheck::diagnostics::OutputFormat;
use stubcheck::error::exit_code;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "stubcheck=debug",
        _ => "stubcheck=trace",
    };
    let filter =
        EnvFilter::try_from_env("STUBCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let plain = match &cli.command {
        Commands::Check(args) => args.no_color || args.format != OutputFormat::Human,
        _ => true,
    };
    if plain || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let stdout = std::io::stdout();
    let code = match run(&cli, &mut stdout.lock()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit_code::FAILURE
        }
    };
    std::process::exit(code);
}
