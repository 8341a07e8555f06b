mod cli;
mod commands;
mod context;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use error::exit_with_error;

fn init_tracing(cli: &Cli) {
    // --quiet and the default are both "off"; --verbose honours RUST_LOG,
    // falling back to "info".
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    let ansi = !(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    init_tracing(&cli);

    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn run(cli: Cli) -> error::CliResult<()> {
    let client = context::build_client(&cli)?;

    match &cli.command {
        Commands::Get {
            url,
            follow,
            vars,
            property,
        } => {
            let vars = context::parse_vars(vars)?;
            commands::get::run(&client, url, follow, &vars, property.as_deref())
        }
        Commands::Links { url } => commands::links::run(&client, url),
        Commands::Items { url, limit } => commands::items::run(&client, url, *limit),
    }
}
