pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use saleflow_core::config::{AppConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "saleflow",
    about = "Saleflow sales wizard CLI",
    long_about = "Replay scripted sales through the wizard, quote payment discounts, and inspect configuration.",
    after_help = "Examples:\n  saleflow simulate demos/dual_sale.toml\n  saleflow quote --base 10.000,00 --percent 7,5 --method credit\n  saleflow config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a saleflow.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a TOML sale script through a wizard session and report the outcome")]
    Simulate { script: PathBuf },
    #[command(about = "Quote the discount of one payment method against the configured tier")]
    Quote {
        #[arg(long, help = "Base amount, e.g. 10.000,00")]
        base: String,
        #[arg(long, help = "Applied discount percent, e.g. 7,5")]
        percent: String,
        #[arg(long, default_value = "pix", help = "pix|credit|boleto|ted|doc")]
        method: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match commands::config::load(cli.config.clone()) {
        Ok(config) => config,
        Err(result) => {
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Simulate { script } => commands::simulate::run(&config, &script),
        Command::Quote { base, percent, method } => {
            commands::quote::run(&config, &base, &percent, &method)
        }
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(&config, cli.config.as_deref()),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
