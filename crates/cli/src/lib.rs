pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    about = "Storefront ranking operator CLI",
    long_about = "Operate the storefront catalog: migrations, demo data, config inspection, and ranking queries.",
    after_help = "Examples:\n  storefront migrate\n  storefront seed\n  storefront search cozy winter sweater under 40\n  storefront recommend alice"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog and order history (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Rank the catalog against a free-text shopping query")]
    Search {
        #[arg(required = true, num_args = 1.., help = "Query text, e.g. `gold ring under 100`")]
        query: Vec<String>,
        #[arg(long, help = "Override the configured result limit")]
        limit: Option<usize>,
    },
    #[command(about = "Recommend products for a user from purchase history")]
    Recommend {
        #[arg(help = "User id as recorded on orders")]
        user_id: String,
        #[arg(long, help = "Override the configured result limit")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Search { query, limit } => commands::search::run(&query.join(" "), limit),
        Command::Recommend { user_id, limit } => commands::recommend::run(&user_id, limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
