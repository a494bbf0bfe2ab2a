mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gauntlet_common::types::RunPolicy;
use gauntlet_common::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gauntlet-cli")]
#[command(about = "Gauntlet CLI - Compile, run and judge C++ submissions locally", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file and run it once
    Run {
        /// C++ source file
        #[arg(short, long)]
        source: PathBuf,

        /// File fed to the program's stdin (empty input if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Execution budget in milliseconds (defaults to GAUNTLET_TIME_LIMIT_MS)
        #[arg(short, long)]
        time_limit_ms: Option<u64>,
    },

    /// Judge a source file against a question's fixtures
    Validate {
        /// C++ source file
        #[arg(short, long)]
        source: PathBuf,

        /// Question id; fixtures are read from <fixtures dir>/Ques<id>
        #[arg(short, long)]
        question: String,

        /// Report every fixture instead of stopping at the first failure
        #[arg(long, default_value = "false")]
        run_all: bool,

        /// Execution budget per fixture in milliseconds
        #[arg(short, long)]
        time_limit_ms: Option<u64>,
    },

    /// List stored questions
    Questions,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid configuration")?;

    let ok = match cli.command {
        Commands::Run {
            source,
            input,
            time_limit_ms,
        } => {
            if let Some(ms) = time_limit_ms {
                config.time_limit_ms = ms;
            }
            commands::run_program(&config, &source, input.as_deref()).await?
        }
        Commands::Validate {
            source,
            question,
            run_all,
            time_limit_ms,
        } => {
            if let Some(ms) = time_limit_ms {
                config.time_limit_ms = ms;
            }
            if run_all {
                config.suite_policy = RunPolicy::RunAll;
            }
            commands::validate_question(&config, &source, &question).await?
        }
        Commands::Questions => {
            commands::list_questions(&config).await?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
