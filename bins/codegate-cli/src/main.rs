mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegate-cli")]
#[command(about = "Codegate CLI - Manage the language table and run code through the gateway", long_about = None)]
struct Cli {
    /// Language table file
    #[arg(long, global = true, default_value = "config/languages.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a language to the table
    AddLang {
        /// Language id as understood by the execution engine (e.g., python, cpp)
        #[arg(short, long)]
        id: String,

        /// Pinned runtime version (e.g., 3.10.0)
        #[arg(short, long)]
        version: String,

        /// Source file name (e.g., main.py, Main.java)
        #[arg(short, long)]
        file: String,

        /// Display name (defaults to the id)
        #[arg(short, long)]
        display: Option<String>,
    },

    /// Remove a language from the table
    RemoveLang {
        /// Language id
        #[arg(short, long)]
        id: String,

        /// Skip confirmation
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// List languages in the table
    ListLangs,

    /// Write the builtin language table to a new project
    Init {
        /// Project path
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// Run a source file through the gateway pipeline
    Run {
        /// Source file to execute
        file: PathBuf,

        /// Language id
        #[arg(short, long)]
        language: String,

        /// File whose contents are passed as stdin
        #[arg(long)]
        stdin: Option<PathBuf>,

        /// Override the pinned runtime version
        #[arg(long)]
        version: Option<String>,

        /// Execution engine endpoint
        #[arg(long, env = "ENGINE_URL", default_value = codegate_common::engine::DEFAULT_ENGINE_URL)]
        engine_url: String,

        /// Timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AddLang {
            id,
            version,
            file,
            display,
        } => {
            commands::add_language(&cli.config, &id, &version, &file, display.as_deref())?;
        }
        Commands::RemoveLang { id, yes } => {
            commands::remove_language(&cli.config, &id, yes)?;
        }
        Commands::ListLangs => {
            commands::list_languages(&cli.config)?;
        }
        Commands::Init { path } => {
            commands::init_project(&path)?;
        }
        Commands::Run {
            file,
            language,
            stdin,
            version,
            engine_url,
            timeout,
        } => {
            let success = commands::run_file(commands::RunOptions {
                config: cli.config,
                file,
                language,
                stdin,
                version,
                engine_url,
                timeout_secs: timeout,
            })
            .await?;

            if !success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
