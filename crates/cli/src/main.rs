mod config_commands;
mod content_commands;
mod runtime;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "pixelbot", about = "Pixelbot: Telegram bots for PixelMug displays")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (overrides discovery of ./pixelbot.toml and the user config dir).
    #[arg(long, global = true, env = "PIXELBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured bot until Ctrl-C (default when no subcommand is provided).
    Run,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Run a local file or URL through the device content checks.
    ValidateContent {
        /// Path or http(s) URL of the GIF.
        source: String,
    },
    /// Print the command table the configured bot publishes.
    Commands,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets such as PIXELBOT_TELEGRAM_TOKEN may live in a local .env file.
    let dotenv = dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_telemetry(&cli);
    if let Some(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = runtime::load(cli.config.as_deref())?;
            runtime::run(config).await
        },
        Commands::Check { verbose } => config_commands::check(cli.config.as_deref(), verbose),
        Commands::ValidateContent { source } => {
            let config = runtime::load(cli.config.as_deref())?;
            content_commands::validate_content(&config.content, &source).await
        },
        Commands::Commands => {
            let config = runtime::load(cli.config.as_deref())?;
            runtime::print_commands(&config)
        },
    }
}
