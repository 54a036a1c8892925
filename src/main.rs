use clap::Parser;
use lrustore::cli::{Cli, Commands};
use lrustore::types::config::Config;
use lrustore::LruStoreResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> LruStoreResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default_config()
    };
    if let Some(dir) = cli.config.parent() {
        config.resolve_relative_to(dir);
    }

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("lrustore={}", log_level)
            .parse()
            .unwrap_or_else(|_| "lrustore=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            lrustore::cli::commands::init(path)?;
        }
        Commands::Put { key, value } => {
            lrustore::cli::commands::put(&key, &value, &config)?;
        }
        Commands::Get { key } => {
            lrustore::cli::commands::get(&key, &config)?;
        }
        Commands::Demo { capacity } => {
            lrustore::cli::commands::demo(capacity)?;
        }
        Commands::Version => {
            lrustore::cli::commands::version();
        }
    }

    Ok(())
}
