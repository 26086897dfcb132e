//! askdb - Chat with a relational database in natural language.

use askdb::app::Orchestrator;
use askdb::cli::Cli;
use askdb::config::Config;
use askdb::connection::ConnectionManager;
use askdb::db::MockDatabaseClient;
use askdb::error::{AskError, Result};
use askdb::headless::{self, HeadlessConfig};
use askdb::llm::create_client;
use askdb::logging;
use askdb::session::Session;
use askdb::tui::Tui;
use tracing::{error, info, warn};

/// Label of the in-memory database attached by `--mock-db`.
const MOCK_DB_LABEL: &str = "music_store";

fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.headless {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Internal Error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the program and returns the process exit code.
async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    // The provider decides which environment variables apply
    if let Some(provider) = &cli.llm {
        config.llm.provider = provider.clone();
    }
    config.apply_env(|key| std::env::var(key).ok());
    cli.apply_to(&mut config)?;

    let headless_config = if cli.headless {
        Some(HeadlessConfig::from_cli(&cli)?)
    } else {
        None
    };

    let llm = create_client(&config.llm)?;
    let session = Session::new(ConnectionManager::new(config.chat.sample_rows));
    let mut orchestrator =
        Orchestrator::new(session, llm).with_schema_snapshot(config.chat.snapshot_schema);

    let mut startup_error: Option<AskError> = None;
    if cli.mock_db {
        orchestrator
            .attach(Box::new(MockDatabaseClient::music_store()), MOCK_DB_LABEL)
            .await;
    } else if cli.should_connect() {
        info!("Connecting to {}", config.connection.display_string());
        if let Err(e) = orchestrator.connect(&config.connection).await {
            if cli.headless {
                return Err(e);
            }
            warn!("Startup connection failed: {}", e);
            startup_error = Some(e);
        }
    }

    match headless_config {
        Some(headless_config) => run_headless(&mut orchestrator, headless_config).await,
        None => {
            let mut tui = Tui::new()?;
            tui.run(&mut orchestrator, &config.connection, startup_error)
                .await?;
            Ok(0)
        }
    }
}

async fn run_headless(orchestrator: &mut Orchestrator, config: HeadlessConfig) -> Result<i32> {
    let transcript = headless::run(orchestrator, &config.questions).await;
    print!(
        "{}",
        headless::format_transcript(&transcript, config.output_format)?
    );

    if let Err(e) = orchestrator.close().await {
        warn!("Error closing database connection: {}", e);
    }

    Ok(if transcript.failures() > 0 { 1 } else { 0 })
}
