mod export;
mod interactive;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use scout_client::{HttpListingSource, ReqwestVerifier};
use scout_core::session::Session;
use scout_core::traits::{ListingStore, SessionStore};
use scout_core::{IngestOutcome, PipelineConfig, SearchService, SearchStart};
use scout_db::{Database, DatabaseConfig, PgStore};

use crate::interactive::{ControlCommand, ProgressReporter, stdin_lines};

type CliSearch = SearchService<HttpListingSource, PgStore, ReqwestVerifier>;

#[derive(Parser)]
#[command(name = "scout", version, about = "Business listing search with dedup and website checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Search listings; reuses a cached result from the last 7 days
    Search {
        /// Business type, e.g. "coffee shop"
        #[arg(short = 't', long = "type")]
        business_type: String,

        /// Location, e.g. "Milano"
        #[arg(short, long)]
        location: String,

        /// Owner the session, cache entry and search log belong to
        #[arg(long, env = "SCOUT_OWNER_ID")]
        owner: Uuid,

        /// Listing source endpoint
        #[arg(long, env = "SCOUT_SOURCE_URL")]
        source_url: String,

        /// Bearer token for the listing source
        #[arg(long, env = "SCOUT_SOURCE_API_KEY", hide_env_values = true)]
        source_api_key: Option<String>,

        /// Output format for the processed listings
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Override the pause between persisted records (milliseconds)
        #[arg(long)]
        record_delay_ms: Option<u64>,

        /// Allow website checks against private/loopback addresses
        #[arg(long, default_value_t = false)]
        allow_private_urls: bool,
    },

    /// Show a session as JSON
    Show {
        /// Session ID
        session: Uuid,

        #[arg(long, env = "SCOUT_OWNER_ID")]
        owner: Uuid,
    },

    /// Export a session's listings as CSV
    Export {
        /// Session ID
        session: Uuid,

        #[arg(long, env = "SCOUT_OWNER_ID")]
        owner: Uuid,

        /// Export raw listings instead of processed ones
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout carries data only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            business_type,
            location,
            owner,
            source_url,
            source_api_key,
            format,
            record_delay_ms,
            allow_private_urls,
        } => {
            let mut config = PipelineConfig::from_env()?;
            if let Some(ms) = record_delay_ms {
                config = config.with_record_delay(Duration::from_millis(ms));
            }

            let mut source = HttpListingSource::new(&source_url)?;
            if let Some(key) = source_api_key {
                source = source.with_api_key(key);
            }
            let mut verifier = ReqwestVerifier::with_timeout(config.verify_timeout)?;
            if allow_private_urls {
                verifier = verifier.allow_private_urls();
            }

            let db = connect_db().await?;
            let search = SearchService::new(source, db.store(), verifier, &config);
            cmd_search(&search, owner, &business_type, &location, format).await?;
        }
        Commands::Show { session, owner } => {
            let db = connect_db().await?;
            let session = find_session(&db.store(), session, owner).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Commands::Export {
            session,
            owner,
            raw,
            output,
        } => {
            let db = connect_db().await?;
            cmd_export(&db.store(), session, owner, raw, output).await?;
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    Ok(db)
}

async fn find_session(store: &PgStore, session_id: Uuid, owner: Uuid) -> Result<Session> {
    store
        .get_session(session_id, owner)
        .await?
        .ok_or_else(|| anyhow!("Session {session_id} not found"))
}

async fn cmd_search(
    search: &CliSearch,
    owner: Uuid,
    business_type: &str,
    location: &str,
    format: OutputFormat,
) -> Result<()> {
    if business_type.trim().is_empty() || location.trim().is_empty() {
        anyhow::bail!("--type and --location must not be empty");
    }

    let session_id = match search.start(owner, business_type, location).await? {
        SearchStart::Cached {
            session_id,
            result_count,
        } => {
            eprintln!("Cached result from session {session_id} ({result_count} listings)");
            session_id
        }
        SearchStart::Started { session, control } => {
            eprintln!(
                "Session {} started. Type p + Enter to pause, r to resume, s to stop; Ctrl-C stops.",
                session.id
            );
            match drive(search, &session, &control).await? {
                IngestOutcome::Completed { .. } => session.id,
                IngestOutcome::Cancelled { total_records } => {
                    eprintln!(
                        "Stopped with {total_records} raw listings; export them with `scout export {} --raw`",
                        session.id
                    );
                    return Ok(());
                }
            }
        }
    };

    let listings = search.store().processed_listings(session_id).await?;
    let stdout = std::io::stdout();
    match format {
        OutputFormat::Json => {
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &listings)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => export::write_processed(stdout.lock(), &listings)?,
    }
    Ok(())
}

/// Run ingestion while forwarding keyboard commands and Ctrl-C to the session.
async fn drive(
    search: &CliSearch,
    session: &Session,
    control: &scout_core::SessionControl,
) -> Result<IngestOutcome> {
    let mut commands = stdin_lines();
    let mut stopping = false;

    let run = search.run(session, control, &ProgressReporter);
    tokio::pin!(run);

    loop {
        tokio::select! {
            outcome = &mut run => return Ok(outcome?),
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = true;
                search.manager().stop(session).await;
            }
            Some(line) = commands.recv() => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ControlCommand>() {
                    Ok(ControlCommand::Pause) => {
                        if let Err(e) = search.manager().pause(session).await {
                            eprintln!("Cannot pause: {e}");
                        }
                    }
                    Ok(ControlCommand::Resume) => {
                        if let Err(e) = search.manager().resume(session).await {
                            eprintln!("Cannot resume: {e}");
                        }
                    }
                    Ok(ControlCommand::Stop) => {
                        stopping = true;
                        search.manager().stop(session).await;
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }
}

async fn cmd_export(
    store: &PgStore,
    session_id: Uuid,
    owner: Uuid,
    raw: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = find_session(store, session_id, owner).await?;

    let out: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    let count = if raw {
        let listings = store.raw_listings(session.id).await?;
        export::write_raw(out, &listings)?;
        listings.len()
    } else {
        let listings = store.processed_listings(session.id).await?;
        export::write_processed(out, &listings)?;
        listings.len()
    };

    tracing::info!(session_id = %session.id, count, raw, "Exported listings");
    Ok(())
}
