//! Strictly Matches - Unified CLI
//!
//! Runs the match server, or talks to a running one.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use strictly_matches::{
    AppState, Fanout, InMemoryMatchStore, Match, MatchEngine, MatchId, MatchStore, MatchView,
    Outcome, Phase, RestMatchClient, ServerConfig, SqliteMatchStore, router,
};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_matches=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
            ai_delay_ms,
        } => {
            let mut config = ServerConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(path) = db_path {
                config = config.with_database_path(Some(path));
            }
            if let Some(delay) = ai_delay_ms {
                config = config.with_automated_delay_ms(delay);
            }
            run_server(config).await
        }
        Command::Create {
            server_url,
            player,
            vs_ai,
        } => {
            let record = RestMatchClient::new(server_url).create(&player, vs_ai).await?;
            print_match(&record);
            Ok(())
        }
        Command::Join {
            server_url,
            match_id,
            player,
        } => {
            let record = RestMatchClient::new(server_url)
                .join(&MatchId::from(match_id), &player)
                .await?;
            print_match(&record);
            Ok(())
        }
        Command::Open { server_url } => {
            let open = RestMatchClient::new(server_url).list_open().await?;
            if open.is_empty() {
                println!("No open matches");
            }
            for match_id in open {
                println!("{}", match_id);
            }
            Ok(())
        }
        Command::State {
            server_url,
            match_id,
        } => {
            let record = RestMatchClient::new(server_url)
                .state(&MatchId::from(match_id))
                .await?;
            print_match(&record);
            Ok(())
        }
        Command::Move {
            server_url,
            match_id,
            player,
            cell,
        } => {
            let record = RestMatchClient::new(server_url)
                .make_move(&MatchId::from(match_id), &player, cell)
                .await?;
            print_match(&record);
            Ok(())
        }
        Command::Watch {
            server_url,
            match_id,
            interval_ms,
        } => watch(server_url, MatchId::from(match_id), interval_ms).await,
    }
}

/// Run the HTTP and websocket match server
#[instrument(skip_all, fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting Strictly Matches server");

    let store: Arc<dyn MatchStore> = match config.database_path() {
        Some(path) => {
            info!(db_path = %path, "Using SQLite match store");
            Arc::new(SqliteMatchStore::open(path).context("Failed to open match database")?)
        }
        None => {
            warn!("No database configured, matches are kept in memory only");
            Arc::new(InMemoryMatchStore::new())
        }
    };

    let engine = MatchEngine::new(store, Fanout::new(), config.automated_delay());
    let app = router(AppState::new(engine));

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Polls a match, printing each newer version until it concludes.
#[instrument(skip(server_url))]
async fn watch(server_url: String, match_id: MatchId, interval_ms: u64) -> Result<()> {
    let client = RestMatchClient::new(server_url);
    let mut view = MatchView::new(match_id.clone());
    let interval = Duration::from_millis(interval_ms.max(1));

    loop {
        let snapshot = client.state(&match_id).await?;
        if view.reconcile(snapshot) {
            if let Some(current) = view.current() {
                print_match(current);
                if *current.phase() == Phase::Concluded {
                    return Ok(());
                }
            }
        } else {
            debug!("No newer state");
        }
        tokio::time::sleep(interval).await;
    }
}

fn print_match(record: &Match) {
    println!("Match {} ({})", record.match_id(), record.phase());
    println!(
        "X: {}  O: {}",
        record.participant_a(),
        record.participant_b().label().unwrap_or("-")
    );
    println!("{}", record.board().display());
    match (record.phase(), record.outcome()) {
        (_, Some(Outcome::Won { mark, label })) => println!("Winner: {} ({})", label, mark),
        (_, Some(Outcome::Draw)) => println!("Draw"),
        (Phase::AwaitingOpponent, None) => println!("Waiting for an opponent"),
        (_, None) => println!(
            "Turn: {} ({})",
            record.turn(),
            record.turn_holder().unwrap_or("-")
        ),
    }
    println!();
}
