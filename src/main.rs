//! GRIDFALL - terminal front end
//!
//! Reads one command per line from stdin:
//! `place X Y`, `rotate [N]`, `swap`, `chat TEXT`, `scores`, `hiscores`, `quit`

use clap::Parser;
use gridfall::engine::Engine;
use gridfall::error::Result;
use gridfall::events::{GameEvent, SessionHooks};
use gridfall::highscores::{ScoreRecord, ScoreTable};
use gridfall::multiplayer::MultiplayerEngine;
use gridfall::net;
use gridfall::session::{self, Command};
use gridfall::settings::Settings;
use gridfall::source::PieceSource;
use gridfall::ui;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// How long to wait for the final messages to reach the server
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "gridfall", version, about = "Grid placement block puzzle")]
struct Args {
    /// Join the game server at HOST:PORT instead of playing solo
    #[arg(long, value_name = "HOST:PORT")]
    connect: Option<String>,

    /// Player name for leaderboards and high scores
    #[arg(long)]
    name: Option<String>,

    /// Seed for a reproducible solo game
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    cols: Option<usize>,

    #[arg(long)]
    rows: Option<usize>,
}

impl Args {
    /// Command-line flags win over the settings file
    fn apply(self, settings: &mut Settings) {
        if let Some(server) = self.connect {
            settings.network.server = Some(server);
        }
        if let Some(name) = self.name {
            settings.player.name = name;
        }
        if let Some(seed) = self.seed {
            settings.game.seed = Some(seed);
        }
        if let Some(cols) = self.cols {
            settings.board.cols = cols;
        }
        if let Some(rows) = self.rows {
            settings.board.rows = rows;
        }
    }
}

/// Get the gridfall temp directory, creating it if needed
fn gridfall_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("gridfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Log to a per-session file so the terminal stays clean
fn init_logging() -> (WorkerGuard, PathBuf) {
    let session_id: u32 = rand::random();
    let dir = gridfall_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    let file_appender = tracing_appender::rolling::never(&dir, &log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridfall=debug")),
        )
        .with_ansi(false)
        .init();

    (guard, dir.join(log_file))
}

/// Forward stdin lines as commands; EOF closes the channel
fn spawn_stdin_reader() -> UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        println!("{} (try: place X Y, rotate, swap, chat TEXT, scores, hiscores, quit)", e)
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn present<S: PieceSource, H: SessionHooks>(engine: &Engine<S, H>, events: &[GameEvent]) {
    for event in events {
        if let Some(message) = ui::describe_event(event) {
            println!("{}", message);
        }
    }
    if events
        .iter()
        .any(|e| matches!(e, GameEvent::NextPiece { .. } | GameEvent::Placed { .. }))
    {
        println!("{}", ui::render_game(engine));
    }
}

async fn play_solo(settings: &Settings, best: u64, commands: &mut UnboundedReceiver<Command>) -> Result<u64> {
    let (cols, rows) = (settings.board.cols, settings.board.rows);
    let mut engine = match settings.game.seed {
        Some(seed) => {
            info!("Solo game with seed {}", seed);
            Engine::with_seed(cols, rows, seed)
        }
        None => Engine::single_player(cols, rows),
    };
    engine.set_highscore(best);
    session::run_single_player(&mut engine, commands, present).await?;
    Ok(engine.score())
}

async fn play_online(
    settings: &Settings,
    server: &str,
    best: u64,
    commands: &mut UnboundedReceiver<Command>,
) -> Result<u64> {
    let handle = tokio::runtime::Handle::current();
    let (outbound, mut net_events, connection) = net::spawn_connection(&handle, server.to_string());

    let mut game = MultiplayerEngine::new(settings.board.cols, settings.board.rows, outbound);
    game.engine_mut().set_highscore(best);
    println!("Connecting to {} as {}...", server, settings.player.name);

    let name = settings.player.name.clone();
    let result = session::run_multiplayer(&mut game, &mut net_events, commands, |game, events| {
        if events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })) {
            game.submit_highscore(&name);
        }
        if events.iter().any(|e| matches!(e, GameEvent::LeaderboardUpdated { .. })) {
            println!("{}", ui::render_leaderboard(game.leaderboard()));
        }
        present(game.engine(), events);
    })
    .await;
    let score = game.engine().score();

    // Closing the outbound channel lets the connection flush and exit
    drop(game);
    if tokio::time::timeout(FLUSH_TIMEOUT, connection).await.is_err() {
        warn!("Connection did not shut down within {:?}", FLUSH_TIMEOUT);
    }
    result.map(|_| score)
}

async fn run(settings: Settings) -> Result<()> {
    let scores_path = settings.scores_path();
    let mut table = match ScoreTable::load_or_create(&scores_path) {
        Ok(table) => table,
        Err(e) => {
            warn!("Could not load high scores from {}: {}", scores_path.display(), e);
            ScoreTable::with_defaults()
        }
    };

    let mut commands = spawn_stdin_reader();
    let score = match &settings.network.server {
        Some(server) => play_online(&settings, server, table.best(), &mut commands).await?,
        None => play_solo(&settings, table.best(), &mut commands).await?,
    };

    println!("Final score: {}", score);
    if let Some(rank) = table.add(ScoreRecord::new(settings.player.name.clone(), score)) {
        println!("New high score! Rank {}", rank);
        table.save(&scores_path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let (_guard, log_path) = init_logging();
    info!("GRIDFALL starting up, log={}", log_path.display());

    let mut settings = Settings::load();
    if Settings::settings_path().is_some_and(|path| !path.exists()) {
        // First run: leave a file to edit
        if let Err(e) = settings.save() {
            warn!("Could not write default settings: {}", e);
        }
    }
    args.apply(&mut settings);
    if let Err(e) = settings.validate() {
        error!("{}", e);
        eprintln!("gridfall: {}", e);
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create async runtime: {}", e);
            eprintln!("gridfall: failed to create async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(settings));
    // The stdin reader may still be parked on a blocking read
    runtime.shutdown_background();

    match result {
        Ok(()) => {
            println!("Thanks for playing GRIDFALL!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Session failed: {}", e);
            eprintln!("gridfall: {}", e);
            ExitCode::FAILURE
        }
    }
}
