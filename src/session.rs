//! Async drivers that run a game to completion
//!
//! Player commands, server events and the turn deadline are all handled on
//! one task, so the engine is only ever touched by one of them at a time.

use crate::engine::{Engine, GameState};
use crate::error::{GameError, Result};
use crate::events::{GameEvent, SessionHooks};
use crate::multiplayer::{MultiplayerEngine, Transport};
use crate::net::NetEvent;
use crate::source::PieceSource;
use crate::timer::TimerToken;
use std::str::FromStr;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

/// A player action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Place { x: i32, y: i32 },
    Rotate(u8),
    Swap,
    Chat(String),
    /// Ask the server for the live leaderboard
    Scores,
    /// Ask the server for the online high score list
    HighScores,
    Quit,
}

impl FromStr for Command {
    type Err = GameError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || GameError::InvalidCommand(line.trim().to_string());
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        match word.to_ascii_lowercase().as_str() {
            "place" | "p" => {
                let mut coords = rest.split_whitespace().map(str::parse::<i32>);
                match (coords.next(), coords.next(), coords.next()) {
                    (Some(Ok(x)), Some(Ok(y)), None) => Ok(Command::Place { x, y }),
                    _ => Err(invalid()),
                }
            }
            "rotate" | "r" => match rest.trim() {
                "" => Ok(Command::Rotate(1)),
                steps => steps.parse().map(Command::Rotate).map_err(|_| invalid()),
            },
            "swap" | "s" => Ok(Command::Swap),
            "chat" | "say" => Ok(Command::Chat(rest.to_string())),
            "scores" => Ok(Command::Scores),
            "hiscores" => Ok(Command::HighScores),
            "quit" | "q" => Ok(Command::Quit),
            _ => Err(invalid()),
        }
    }
}

/// Sleep until the armed turn runs out, or forever if nothing is armed
async fn turn_expired(armed: Option<(TimerToken, Instant)>) -> Option<TimerToken> {
    match armed {
        Some((token, deadline)) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            Some(token)
        }
        None => std::future::pending().await,
    }
}

fn armed<S: PieceSource, H: SessionHooks>(engine: &Engine<S, H>) -> Option<(TimerToken, Instant)> {
    engine.armed_token().zip(engine.deadline())
}

fn is_running<S: PieceSource, H: SessionHooks>(engine: &Engine<S, H>) -> bool {
    engine.state() == GameState::Running
}

/// Apply a board command; chat is the caller's business
fn apply<S: PieceSource, H: SessionHooks>(engine: &mut Engine<S, H>, command: Command) -> Result<()> {
    match command {
        Command::Place { x, y } => {
            engine.attempt_placement(x, y)?;
        }
        Command::Rotate(steps) => {
            engine.rotate(steps);
        }
        Command::Swap => {
            engine.swap();
        }
        Command::Chat(_) | Command::Scores | Command::HighScores | Command::Quit => {}
    }
    Ok(())
}

/// Play a solo game until lives run out or the player quits
///
/// `on_event` sees the engine and the events produced by each step. The
/// game is ended on every exit, including errors.
pub async fn run_single_player<S, H, F>(
    engine: &mut Engine<S, H>,
    commands: &mut UnboundedReceiver<Command>,
    mut on_event: F,
) -> Result<()>
where
    S: PieceSource,
    H: SessionHooks,
    F: FnMut(&Engine<S, H>, &[GameEvent]),
{
    let mut result = engine.start();
    let events = engine.drain_events();
    on_event(engine, &events);

    while result.is_ok() && is_running(engine) {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Quit) | None => {
                    info!("Player quit");
                    break;
                }
                Some(Command::Chat(_)) | Some(Command::Scores) | Some(Command::HighScores) => {
                    debug!("No server in a solo game");
                }
                Some(command) => result = apply(engine, command),
            },
            Some(token) = turn_expired(armed(engine)) => {
                result = engine.expire_turn(token).map(|_| ());
            }
        }
        let events = engine.drain_events();
        if !events.is_empty() {
            on_event(engine, &events);
        }
    }

    if let Err(e) = &result {
        error!("Solo game halted: {}", e);
    }
    engine.end_game();
    result
}

/// Play a networked game until lives run out, the player quits or the server goes away
///
/// The game starts as soon as the piece queue is primed. Every exit,
/// including errors, ends the game so the server hears `DIE`.
pub async fn run_multiplayer<T, F>(
    game: &mut MultiplayerEngine<T>,
    net: &mut UnboundedReceiver<NetEvent>,
    commands: &mut UnboundedReceiver<Command>,
    mut on_event: F,
) -> Result<()>
where
    T: Transport,
    F: FnMut(&MultiplayerEngine<T>, &[GameEvent]),
{
    let result = loop {
        if game.is_finished() {
            break Ok(());
        }
        tokio::select! {
            biased;
            event = net.recv() => match event {
                Some(NetEvent::Connected) => info!("Connected to server"),
                Some(NetEvent::Message(message)) => {
                    game.handle_message(message);
                    if game.engine().state() == GameState::Idle && game.is_ready() {
                        info!("Piece queue primed, starting game");
                        if let Err(e) = game.start() {
                            break Err(e);
                        }
                    }
                }
                Some(NetEvent::Disconnected { reason }) | Some(NetEvent::Error { message: reason }) => {
                    warn!("Lost connection: {}", reason);
                    break Err(GameError::Disconnected(reason));
                }
                None => break Err(GameError::Disconnected("Connection task ended".to_string())),
            },
            command = commands.recv() => match command {
                Some(Command::Quit) | None => {
                    info!("Player quit");
                    break Ok(());
                }
                Some(Command::Chat(text)) => game.send_chat(&text),
                Some(Command::Scores) => game.request_scores(),
                Some(Command::HighScores) => game.request_highscores(),
                Some(command) => {
                    if let Err(e) = apply(game.engine_mut(), command) {
                        break Err(e);
                    }
                }
            },
            Some(token) = turn_expired(armed(game.engine())) => {
                if let Err(e) = game.engine_mut().expire_turn(token) {
                    break Err(e);
                }
            }
        }
        let events = game.engine_mut().drain_events();
        if !events.is_empty() {
            on_event(game, &events);
        }
    };

    if let Err(e) = &result {
        error!("Networked game halted: {}", e);
    }
    game.end_game();
    result
}
