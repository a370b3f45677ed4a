//! Notifications the engine emits for the presentation layer
//!
//! The engine queues [`GameEvent`]s as it changes state; whoever drives it
//! drains them with `drain_events` and reacts (redraw, play a sound, ...).
//! Outbound session effects go through [`SessionHooks`] instead, which the
//! engine calls synchronously.

use crate::highscores::ScoreRecord;
use crate::leaderboard::LeaderboardEntry;
use crate::piece::Piece;
use std::collections::BTreeSet;
use std::time::Duration;

/// A cell position on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCoordinate {
    pub x: usize,
    pub y: usize,
}

impl BlockCoordinate {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Something the presentation layer may want to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The current/following pair changed
    NextPiece { current: Piece, following: Piece },
    /// A piece was placed and scored
    Placed { x: i32, y: i32, points: u64 },
    /// These cells were part of full lines and are about to be emptied
    LinesCleared {
        lines: usize,
        blocks: BTreeSet<BlockCoordinate>,
    },
    /// A new turn started with this much time
    TurnArmed { delay: Duration },
    LevelUp { level: u32 },
    /// A turn timed out
    LifeLost { lives: u8 },
    GameOver { score: u64 },
    /// Chat text from another player
    ChatReceived { text: String },
    /// The multiplayer leaderboard was replaced
    LeaderboardUpdated { entries: Vec<LeaderboardEntry> },
    /// The online high score list arrived
    HighScoresReceived { records: Vec<ScoreRecord> },
}

/// Outbound effects of a session
///
/// Solo play uses [`NoHooks`]; networked play broadcasts to the server.
pub trait SessionHooks {
    /// Called after every scoring pass, even when nothing was scored
    fn score_changed(&mut self, _score: u64) {}

    /// Called after a timeout cost a life
    fn lives_changed(&mut self, _lives: u8) {}

    /// Called once when the session is ended
    fn session_ended(&mut self) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl SessionHooks for NoHooks {}
