//! GRIDFALL - a grid placement block puzzle
//!
//! Place pieces on a small board before the turn timer runs out. Full rows
//! and columns clear for points; run out of time too often and the game is
//! over. Solo play draws random pieces; networked play shares one piece
//! sequence across every player on a server.

pub mod board;
pub mod engine;
pub mod error;
pub mod events;
pub mod highscores;
pub mod leaderboard;
pub mod multiplayer;
pub mod net;
pub mod piece;
pub mod protocol;
pub mod score;
pub mod session;
pub mod settings;
pub mod source;
pub mod timer;
pub mod ui;

pub use board::Board;
pub use engine::{ClearResult, Engine, GameState};
pub use error::{GameError, ProtocolError, Result};
pub use events::{BlockCoordinate, GameEvent, NoHooks, SessionHooks};
pub use multiplayer::MultiplayerEngine;
pub use piece::{Piece, PieceKind};
pub use source::{FixedSource, PieceSource, RandomSource};
