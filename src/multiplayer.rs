//! Networked play on top of the core engine
//!
//! All players draw from the same server-issued piece sequence. Every draw
//! sends a board snapshot and asks for exactly one replacement piece, so the
//! queue holds steady at [`QUEUE_DEPTH`] once primed. Score and lives changes
//! are broadcast as they happen.

use crate::board::Board;
use crate::engine::{Engine, GameState};
use crate::error::{GameError, Result};
use crate::events::{GameEvent, SessionHooks};
use crate::highscores::ScoreRecord;
use crate::leaderboard::Leaderboard;
use crate::piece::Piece;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::source::PieceSource;
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

/// Pieces requested up front, and the steady-state queue depth
pub const QUEUE_DEPTH: usize = 4;

/// Outbound half of a server connection
pub trait Transport {
    fn send(&self, message: ClientMessage);
}

impl Transport for tokio::sync::mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, message: ClientMessage) {
        if let Err(e) = tokio::sync::mpsc::UnboundedSender::send(self, message) {
            debug!("Dropping outbound message, connection closed: {}", e.0);
        }
    }
}

/// Pieces pulled from the server queue
#[derive(Debug)]
pub struct NetworkSource<T> {
    transport: T,
    queue: VecDeque<Piece>,
}

impl<T: Transport> NetworkSource<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            queue: VecDeque::with_capacity(QUEUE_DEPTH),
        }
    }

    /// Append a piece received from the server
    pub fn enqueue(&mut self, piece: Piece) {
        debug!("Enqueueing {} piece", piece);
        self.queue.push_back(piece);
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl<T: Transport> PieceSource for NetworkSource<T> {
    fn next_piece(&mut self, board: &Board) -> Result<Piece> {
        self.transport
            .send(ClientMessage::Board(board.snapshot().to_vec()));
        self.transport.send(ClientMessage::RequestPiece);
        match self.queue.pop_front() {
            Some(piece) => {
                debug!("Dequeued {} piece, {} left", piece, self.queue.len());
                Ok(piece)
            }
            None => {
                error!("Piece queue underflow");
                Err(GameError::QueueUnderflow)
            }
        }
    }
}

/// Session hooks that report to the server
#[derive(Debug)]
pub struct Broadcaster<T> {
    transport: T,
}

impl<T: Transport> Broadcaster<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> SessionHooks for Broadcaster<T> {
    fn score_changed(&mut self, score: u64) {
        self.transport.send(ClientMessage::Score(score));
    }

    fn lives_changed(&mut self, lives: u8) {
        self.transport.send(ClientMessage::Lives(lives));
    }

    fn session_ended(&mut self) {
        self.transport.send(ClientMessage::Die);
    }
}

/// Engine wired to a server: shared pieces, leaderboard, chat
pub struct MultiplayerEngine<T> {
    engine: Engine<NetworkSource<T>, Broadcaster<T>>,
    leaderboard: Leaderboard,
    transport: T,
}

impl<T: Transport + Clone> MultiplayerEngine<T> {
    /// Create the engine and prime the piece queue and leaderboard
    pub fn new(cols: usize, rows: usize, transport: T) -> Self {
        let engine = Engine::new(
            cols,
            rows,
            NetworkSource::new(transport.clone()),
            Broadcaster::new(transport.clone()),
        );
        info!("Requesting {} initial pieces", QUEUE_DEPTH);
        for _ in 0..QUEUE_DEPTH {
            transport.send(ClientMessage::RequestPiece);
        }
        transport.send(ClientMessage::RequestScores);
        Self {
            engine,
            leaderboard: Leaderboard::new(),
            transport,
        }
    }
}

impl<T: Transport> MultiplayerEngine<T> {
    /// Whether the primed queue is full and the first turn can be dealt
    pub fn is_ready(&self) -> bool {
        self.engine.source().queued() >= QUEUE_DEPTH
    }

    /// Start the first turn; the queue must be primed
    pub fn start(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Err(GameError::NotReady {
                queued: self.engine.source().queued(),
                required: QUEUE_DEPTH,
            });
        }
        self.engine.start()
    }

    /// Apply one inbound server message, in arrival order
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Piece(kind) => {
                self.engine.source_mut().enqueue(Piece::new(kind));
            }
            ServerMessage::Scores(entries) => {
                self.leaderboard.replace(entries);
                debug!("Leaderboard now has {} entries", self.leaderboard.len());
                self.engine.emit(GameEvent::LeaderboardUpdated {
                    entries: self.leaderboard.entries().to_vec(),
                });
            }
            ServerMessage::Chat(text) => {
                self.engine.emit(GameEvent::ChatReceived { text });
            }
            ServerMessage::HighScores(records) => {
                debug!("Received {} online high scores", records.len());
                self.engine.emit(GameEvent::HighScoresReceived { records });
            }
        }
    }

    /// Parse and apply one raw inbound message; malformed ones are logged and dropped
    pub fn handle_line(&mut self, line: &str) {
        match line.parse() {
            Ok(message) => self.handle_message(message),
            Err(e) => warn!("Ignoring server message: {}", e),
        }
    }

    pub fn send_chat(&self, text: &str) {
        self.transport.send(ClientMessage::Chat(text.to_string()));
    }

    pub fn request_scores(&self) {
        self.transport.send(ClientMessage::RequestScores);
    }

    /// Submit a finished score to the online high score list
    pub fn submit_highscore(&self, name: &str) {
        let record = ScoreRecord::new(name, self.engine.score());
        info!("Submitting online high score {}", record);
        self.transport.send(ClientMessage::SubmitHighScore(record));
    }

    pub fn request_highscores(&self) {
        self.transport.send(ClientMessage::RequestHighScores);
    }

    /// End the game and leave the session
    pub fn end_game(&mut self) {
        self.engine.end_game();
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.engine.state(), GameState::GameOver | GameState::Ended)
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn queued(&self) -> usize {
        self.engine.source().queued()
    }

    pub fn engine(&self) -> &Engine<NetworkSource<T>, Broadcaster<T>> {
        &self.engine
    }

    /// Placement, rotation, swap and ticking go straight to the engine
    pub fn engine_mut(&mut self) -> &mut Engine<NetworkSource<T>, Broadcaster<T>> {
        &mut self.engine
    }
}
