//! Core game state and rules
//!
//! The [`Engine`] owns the board, the current/following pair, progression
//! and the turn timer. Which pieces arrive and who hears about score and
//! lives is pluggable: see [`PieceSource`] and [`SessionHooks`].

use crate::board::Board;
use crate::error::Result;
use crate::events::{BlockCoordinate, GameEvent, NoHooks, SessionHooks};
use crate::piece::Piece;
use crate::score::Progress;
use crate::source::{PieceSource, RandomSource};
use crate::timer::{TimerToken, TurnTimer};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Created, not started
    Idle,
    /// Turns are being played
    Running,
    /// Lives ran out
    GameOver,
    /// `end_game` was called
    Ended,
}

/// Outcome of the clearing scan after one placement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub lines: usize,
    pub blocks: BTreeSet<BlockCoordinate>,
}

/// The game rules engine
pub struct Engine<S = RandomSource, H = NoHooks> {
    board: Board,
    current: Option<Piece>,
    following: Option<Piece>,
    progress: Progress,
    state: GameState,
    timer: TurnTimer,
    source: S,
    hooks: H,
    events: Vec<GameEvent>,
}

impl Engine<RandomSource, NoHooks> {
    /// Solo game with random pieces
    pub fn single_player(cols: usize, rows: usize) -> Self {
        Self::new(cols, rows, RandomSource::new(), NoHooks)
    }

    /// Solo game with a reproducible piece sequence
    pub fn with_seed(cols: usize, rows: usize, seed: u64) -> Self {
        Self::new(cols, rows, RandomSource::with_seed(seed), NoHooks)
    }
}

impl<S: PieceSource, H: SessionHooks> Engine<S, H> {
    pub fn new(cols: usize, rows: usize, source: S, hooks: H) -> Self {
        Self {
            board: Board::new(cols, rows),
            current: None,
            following: None,
            progress: Progress::new(),
            state: GameState::Idle,
            timer: TurnTimer::new(),
            source,
            hooks,
            events: Vec::new(),
        }
    }

    /// Deal the first pair and arm the first turn
    pub fn start(&mut self) -> Result<()> {
        if self.state != GameState::Idle {
            return Ok(());
        }
        info!("Starting {}x{} game", self.board.cols(), self.board.rows());
        self.following = Some(self.source.next_piece(&self.board)?);
        self.state = GameState::Running;
        self.advance_pieces()
    }

    /// Try to play the current piece centred on `(x, y)`
    ///
    /// Returns `Ok(false)` when the piece does not fit; nothing changes and
    /// the turn keeps running.
    pub fn attempt_placement(&mut self, x: i32, y: i32) -> Result<bool> {
        if self.state != GameState::Running {
            return Ok(false);
        }
        let Some(piece) = self.current else {
            return Ok(false);
        };
        if !self.board.place(&piece, x, y) {
            debug!("{} piece does not fit at ({},{})", piece, x, y);
            return Ok(false);
        }
        debug!("Placed {} piece at ({},{})", piece, x, y);

        self.timer.disarm();
        self.advance_pieces()?;

        let cleared = self.clear_full_lines();
        let points = self.score_turn(&cleared);
        self.events.push(GameEvent::Placed { x, y, points });
        Ok(true)
    }

    /// Turn the current piece `steps` quarter turns clockwise
    pub fn rotate(&mut self, steps: u8) -> Option<Piece> {
        if self.state != GameState::Running {
            return None;
        }
        let piece = self.current.as_mut()?;
        piece.rotate(steps);
        let rotated = *piece;
        debug!("Rotated current piece to {}", rotated.rotation());
        self.notify_pieces();
        Some(rotated)
    }

    /// Exchange the current and following pieces
    pub fn swap(&mut self) -> Option<(Piece, Piece)> {
        if self.state != GameState::Running {
            return None;
        }
        std::mem::swap(&mut self.current, &mut self.following);
        self.notify_pieces();
        Some((self.current?, self.following?))
    }

    /// Fire the turn timeout if its deadline has passed at `now`
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        match self.timer.due(now) {
            Some(token) => self.expire_turn(token).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Apply a turn timeout armed with `token`
    ///
    /// Tokens from earlier turns, or any token after the game stopped, are
    /// ignored and `Ok(false)` is returned.
    pub fn expire_turn(&mut self, token: TimerToken) -> Result<bool> {
        if self.state != GameState::Running || !self.timer.is_current(token) {
            debug!("Ignoring stale turn timeout");
            return Ok(false);
        }
        self.timer.disarm();

        let lives = self.progress.lose_life();
        info!("Turn timed out, lives remaining: {}", lives);
        self.events.push(GameEvent::LifeLost { lives });
        self.hooks.lives_changed(lives);

        if lives == 0 {
            self.state = GameState::GameOver;
            self.timer.shutdown();
            info!("Game over with score {}", self.progress.score());
            self.events.push(GameEvent::GameOver {
                score: self.progress.score(),
            });
        } else {
            self.advance_pieces()?;
        }
        Ok(true)
    }

    /// Stop the game for good; later timeouts are no-ops
    pub fn end_game(&mut self) {
        if self.state == GameState::Ended {
            return;
        }
        info!("Ending game at score {}", self.progress.score());
        self.timer.shutdown();
        self.state = GameState::Ended;
        self.hooks.session_ended();
    }

    /// Seed the high score from saved history
    pub fn set_highscore(&mut self, highscore: u64) {
        self.progress.seed_highscore(highscore);
    }

    /// Take all notifications queued since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn current_piece(&self) -> Option<Piece> {
        self.current
    }

    pub fn following_piece(&self) -> Option<Piece> {
        self.following
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn score(&self) -> u64 {
        self.progress.score()
    }

    pub fn level(&self) -> u32 {
        self.progress.level()
    }

    pub fn lives(&self) -> u8 {
        self.progress.lives()
    }

    pub fn multiplier(&self) -> u64 {
        self.progress.multiplier()
    }

    pub fn highscore(&self) -> u64 {
        self.progress.highscore()
    }

    /// Time allowed per turn at the current level
    pub fn turn_delay(&self) -> Duration {
        self.progress.turn_delay()
    }

    /// When the pending turn times out
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn armed_token(&self) -> Option<TimerToken> {
        self.timer.token()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// current <- following, following <- fresh draw, then re-arm
    fn advance_pieces(&mut self) -> Result<()> {
        let drawn = self.source.next_piece(&self.board)?;
        self.current = self.following.replace(drawn);
        self.notify_pieces();

        let delay = self.progress.turn_delay();
        if self.timer.arm(Instant::now(), delay).is_some() {
            debug!("Turn armed for {}ms", delay.as_millis());
            self.events.push(GameEvent::TurnArmed { delay });
        }
        Ok(())
    }

    fn notify_pieces(&mut self) {
        if let (Some(current), Some(following)) = (self.current, self.following) {
            self.events.push(GameEvent::NextPiece { current, following });
        }
    }

    /// Find every full row and column and empty their cells
    fn clear_full_lines(&mut self) -> ClearResult {
        let (cols, rows) = (self.board.cols(), self.board.rows());
        let filled = |board: &Board, x: usize, y: usize| {
            board.get(x as i32, y as i32).is_some_and(|value| value != 0)
        };

        let mut result = ClearResult::default();
        for y in 0..rows {
            if (0..cols).all(|x| filled(&self.board, x, y)) {
                result.lines += 1;
                result
                    .blocks
                    .extend((0..cols).map(|x| BlockCoordinate::new(x, y)));
            }
        }
        for x in 0..cols {
            if (0..rows).all(|y| filled(&self.board, x, y)) {
                result.lines += 1;
                result
                    .blocks
                    .extend((0..rows).map(|y| BlockCoordinate::new(x, y)));
            }
        }

        if !result.blocks.is_empty() {
            self.events.push(GameEvent::LinesCleared {
                lines: result.lines,
                blocks: result.blocks.clone(),
            });
            for block in &result.blocks {
                self.board.set(block.x as i32, block.y as i32, 0);
            }
        }
        info!(
            "{} blocks cleared and {} lines cleared",
            result.blocks.len(),
            result.lines
        );
        result
    }

    fn score_turn(&mut self, cleared: &ClearResult) -> u64 {
        let delta = self.progress.apply_clear(cleared.lines, cleared.blocks.len());
        if delta.new_highscore {
            debug!("New high score {}", self.progress.highscore());
        }
        if delta.levels_gained > 0 {
            info!("Level up to {}", self.progress.level());
            self.events.push(GameEvent::LevelUp {
                level: self.progress.level(),
            });
        }
        self.hooks.score_changed(self.progress.score());
        delta.points
    }
}
