//! Score, level, lives and multiplier progression

use std::time::Duration;

/// Lives at the start of a game
pub const STARTING_LIVES: u8 = 3;
/// Points between level thresholds
pub const LEVEL_STEP: u64 = 1000;
/// Points per cleared block per line, before the multiplier
pub const POINTS_PER_BLOCK: u64 = 10;

const BASE_DELAY_MS: u64 = 12_000;
const MIN_DELAY_MS: u64 = 2_500;
const DELAY_STEP_MS: u64 = 500;

/// Result of scoring one placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreDelta {
    /// Points added this turn
    pub points: u64,
    /// Levels gained this turn
    pub levels_gained: u32,
    /// Whether the high score moved
    pub new_highscore: bool,
}

/// Progression state for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub(crate) score: u64,
    pub(crate) level: u32,
    pub(crate) lives: u8,
    pub(crate) multiplier: u64,
    pub(crate) highscore: u64,
    /// Next score the player must exceed to level up
    next_threshold: u64,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        Self {
            score: 0,
            level: 0,
            lives: STARTING_LIVES,
            multiplier: 1,
            highscore: 0,
            next_threshold: LEVEL_STEP,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn highscore(&self) -> u64 {
        self.highscore
    }

    /// Raise the high score to at least `highscore` (bootstrap from history)
    pub fn seed_highscore(&mut self, highscore: u64) {
        self.highscore = self.highscore.max(highscore);
    }

    /// Apply the outcome of one placement
    ///
    /// The multiplier used for the points is the one held before this turn;
    /// it is updated afterwards.
    pub fn apply_clear(&mut self, lines: usize, blocks: usize) -> ScoreDelta {
        let points = lines as u64 * blocks as u64 * POINTS_PER_BLOCK * self.multiplier;
        self.score += points;

        let new_highscore = self.score > self.highscore;
        self.highscore = self.highscore.max(self.score);

        let mut levels_gained = 0;
        while self.score > self.next_threshold {
            self.level += 1;
            self.next_threshold += LEVEL_STEP;
            levels_gained += 1;
        }

        if lines > 0 {
            self.multiplier += 1;
        } else {
            self.multiplier = 1;
        }

        ScoreDelta {
            points,
            levels_gained,
            new_highscore,
        }
    }

    /// Lose a life to a turn timeout, returning the lives left
    pub fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        if self.lives > 0 {
            self.multiplier = 1;
        }
        self.lives
    }

    /// Time allowed for the current turn
    pub fn turn_delay(&self) -> Duration {
        turn_delay(self.level)
    }
}

/// `max(2500, 12000 - 500 * level)` milliseconds
pub fn turn_delay(level: u32) -> Duration {
    let reduction = DELAY_STEP_MS.saturating_mul(level as u64);
    let millis = BASE_DELAY_MS.saturating_sub(reduction).max(MIN_DELAY_MS);
    Duration::from_millis(millis)
}
