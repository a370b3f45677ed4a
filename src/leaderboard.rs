//! Live multiplayer leaderboard

use crate::error::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// How many entries a display should show
pub const DISPLAY_LIMIT: usize = 10;

/// Lives column of a leaderboard record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Alive(u8),
    Dead,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerStatus::Alive(lives) => write!(f, "{}", lives),
            PlayerStatus::Dead => f.write_str("DEAD"),
        }
    }
}

/// One `name:score:lives` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    pub status: PlayerStatus,
}

impl FromStr for LeaderboardEntry {
    type Err = ProtocolError;

    fn from_str(record: &str) -> Result<Self, Self::Err> {
        let malformed = || ProtocolError::MalformedRecord(record.to_string());
        let mut parts = record.trim().split(':');
        let (Some(name), Some(score), Some(lives), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if name.is_empty() {
            return Err(malformed());
        }
        let score = score.trim().parse().map_err(|_| malformed())?;
        let status = match lives.trim() {
            "DEAD" => PlayerStatus::Dead,
            other => PlayerStatus::Alive(other.parse().map_err(|_| malformed())?),
        };
        Ok(Self {
            name: name.to_string(),
            score,
            status,
        })
    }
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.score, self.status)
    }
}

/// Participants ordered by descending score
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with `entries`, keeping the list sorted after each insert
    pub fn replace(&mut self, entries: impl IntoIterator<Item = LeaderboardEntry>) {
        self.entries.clear();
        for entry in entries {
            self.insert(entry);
        }
    }

    /// Insert or update the entry for `entry.name`
    pub fn insert(&mut self, entry: LeaderboardEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// The first `DISPLAY_LIMIT` entries
    pub fn top(&self) -> &[LeaderboardEntry] {
        &self.entries[..self.entries.len().min(DISPLAY_LIMIT)]
    }

    pub fn get(&self, name: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
