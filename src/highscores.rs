//! High score records
//!
//! A record is one `name:score` line. The same format is used for the local
//! scores file and for online `HISCORE`/`HISCORES` messages.

use crate::error::{ProtocolError, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Maximum number of local high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single `name:score` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u64,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, score: u64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl FromStr for ScoreRecord {
    type Err = ProtocolError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || ProtocolError::MalformedRecord(line.to_string());
        let (name, score) = line.trim().split_once(':').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }
        let score = score.trim().parse().map_err(|_| malformed())?;
        Ok(Self::new(name, score))
    }
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.score)
    }
}

/// Parse newline-separated records, skipping blank and malformed lines
pub fn parse_records(text: &str) -> Vec<ScoreRecord> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.parse() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping score record: {}", e);
                None
            }
        })
        .collect()
}

/// Top scores, sorted descending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    entries: Vec<ScoreRecord>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ten `Default:0` entries, the table written when no file exists yet
    pub fn with_defaults() -> Self {
        Self {
            entries: (0..MAX_HIGH_SCORES)
                .map(|_| ScoreRecord::new("Default", 0))
                .collect(),
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = ScoreRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.entries.push(record);
        }
        table.entries.sort_by(|a, b| b.score.cmp(&a.score));
        table.entries.truncate(MAX_HIGH_SCORES);
        table
    }

    /// Load from `path`, creating it with defaults if missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Scores file {} does not exist, writing defaults", path.display());
            let table = Self::with_defaults();
            table.save(path)?;
            return Ok(table);
        }
        let text = fs::read_to_string(path)?;
        Ok(Self::from_records(parse_records(&text)))
    }

    /// Write one record per line
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_string())?;
        info!("Wrote {} high scores to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Check if a score would make the table
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a score if it qualifies, returning its 1-indexed rank
    pub fn add(&mut self, record: ScoreRecord) -> Option<usize> {
        if !self.qualifies(record.score) {
            return None;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| record.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, record);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    /// Best score in the table, 0 if empty
    pub fn best(&self) -> u64 {
        self.entries.first().map(|e| e.score).unwrap_or(0)
    }

    pub fn entries(&self) -> &[ScoreRecord] {
        &self.entries
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.entries {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("gridfall-test-{}-{}", std::process::id(), tag))
            .join("scores.txt")
    }

    #[test]
    fn test_record_format() {
        let record: ScoreRecord = "alice:1500".parse().unwrap();
        assert_eq!(record, ScoreRecord::new("alice", 1500));
        assert_eq!(record.to_string(), "alice:1500");
        assert!("alice".parse::<ScoreRecord>().is_err());
        assert!("alice:lots".parse::<ScoreRecord>().is_err());
    }

    #[test]
    fn test_parse_records_skips_bad_lines() {
        let records = parse_records("a:30\nbroken\n\nb:10\nc:x\n");
        assert_eq!(records, vec![ScoreRecord::new("a", 30), ScoreRecord::new("b", 10)]);
    }

    #[test]
    fn test_add_keeps_order_and_cap() {
        let mut table = ScoreTable::with_defaults();
        assert!(!table.qualifies(0));
        assert_eq!(table.add(ScoreRecord::new("x", 200)), Some(1));
        assert_eq!(table.add(ScoreRecord::new("y", 100)), Some(2));
        assert_eq!(table.add(ScoreRecord::new("z", 300)), Some(1));
        assert_eq!(table.entries().len(), MAX_HIGH_SCORES);
        assert_eq!(table.best(), 300);
        assert_eq!(table.entries()[2].name, "y");
    }

    #[test]
    fn test_load_creates_defaults_then_round_trips() {
        let path = temp_path("scores");
        let _ = fs::remove_file(&path);

        let table = ScoreTable::load_or_create(&path).unwrap();
        assert_eq!(table, ScoreTable::with_defaults());
        assert!(path.exists());

        let mut table = table;
        table.add(ScoreRecord::new("alice", 420));
        table.save(&path).unwrap();

        let loaded = ScoreTable::load_or_create(&path).unwrap();
        assert_eq!(loaded.best(), 420);
        assert_eq!(loaded, table);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
