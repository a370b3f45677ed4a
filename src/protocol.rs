//! Text wire protocol spoken with the game server
//!
//! Every message is a command word, optionally followed by a space and a
//! payload. Multi-record payloads (`SCORES`, `HISCORES`) put one record per
//! line.

use crate::error::ProtocolError;
use crate::highscores::{ScoreRecord, parse_records};
use crate::leaderboard::LeaderboardEntry;
use crate::piece::PieceKind;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Messages we send to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Ask for one more piece
    RequestPiece,
    /// Ask for the live leaderboard
    RequestScores,
    Score(u64),
    Lives(u8),
    /// Full board snapshot, row-major
    Board(Vec<u8>),
    Chat(String),
    /// Leave the session
    Die,
    SubmitHighScore(ScoreRecord),
    RequestHighScores,
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::RequestPiece => f.write_str("PIECE"),
            ClientMessage::RequestScores => f.write_str("SCORES"),
            ClientMessage::Score(score) => write!(f, "SCORE {}", score),
            ClientMessage::Lives(lives) => write!(f, "LIVES {}", lives),
            ClientMessage::Board(cells) => {
                f.write_str("BOARD ")?;
                for value in cells {
                    write!(f, "{} ", value)?;
                }
                Ok(())
            }
            ClientMessage::Chat(text) => write!(f, "MSG {}", text),
            ClientMessage::Die => f.write_str("DIE"),
            ClientMessage::SubmitHighScore(record) => write!(f, "HISCORE {}", record),
            ClientMessage::RequestHighScores => f.write_str("HISCORES"),
        }
    }
}

/// Messages the server sends us
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// The next piece in the shared sequence
    Piece(PieceKind),
    /// Full leaderboard; malformed records already dropped
    Scores(Vec<LeaderboardEntry>),
    /// Chat text, with the command word stripped
    Chat(String),
    /// Online high score list
    HighScores(Vec<ScoreRecord>),
}

/// Split `COMMAND payload` at the first space or newline
fn split_command(message: &str) -> (&str, &str) {
    match message.find([' ', '\n']) {
        Some(at) => (&message[..at], &message[at + 1..]),
        None => (message, ""),
    }
}

fn parse_leaderboard(payload: &str) -> Vec<LeaderboardEntry> {
    payload
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.parse() {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping leaderboard record: {}", e);
                None
            }
        })
        .collect()
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    fn from_str(message: &str) -> Result<Self, Self::Err> {
        let message = message.trim_end_matches(['\r', '\n']);
        if message.trim().is_empty() {
            return Err(ProtocolError::Empty);
        }
        let (command, payload) = split_command(message);
        match command {
            "PIECE" => {
                let id = payload.trim();
                id.parse::<u8>()
                    .ok()
                    .and_then(PieceKind::from_id)
                    .map(ServerMessage::Piece)
                    .ok_or_else(|| ProtocolError::InvalidPiece(id.to_string()))
            }
            "SCORES" => Ok(ServerMessage::Scores(parse_leaderboard(payload))),
            "MSG" => Ok(ServerMessage::Chat(payload.to_string())),
            "HISCORES" => Ok(ServerMessage::HighScores(parse_records(payload))),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::PlayerStatus;

    #[test]
    fn test_encode_requests() {
        assert_eq!(ClientMessage::RequestPiece.to_string(), "PIECE");
        assert_eq!(ClientMessage::RequestScores.to_string(), "SCORES");
        assert_eq!(ClientMessage::Score(150).to_string(), "SCORE 150");
        assert_eq!(ClientMessage::Lives(2).to_string(), "LIVES 2");
        assert_eq!(ClientMessage::Die.to_string(), "DIE");
        assert_eq!(ClientMessage::Chat("hi all".into()).to_string(), "MSG hi all");
    }

    #[test]
    fn test_encode_board_has_trailing_space() {
        let message = ClientMessage::Board(vec![0, 3, 15, 0]);
        assert_eq!(message.to_string(), "BOARD 0 3 15 0 ");
    }

    #[test]
    fn test_encode_high_scores() {
        let submit = ClientMessage::SubmitHighScore(ScoreRecord::new("alice", 900));
        assert_eq!(submit.to_string(), "HISCORE alice:900");
        assert_eq!(ClientMessage::RequestHighScores.to_string(), "HISCORES");
    }

    #[test]
    fn test_parse_piece() {
        assert_eq!(
            "PIECE 4".parse::<ServerMessage>().unwrap(),
            ServerMessage::Piece(PieceKind::Square)
        );
        assert_eq!(
            "PIECE 15".parse::<ServerMessage>(),
            Err(ProtocolError::InvalidPiece("15".into()))
        );
        assert!("PIECE".parse::<ServerMessage>().is_err());
    }

    #[test]
    fn test_parse_scores_skips_bad_records() {
        let message: ServerMessage = "SCORES alice:100:3\nbroken\nbob:250:DEAD\n"
            .parse()
            .unwrap();
        let ServerMessage::Scores(entries) = message else {
            panic!("expected scores");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "alice");
        assert_eq!(entries[1].status, PlayerStatus::Dead);
    }

    #[test]
    fn test_parse_chat_strips_command_only() {
        assert_eq!(
            "MSG bob:good game".parse::<ServerMessage>().unwrap(),
            ServerMessage::Chat("bob:good game".into())
        );
    }

    #[test]
    fn test_parse_high_scores() {
        let message: ServerMessage = "HISCORES a:30\nb:20".parse().unwrap();
        assert_eq!(
            message,
            ServerMessage::HighScores(vec![ScoreRecord::new("a", 30), ScoreRecord::new("b", 20)])
        );
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert_eq!(
            "USERS a b".parse::<ServerMessage>(),
            Err(ProtocolError::UnknownCommand("USERS".into()))
        );
        assert_eq!("  ".parse::<ServerMessage>(), Err(ProtocolError::Empty));
    }
}
