//! Plain-text rendering for the terminal front end

use crate::board::Board;
use crate::engine::Engine;
use crate::events::{GameEvent, SessionHooks};
use crate::leaderboard::Leaderboard;
use crate::piece::{MASK_SIZE, Piece};
use crate::source::PieceSource;
use std::fmt::Write;

const EMPTY_CELL: &str = ". ";

fn cell(value: u8) -> String {
    if value == 0 {
        EMPTY_CELL.to_string()
    } else {
        format!("{:X} ", value)
    }
}

/// Board grid with column and row indices
pub fn render_board(board: &Board) -> String {
    let mut out = String::from("   ");
    for x in 0..board.cols() {
        let _ = write!(out, "{:<2}", x % 100);
    }
    out.push('\n');
    for (y, row) in board.rows_iter().enumerate() {
        let _ = write!(out, "{:>2} ", y);
        for &value in row {
            out.push_str(&cell(value));
        }
        out.push('\n');
    }
    out
}

/// 3x3 preview of a piece, centre cell in the middle
pub fn render_piece(piece: &Piece) -> String {
    let mask = piece.mask();
    let mut out = String::new();
    for dy in 0..MASK_SIZE {
        for column in &mask {
            out.push_str(&cell(column[dy]));
        }
        out.push('\n');
    }
    out
}

/// Board, stats and the current/following pair
pub fn render_game<S: PieceSource, H: SessionHooks>(engine: &Engine<S, H>) -> String {
    let mut out = render_board(engine.board());
    let _ = writeln!(
        out,
        "Score: {}  Level: {}  Lives: {}  x{}  Best: {}",
        engine.score(),
        engine.level(),
        engine.lives(),
        engine.multiplier(),
        engine.highscore()
    );
    if let (Some(current), Some(following)) = (engine.current_piece(), engine.following_piece()) {
        let _ = writeln!(out, "Current: {}    Next: {}", current, following);
        let current = render_piece(&current);
        let following = render_piece(&following);
        for (left, right) in current.lines().zip(following.lines()) {
            let _ = writeln!(out, "  {}      {}", left, right);
        }
    }
    out
}

/// Top of the leaderboard, one player per line
pub fn render_leaderboard(leaderboard: &Leaderboard) -> String {
    let mut out = String::from("Leaderboard\n");
    for (rank, entry) in leaderboard.top().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<16} {:>8}  {}",
            rank + 1,
            entry.name,
            entry.score,
            entry.status
        );
    }
    out
}

/// One-line message for events worth telling the player about
pub fn describe_event(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::LinesCleared { lines, blocks } => {
            Some(format!("Cleared {} lines ({} blocks)", lines, blocks.len()))
        }
        GameEvent::LevelUp { level } => Some(format!("Level up! Now level {}", level)),
        GameEvent::LifeLost { lives } => Some(format!("Too slow! {} lives left", lives)),
        GameEvent::GameOver { score } => Some(format!("GAME OVER - final score {}", score)),
        GameEvent::ChatReceived { text } => Some(format!("[chat] {}", text)),
        GameEvent::HighScoresReceived { records } => {
            let mut out = String::from("Online high scores\n");
            for record in records {
                let _ = writeln!(out, "  {}", record);
            }
            Some(out)
        }
        // The leaderboard is drawn from the multiplayer engine's own copy
        GameEvent::NextPiece { .. }
        | GameEvent::Placed { .. }
        | GameEvent::TurnArmed { .. }
        | GameEvent::LeaderboardUpdated { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{DISPLAY_LIMIT, LeaderboardEntry, PlayerStatus};
    use crate::piece::PieceKind;

    #[test]
    fn test_render_board_marks_cells() {
        let mut board = Board::new(3, 2);
        board.set(1, 0, 15);
        let text = render_board(&board);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], " 0 . F . ");
        assert_eq!(lines[2], " 1 . . . ");
    }

    #[test]
    fn test_render_piece_line_is_vertical() {
        let text = render_piece(&Piece::new(PieceKind::Line));
        assert_eq!(text, ". 1 . \n. 1 . \n. 1 . \n");
    }

    #[test]
    fn test_leaderboard_is_capped() {
        let entries: Vec<_> = (0..12)
            .map(|i| LeaderboardEntry {
                name: format!("p{}", i),
                score: 100 - i,
                status: PlayerStatus::Alive(3),
            })
            .collect();
        let mut leaderboard = Leaderboard::new();
        leaderboard.replace(entries);
        let text = render_leaderboard(&leaderboard);
        assert_eq!(text.lines().count(), 1 + DISPLAY_LIMIT);
        assert!(text.contains("p0"));
        assert!(!text.contains("p11"));
    }

    #[test]
    fn test_quiet_events_have_no_message() {
        assert_eq!(describe_event(&GameEvent::Placed { x: 0, y: 0, points: 0 }), None);
        assert_eq!(
            describe_event(&GameEvent::LifeLost { lives: 1 }).as_deref(),
            Some("Too slow! 1 lives left")
        );
    }
}
