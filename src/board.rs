//! Game board representation and placement checks

use crate::piece::Piece;

/// Default board dimensions
pub const DEFAULT_COLS: usize = 5;
pub const DEFAULT_ROWS: usize = 5;

/// Largest colour index a cell may hold
pub const MAX_CELL_VALUE: u8 = 15;

/// The game board: `cols x rows` cells, `0` empty, `1..=15` a colour index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cols: usize,
    rows: usize,
    /// Row-major: index is `y * cols + x`
    cells: Vec<u8>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_COLS, DEFAULT_ROWS)
    }
}

impl Board {
    /// Create a new empty board
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.cols || y >= self.rows {
            return None;
        }
        Some(y * self.cols + x)
    }

    /// Get the cell at column `x`, row `y`
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Set a cell, clamping the value to the colour range
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, value: u8) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = value.min(MAX_CELL_VALUE);
                true
            }
            None => false,
        }
    }

    /// Check whether `piece`, centred on `(x, y)`, fits on empty in-bounds cells
    pub fn can_place(&self, piece: &Piece, x: i32, y: i32) -> bool {
        piece
            .blocks()
            .all(|(dx, dy, _)| self.get(x + dx, y + dy) == Some(0))
    }

    /// Write `piece` onto the board centred on `(x, y)`
    /// Returns false and leaves the board untouched if it does not fit
    pub fn place(&mut self, piece: &Piece, x: i32, y: i32) -> bool {
        if !self.can_place(piece, x, y) {
            return false;
        }
        for (dx, dy, value) in piece.blocks() {
            self.set(x + dx, y + dy, value);
        }
        true
    }

    /// All cell values in row-major order
    pub fn snapshot(&self) -> &[u8] {
        &self.cells
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&cell| cell == 0)
    }

    /// Get an iterator over rows, top to bottom
    pub fn rows_iter(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.cols.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceKind;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(5, 5);
        assert!(board.is_empty());
        assert_eq!(board.snapshot().len(), 25);
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::new(5, 4);
        assert!(board.set(4, 3, 7));
        assert_eq!(board.get(4, 3), Some(7));
        assert_eq!(board.snapshot()[3 * 5 + 4], 7);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut board = Board::new(5, 5);
        assert_eq!(board.get(-1, 0), None);
        assert_eq!(board.get(0, -1), None);
        assert_eq!(board.get(5, 0), None);
        assert_eq!(board.get(0, 5), None);
        assert!(!board.set(5, 5, 1));
        assert!(board.is_empty());
    }

    #[test]
    fn test_can_place_matches_cell_rule() {
        let mut board = Board::new(5, 5);
        board.set(0, 0, 9);
        for kind in PieceKind::all() {
            for rotation in 0..4 {
                let piece = Piece::new(kind).rotated(rotation);
                for x in -2..7 {
                    for y in -2..7 {
                        let expected = piece
                            .blocks()
                            .all(|(dx, dy, _)| board.get(x + dx, y + dy) == Some(0));
                        assert_eq!(board.can_place(&piece, x, y), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_sparse_mask_ignores_empty_cells() {
        // X leaves the edge midpoints free, so an occupied midpoint is no conflict
        let mut board = Board::new(5, 5);
        board.set(2, 1, 4);
        assert!(board.can_place(&Piece::new(PieceKind::X), 2, 2));
    }

    #[test]
    fn test_place_at_edge_fails_when_mask_hangs_off() {
        let mut board = Board::new(5, 5);
        let square = Piece::new(PieceKind::Square);
        // Square covers dx,dy in -1..=0, so (0, 0) puts blocks at -1
        assert!(!board.place(&square, 0, 0));
        assert!(board.is_empty());
        assert!(board.place(&square, 1, 1));
        assert_eq!(board.get(0, 0), Some(PieceKind::Square.value()));
    }

    #[test]
    fn test_place_is_noop_when_blocked() {
        let mut board = Board::new(5, 5);
        board.set(2, 2, 1);
        let before = board.clone();
        assert!(!board.place(&Piece::new(PieceKind::Plus), 2, 2));
        assert_eq!(board, before);
    }

    #[test]
    fn test_place_line_in_centre() {
        let mut board = Board::new(5, 5);
        let line = Piece::new(PieceKind::Line);
        assert!(board.place(&line, 2, 2));
        for y in 1..=3 {
            assert_eq!(board.get(2, y), Some(1));
        }
        assert_eq!(board.get(1, 2), Some(0));
        assert_eq!(board.get(3, 2), Some(0));
        assert!(!board.can_place(&Piece::new(PieceKind::Dot), 2, 2));
        assert!(board.can_place(&Piece::new(PieceKind::Dot), 1, 2));
    }
}
