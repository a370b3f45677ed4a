//! Piece catalog and rotation
//!
//! Every piece is a 3x3 mask placed by its centre cell. Masks are indexed
//! `[dx][dy]` with `[1][1]` as the centre, x increasing rightward and y
//! increasing downward, matching board coordinates.

use std::fmt;

/// Size of every piece mask along each axis
pub const MASK_SIZE: usize = 3;

/// A 3x3 occupancy mask, indexed `[dx][dy]`
pub type Mask = [[u8; MASK_SIZE]; MASK_SIZE];

/// The 15 piece shapes, in wire identifier order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Line,
    C,
    Plus,
    Dot,
    Square,
    L,
    J,
    S,
    Z,
    T,
    X,
    Corner,
    InverseCorner,
    Double,
    Triple,
}

impl PieceKind {
    /// Number of shapes in the catalog
    pub const COUNT: usize = 15;

    /// Get all piece kinds in identifier order
    pub fn all() -> [PieceKind; Self::COUNT] {
        [
            PieceKind::Line,
            PieceKind::C,
            PieceKind::Plus,
            PieceKind::Dot,
            PieceKind::Square,
            PieceKind::L,
            PieceKind::J,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::T,
            PieceKind::X,
            PieceKind::Corner,
            PieceKind::InverseCorner,
            PieceKind::Double,
            PieceKind::Triple,
        ]
    }

    /// Look up a kind by its wire identifier (`0..15`)
    pub fn from_id(id: u8) -> Option<PieceKind> {
        Self::all().get(id as usize).copied()
    }

    /// Wire identifier
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Colour index written into the board, always `1..=15`
    pub fn value(self) -> u8 {
        self.id() + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Line => "Line",
            PieceKind::C => "C",
            PieceKind::Plus => "Plus",
            PieceKind::Dot => "Dot",
            PieceKind::Square => "Square",
            PieceKind::L => "L",
            PieceKind::J => "J",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::T => "T",
            PieceKind::X => "X",
            PieceKind::Corner => "Corner",
            PieceKind::InverseCorner => "Inverse Corner",
            PieceKind::Double => "Double",
            PieceKind::Triple => "Triple",
        }
    }

    /// Unrotated occupancy (1 = block), indexed `[dx][dy]`
    fn template(self) -> Mask {
        match self {
            PieceKind::Line => [[0, 0, 0], [1, 1, 1], [0, 0, 0]],
            PieceKind::C => [[0, 0, 0], [1, 1, 1], [1, 0, 1]],
            PieceKind::Plus => [[0, 1, 0], [1, 1, 1], [0, 1, 0]],
            PieceKind::Dot => [[0, 0, 0], [0, 1, 0], [0, 0, 0]],
            PieceKind::Square => [[1, 1, 0], [1, 1, 0], [0, 0, 0]],
            PieceKind::L => [[0, 0, 0], [1, 1, 1], [0, 0, 1]],
            PieceKind::J => [[0, 0, 1], [1, 1, 1], [0, 0, 0]],
            PieceKind::S => [[0, 1, 0], [1, 1, 0], [1, 0, 0]],
            PieceKind::Z => [[0, 1, 0], [0, 1, 1], [0, 0, 1]],
            PieceKind::T => [[1, 0, 0], [1, 1, 0], [1, 0, 0]],
            PieceKind::X => [[1, 0, 1], [0, 1, 0], [1, 0, 1]],
            PieceKind::Corner => [[0, 0, 0], [1, 1, 0], [1, 0, 0]],
            PieceKind::InverseCorner => [[1, 0, 0], [1, 1, 0], [0, 0, 0]],
            PieceKind::Double => [[0, 1, 0], [0, 1, 0], [0, 0, 0]],
            PieceKind::Triple => [[0, 1, 0], [0, 1, 0], [0, 1, 0]],
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rotate a mask 90 degrees clockwise
fn rotate_cw(mask: &Mask) -> Mask {
    let mut rotated = [[0; MASK_SIZE]; MASK_SIZE];
    for (dx, column) in mask.iter().enumerate() {
        for (dy, &value) in column.iter().enumerate() {
            rotated[MASK_SIZE - 1 - dy][dx] = value;
        }
    }
    rotated
}

/// A playable piece: a shape plus its rotation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: PieceKind,
    /// Quarter turns clockwise, `0..4`
    rotation: u8,
}

impl Piece {
    /// Create a piece in its spawn orientation
    pub fn new(kind: PieceKind) -> Self {
        Self { kind, rotation: 0 }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Return this piece turned `steps` quarter turns clockwise
    pub fn rotated(self, steps: u8) -> Self {
        Self {
            kind: self.kind,
            rotation: (self.rotation + steps % 4) % 4,
        }
    }

    /// Rotate in place by `steps` quarter turns clockwise
    pub fn rotate(&mut self, steps: u8) {
        *self = self.rotated(steps);
    }

    /// The occupancy mask for the current rotation, carrying the colour index
    pub fn mask(&self) -> Mask {
        let value = self.kind.value();
        let mut mask = self.kind.template();
        for _ in 0..self.rotation {
            mask = rotate_cw(&mask);
        }
        mask.map(|column| column.map(|cell| cell * value))
    }

    /// Offsets `(dx, dy, value)` of every occupied cell, relative to the centre
    pub fn blocks(&self) -> impl Iterator<Item = (i32, i32, u8)> {
        let mask = self.mask();
        (0..MASK_SIZE).flat_map(move |dx| {
            (0..MASK_SIZE).filter_map(move |dy| {
                let value = mask[dx][dy];
                (value != 0).then_some((dx as i32 - 1, dy as i32 - 1, value))
            })
        })
    }

    /// Number of occupied cells
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_catalog() {
        for kind in PieceKind::all() {
            assert_eq!(PieceKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(PieceKind::from_id(15), None);
    }

    #[test]
    fn test_values_are_colour_indices() {
        assert_eq!(PieceKind::Line.value(), 1);
        assert_eq!(PieceKind::Triple.value(), 15);
    }

    #[test]
    fn test_mask_carries_value() {
        let piece = Piece::new(PieceKind::Plus);
        let mask = piece.mask();
        assert_eq!(mask[1][1], 3);
        assert_eq!(mask[0][0], 0);
    }

    #[test]
    fn test_rotate_line() {
        let mut piece = Piece::new(PieceKind::Line);
        // Vertical through the centre column
        let before: Vec<_> = piece.blocks().map(|(dx, dy, _)| (dx, dy)).collect();
        assert_eq!(before, vec![(0, -1), (0, 0), (0, 1)]);

        piece.rotate(1);
        let mut after: Vec<_> = piece.blocks().map(|(dx, dy, _)| (dx, dy)).collect();
        after.sort();
        assert_eq!(after, vec![(-1, 0), (0, 0), (1, 0)]);
    }

    #[test]
    fn test_four_rotations_is_identity() {
        for kind in PieceKind::all() {
            let piece = Piece::new(kind);
            assert_eq!(piece.rotated(4), piece);
            assert_eq!(piece.rotated(1).rotated(3).mask(), piece.mask());
        }
    }

    #[test]
    fn test_rotation_keeps_block_count() {
        for kind in PieceKind::all() {
            let piece = Piece::new(kind);
            for steps in 0..4 {
                assert_eq!(piece.rotated(steps).block_count(), piece.block_count());
            }
        }
    }

    #[test]
    fn test_rotate_corner_clockwise() {
        // Corner occupies above, centre and above-right
        let piece = Piece::new(PieceKind::Corner).rotated(1);
        let mut cells: Vec<_> = piece.blocks().map(|(dx, dy, _)| (dx, dy)).collect();
        cells.sort();
        // (dx, dy) -> (-dy, dx)
        assert_eq!(cells, vec![(0, 0), (1, 0), (1, 1)]);
    }
}
