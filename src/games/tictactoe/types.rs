//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Mark {
    /// Mark X (always opens a game).
    X,
    /// Mark O.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A cell on the tic-tac-toe board.
///
/// On the wire a cell is `""`, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Square {
    /// Empty cell.
    #[default]
    Empty,
    /// Cell holding a mark.
    Occupied(Mark),
}

impl Square {
    /// Wire symbol for this cell.
    pub fn symbol(self) -> &'static str {
        match self {
            Square::Empty => "",
            Square::Occupied(Mark::X) => "X",
            Square::Occupied(Mark::O) => "O",
        }
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        match symbol.as_str() {
            "" => Ok(Square::Empty),
            "X" => Ok(Square::Occupied(Mark::X)),
            "O" => Ok(Square::Occupied(Mark::O)),
            other => Err(serde::de::Error::custom(format!(
                "unknown cell symbol {other:?}"
            ))),
        }
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    /// Cells in row-major order (0-8).
    squares: [Square; CELL_COUNT],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cell at the given index (0-8).
    pub fn get(&self, index: usize) -> Option<Square> {
        self.squares.get(index).copied()
    }

    /// Checks if a cell is empty. Out-of-range indices are never empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Square::Empty))
    }

    /// Writes a mark into an empty cell.
    ///
    /// Returns `false` and leaves the board untouched when the index is
    /// out of range or the cell is already occupied.
    pub fn place(&mut self, index: usize, mark: Mark) -> bool {
        match self.squares.get_mut(index) {
            Some(cell @ Square::Empty) => {
                *cell = Square::Occupied(mark);
                true
            }
            _ => false,
        }
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.squares = [Square::Empty; CELL_COUNT];
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Returns all cells as a slice.
    pub fn squares(&self) -> &[Square; CELL_COUNT] {
        &self.squares
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                match self.squares[pos] {
                    Square::Empty => result.push_str(&pos.to_string()),
                    Square::Occupied(mark) => result.push_str(&mark.to_string()),
                }
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl From<[Square; CELL_COUNT]> for Board {
    fn from(squares: [Square; CELL_COUNT]) -> Self {
        Self { squares }
    }
}
