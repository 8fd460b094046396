//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Serialize};

/// Mark placed on the board.
///
/// The participant who creates a match always plays `X`; the second seat
/// always plays `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Mark {
    /// Symbol A (first participant, moves first).
    X,
    /// Symbol B (second participant or automated opponent).
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

/// A square on the tic-tac-toe board.
///
/// Serialized as `"X"`, `"O"` or `""` so a stored board is a plain
/// 9-element array of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Wire representation of the square.
    pub fn as_str(self) -> &'static str {
        match self {
            Square::Empty => "",
            Square::Occupied(Mark::X) => "X",
            Square::Occupied(Mark::O) => "O",
        }
    }
}

impl From<Square> for &'static str {
    fn from(square: Square) -> Self {
        square.as_str()
    }
}

impl TryFrom<String> for Square {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.as_str() {
            "" => Ok(Square::Empty),
            "X" => Ok(Square::Occupied(Mark::X)),
            "O" => Ok(Square::Occupied(Mark::O)),
            other => Err(format!("Invalid square value: '{}'", other)),
        }
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Number of cells on the board.
    pub const CELLS: usize = 9;

    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Builds a board from its squares.
    pub fn from_squares(squares: [Square; 9]) -> Self {
        Self { squares }
    }

    /// Gets the square at the given position (0-8).
    pub fn get(&self, pos: usize) -> Option<Square> {
        self.squares.get(pos).copied()
    }

    /// Places a mark on an empty square.
    ///
    /// Marks are never overwritten: placing on an occupied or
    /// out-of-range square is rejected.
    pub(crate) fn place(&mut self, pos: usize, mark: Mark) -> Result<(), &'static str> {
        match self.squares.get_mut(pos) {
            None => Err("Position out of bounds"),
            Some(Square::Occupied(_)) => Err("Square is already occupied"),
            Some(square) => {
                *square = Square::Occupied(mark);
                Ok(())
            }
        }
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: usize) -> bool {
        matches!(self.get(pos), Some(Square::Empty))
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of occupied squares, i.e. plies played so far.
    pub fn occupied(&self) -> usize {
        self.squares
            .iter()
            .filter(|s| matches!(s, Square::Occupied(_)))
            .count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => pos.to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
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

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a board from its compact string form, `.` for empty squares.
///
/// Handy for tests: `"XX.OO...."`.
impl std::str::FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != Self::CELLS {
            return Err(format!("Expected 9 squares, got {}", chars.len()));
        }
        let mut squares = [Square::Empty; 9];
        for (square, c) in squares.iter_mut().zip(chars) {
            *square = match c {
                'X' | 'x' => Square::Occupied(Mark::X),
                'O' | 'o' => Square::Occupied(Mark::O),
                '.' | '_' => Square::Empty,
                other => return Err(format!("Invalid square character: '{}'", other)),
            };
        }
        Ok(Self { squares })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_serializes_as_string_array() {
        let board: Board = "X.O......".parse().unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X","","O","","","","","",""]"#);

        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_board_rejects_wrong_length() {
        let result: Result<Board, _> = serde_json::from_str(r#"["X","",""]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_board_rejects_unknown_symbol() {
        let result: Result<Board, _> =
            serde_json::from_str(r#"["Z","","","","","","","",""]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_place_never_overwrites() {
        let mut board = Board::new();
        board.place(4, Mark::X).unwrap();
        assert!(board.place(4, Mark::O).is_err());
        assert_eq!(board.get(4), Some(Square::Occupied(Mark::X)));
        assert!(board.place(9, Mark::O).is_err());
        assert_eq!(board.occupied(), 1);
    }
}
