//! Win detection logic for tic-tac-toe.

use super::super::{Board, Mark, Square};
use tracing::instrument;

/// The 8 winning triples, scanned in this order: rows, columns, diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Checks if there is a winner on the board.
///
/// Returns the mark filling the first uniform triple in scan order,
/// `None` otherwise.
#[instrument(skip(board))]
pub fn find_winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|&[a, b, c]| {
        let sq = board.get(a)?;
        match sq {
            Square::Occupied(mark) if board.get(b) == Some(sq) && board.get(c) == Some(sq) => {
                Some(mark)
            }
            _ => None,
        }
    })
}

/// Finds a square that completes a triple for `mark`.
///
/// A triple qualifies when exactly two of its squares hold `mark` and the
/// third is empty. The first qualifying triple in scan order wins.
#[instrument(skip(board))]
pub fn find_immediate_win(board: &Board, mark: Mark) -> Option<usize> {
    LINES.iter().find_map(|line| {
        let owned = line
            .iter()
            .filter(|&&i| board.get(i) == Some(Square::Occupied(mark)))
            .count();
        let mut empty = line.iter().copied().filter(|&i| board.is_empty(i));
        match (owned, empty.next(), empty.next()) {
            (2, Some(pos), None) => Some(pos),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().expect("valid board literal")
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(find_winner(&Board::new()), None);
    }

    #[test]
    fn test_every_line_is_detected() {
        for line in LINES {
            for mark in [Mark::X, Mark::O] {
                let mut b = Board::new();
                for pos in line {
                    b.place(pos, mark).unwrap();
                }
                assert_eq!(find_winner(&b), Some(mark), "line {:?}", line);
            }
        }
    }

    #[test]
    fn test_full_board_without_line_has_no_winner() {
        assert_eq!(find_winner(&board("XOXXOOOXX")), None);
    }

    #[test]
    fn test_first_line_in_scan_order_wins() {
        // Not reachable in legal play, but the scan order must be stable.
        assert_eq!(find_winner(&board("OOOXXX...")), Some(Mark::O));
    }

    #[test]
    fn test_no_winner_incomplete() {
        assert_eq!(find_winner(&board("XX.......")), None);
    }

    #[test]
    fn test_immediate_win_in_row() {
        assert_eq!(find_immediate_win(&board("XX.OO...."), Mark::X), Some(2));
        assert_eq!(find_immediate_win(&board("XX.OO...."), Mark::O), Some(5));
    }

    #[test]
    fn test_immediate_win_blocked_line_ignored() {
        assert_eq!(find_immediate_win(&board("XXO......"), Mark::X), None);
    }

    #[test]
    fn test_immediate_win_prefers_scan_order() {
        // Column 0 and the main diagonal both complete; rows come before
        // columns, columns before diagonals.
        assert_eq!(find_immediate_win(&board("X...X.X.."), Mark::X), Some(3));
    }
}
