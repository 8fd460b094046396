//! Move policy for the automated opponent.
//!
//! A fixed-priority heuristic, not a solver: win, block, center, corners,
//! then the first free square. Scan orders are part of the contract so the
//! opponent stays deterministic.

use super::rules::find_immediate_win;
use super::{Board, Mark};
use tracing::{debug, instrument};

/// Center square.
const CENTER: usize = 4;

/// Corner squares in scan order.
const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Chooses a square for `own` to play.
///
/// Returns `None` only when the board has no empty square.
#[instrument(skip(board), fields(board = ?board.squares()))]
pub fn choose_move(board: &Board, own: Mark, opponent: Mark) -> Option<usize> {
    if let Some(pos) = find_immediate_win(board, own) {
        debug!(pos, "Completing own line");
        return Some(pos);
    }

    if let Some(pos) = find_immediate_win(board, opponent) {
        debug!(pos, "Blocking opponent line");
        return Some(pos);
    }

    if board.is_empty(CENTER) {
        return Some(CENTER);
    }

    CORNERS
        .into_iter()
        .chain(0..Board::CELLS)
        .find(|&pos| board.is_empty(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choose(s: &str) -> Option<usize> {
        let board: Board = s.parse().unwrap();
        choose_move(&board, Mark::O, Mark::X)
    }

    #[test]
    fn test_takes_center_first() {
        assert_eq!(choose("X........"), Some(4));
    }

    #[test]
    fn test_win_beats_block() {
        // O can finish the middle row; X threatens the top row.
        assert_eq!(choose("XX.OO...."), Some(5));
    }

    #[test]
    fn test_blocks_opponent() {
        assert_eq!(choose("XX..O...."), Some(2));
    }

    #[test]
    fn test_corner_when_center_taken() {
        assert_eq!(choose("....X...."), Some(0));
        assert_eq!(choose("O...X...."), Some(2));
    }

    #[test]
    fn test_falls_back_to_first_edge() {
        // Center and corners taken, no lines to complete or block.
        assert_eq!(choose("X.OOXXX.O"), Some(1));
    }

    #[test]
    fn test_full_board() {
        assert_eq!(choose("XOXOXXOXO"), None);
    }

    #[test]
    fn test_deterministic() {
        let board: Board = "X...O...X".parse().unwrap();
        let first = choose_move(&board, Mark::O, Mark::X);
        for _ in 0..10 {
            assert_eq!(choose_move(&board, Mark::O, Mark::X), first);
        }
    }
}
