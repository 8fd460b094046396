//! Game rules for tic-tac-toe.
//!
//! Pure functions for evaluating a board. Rules are separated from
//! match state so the engine and the automated opponent share them.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, find_immediate_win, find_winner};
