//! Tic-tac-toe board, rules and automated opponent.

pub mod policy;
pub mod rules;
mod types;

pub use policy::choose_move;
pub use rules::{find_immediate_win, find_winner, is_draw, is_full};
pub use types::{Board, Mark, Square};
