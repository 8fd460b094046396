//! Session client: REST commands plus a reconciled local view.

mod rest;
mod view;

pub use rest::{ClientError, RestMatchClient};
pub use view::MatchView;
