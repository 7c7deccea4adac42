//! The one typed failure mode in the engine: parsing a movement direction.
//!
//! Everything else a handler can refuse to do (dead player moving, bomb
//! placement over capacity, joining a full lobby) is expressed as an early
//! return or a `lobbyError` envelope rather than as a `Result::Err`, the way
//! the original game server never unwound a connection over a denied action.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown movement direction: {0}")]
    UnknownDirection(String),
}
