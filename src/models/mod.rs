//! Core data models: API payloads, players, wars and leagues.

mod ids;
mod league;
mod payload;
mod player;
mod stats;
mod war;

pub use ids::*;
pub use league::*;
pub use payload::*;
pub use player::*;
pub use stats::*;
pub use war::*;

use thiserror::Error;

/// Errors raised while turning payloads into models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Roster of clan {clan} is empty")]
    EmptyRoster { clan: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}
