// ── Domain form of backend push events ──

use super::game::{GameId, GameStatus};

/// A push event from the backend, in domain terms.
///
/// The engine's live-update listener consumes these: `LibraryChanged`
/// triggers a re-aggregation pass, `GameStatus` flows into the matching
/// registry entry's status cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    /// The backend's library state changed in some unspecified way.
    LibraryChanged,
    /// One game's lifecycle status changed.
    GameStatus { game_id: GameId, status: GameStatus },
}
