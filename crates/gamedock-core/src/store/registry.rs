// ── Game registry ──
//
// Durable (Game, live-status) pairs keyed by game id. Lock-free storage
// with push-based status notification via `watch` channels.
//
// Entries are created lazily on first sight of a game id and live for
// the whole session — never replaced, never evicted. Replacing an entry
// would sever every live status subscription hanging off it, so
// `ensure` is strictly idempotent.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::model::{Game, GameId, GameStatus};

/// One registered game: immutable metadata plus its reactive status cell.
pub struct RegistryEntry {
    game: Arc<Game>,
    status: watch::Sender<GameStatus>,
}

impl RegistryEntry {
    fn new(game: Game) -> Self {
        let (status, _) = watch::channel(GameStatus::default());
        Self {
            game: Arc::new(game),
            status,
        }
    }

    /// The game's descriptive metadata.
    pub fn game(&self) -> &Arc<Game> {
        &self.game
    }

    /// The current status value.
    pub fn status(&self) -> GameStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes for this game.
    pub fn subscribe_status(&self) -> watch::Receiver<GameStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: GameStatus) {
        self.status.send_replace(status);
    }
}

/// Process-wide game registry. Grows, never shrinks.
#[derive(Default)]
pub struct GameRegistry {
    entries: DashMap<GameId, Arc<RegistryEntry>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for a game, creating it on first sight.
    ///
    /// Idempotent: a second call with the same id returns the existing
    /// entry (same `Arc`), regardless of the metadata passed — first
    /// sight wins, the live status binding is never rebuilt.
    pub fn ensure(&self, game: Game) -> Arc<RegistryEntry> {
        self.entries
            .entry(game.id.clone())
            .or_insert_with(|| Arc::new(RegistryEntry::new(game)))
            .clone()
    }

    /// Look up an entry by game id.
    pub fn get(&self, id: &GameId) -> Option<Arc<RegistryEntry>> {
        self.entries.get(id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, id: &GameId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write a status value into a game's cell.
    ///
    /// Returns `false` for unknown ids — status pushes can race ahead of
    /// the first aggregation pass, and a later pass re-synchronizes.
    pub fn set_status(&self, id: &GameId, status: GameStatus) -> bool {
        match self.entries.get(id) {
            Some(entry) => {
                entry.set_status(status);
                true
            }
            None => {
                debug!(game_id = %id, "status push for unregistered game, dropping");
                false
            }
        }
    }
}
