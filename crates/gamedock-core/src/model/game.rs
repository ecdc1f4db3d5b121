// ── Game identity, metadata, and lifecycle status ──

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Opaque game identifier assigned by the backend.
///
/// Deduplication across the primary library and named collections is done
/// by this id — never by instance identity. The backend may hand back
/// distinct objects for the same logical game; they collapse here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for GameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque reference to a server-side object (icon, banner, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive game metadata. Immutable once fetched; shared as `Arc<Game>`
/// between the registry and anything derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub icon: ObjectId,
}

/// A resolved icon, ready for the presentation layer.
#[derive(Debug, Clone)]
pub struct IconResource {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Presentation hint for a status chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAccent {
    /// Not on this machine.
    Muted,
    /// Work in progress (queue, download, validation, ...).
    Busy,
    /// Playable.
    Ready,
    /// Needs user attention before it is playable.
    Attention,
}

/// Per-game lifecycle status.
///
/// Exactly one value at any instant per game id; the only writer is the
/// backend's status push stream, routed through the registry entry's cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Known to the backend but not present locally. The starting state
    /// for every freshly registered game.
    #[default]
    Remote,
    Queued,
    Downloading,
    Validating,
    Updating,
    Installed,
    SetupRequired,
    PartiallyInstalled,
    Running,
    Uninstalling,
}

impl GameStatus {
    /// Whether the game occupies local disk in any form.
    /// Everything except `Remote` counts.
    pub fn is_installed(self) -> bool {
        self != Self::Remote
    }

    /// Human-readable status label for the navigation view.
    pub fn label(self) -> &'static str {
        match self {
            Self::Remote => "Available",
            Self::Queued => "Queued",
            Self::Downloading => "Downloading",
            Self::Validating => "Validating",
            Self::Updating => "Updating",
            Self::Installed => "Installed",
            Self::SetupRequired => "Setup required",
            Self::PartiallyInstalled => "Partially installed",
            Self::Running => "Running",
            Self::Uninstalling => "Uninstalling",
        }
    }

    /// Which visual treatment the status chip gets.
    pub fn accent(self) -> StatusAccent {
        match self {
            Self::Remote => StatusAccent::Muted,
            Self::Queued | Self::Downloading | Self::Validating | Self::Updating
            | Self::Uninstalling => StatusAccent::Busy,
            Self::Installed | Self::Running => StatusAccent::Ready,
            Self::SetupRequired | Self::PartiallyInstalled => StatusAccent::Attention,
        }
    }
}
