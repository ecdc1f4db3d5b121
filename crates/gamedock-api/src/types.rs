//! Wire types for the backend's client API.
//!
//! Field names mirror the server's JSON exactly (`camelCase`, with the
//! `m`-prefixed metadata fields the backend uses for games). These types
//! stay raw — `gamedock-core` converts them into domain types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A game as returned by the library and collection endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDoc {
    pub id: String,
    pub m_name: String,
    pub m_icon_object_id: String,
    #[serde(default)]
    pub m_short_description: String,
}

/// A named collection with its embedded game entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDoc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub entries: Vec<CollectionEntryDoc>,
}

/// One collection entry. The server embeds the full game object so the
/// client never has to fetch entry games one by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntryDoc {
    pub game: GameDoc,
}

/// Per-game lifecycle status, internally tagged on `type`.
///
/// The server attaches progress payloads to some variants; only the tag
/// matters to the navigation model, so payload fields are ignored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameStatusDoc {
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

/// A resolved opaque object (icon, banner, ...) with its content type.
#[derive(Debug, Clone)]
pub struct ObjectResource {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Error body the backend sends on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerErrorBody {
    pub status_code: u16,
    pub status_message: String,
}
