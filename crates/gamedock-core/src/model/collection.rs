// ── Collections: fetched form and published form ──

use std::sync::Arc;

use super::game::{Game, GameId};

/// Synthetic id of the local "Library" collection. Never fetched; built
/// from the primary game list on every aggregation pass.
pub const LIBRARY_COLLECTION_ID: &str = "library";
pub const LIBRARY_COLLECTION_NAME: &str = "Library";

/// A named collection as fetched from the backend, games embedded.
///
/// This is the provider-seam shape: entry games arrive in full so they
/// can be registered even when absent from the primary library. The
/// aggregator dedups them into the registry and reduces this to a
/// [`Collection`] of ids.
#[derive(Debug, Clone)]
pub struct RemoteCollection {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub games: Vec<Game>,
}

/// A published collection: ordered game ids, metadata resolved through
/// the registry. Replaced wholesale on every aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub entries: Vec<GameId>,
}

impl Collection {
    /// Synthesize the implicit "Library" collection from the primary game
    /// list, one entry per game in fetch order.
    pub fn library(primary: &[Arc<Game>]) -> Self {
        Self {
            id: LIBRARY_COLLECTION_ID.to_owned(),
            name: LIBRARY_COLLECTION_NAME.to_owned(),
            is_default: true,
            entries: primary.iter().map(|g| g.id.clone()).collect(),
        }
    }
}
