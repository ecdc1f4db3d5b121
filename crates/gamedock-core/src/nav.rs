//! Navigation tree projection.
//!
//! The sidebar tree is a pure function of the published collection
//! snapshot and the registry's current statuses. It is recomputed
//! wholesale at every mutation rather than patched in place, so a
//! subscriber always sees an internally consistent tree.

use serde::Serialize;

use crate::model::{Collection, GameId};
use crate::store::GameRegistry;

/// Route shown when no game is selected.
pub const LIBRARY_ROOT_ROUTE: &str = "/library";

/// Route for a single game's detail view.
pub fn game_route(id: &GameId) -> String {
    format!("/library/{id}")
}

/// Extract the game id from a game detail route, if it is one.
pub fn route_game_id(route: &str) -> Option<GameId> {
    let rest = route.strip_prefix("/library/")?;
    if rest.is_empty() {
        None
    } else {
        Some(GameId::from(rest))
    }
}

/// One collection rendered as a navigation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSection {
    pub id: String,
    pub name: String,
    /// Default sections (the implicit Library) start expanded.
    pub default_open: bool,
    pub items: Vec<NavItem>,
}

/// One game within a navigation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub game_id: GameId,
    pub label: String,
    pub route: String,
    pub installed: bool,
}

/// Derive the full navigation tree from a collection snapshot.
///
/// Collection order is preserved. Entries whose game is missing from the
/// registry are skipped rather than rendered as placeholders.
pub fn project(collections: &[Collection], registry: &GameRegistry) -> Vec<NavSection> {
    collections
        .iter()
        .map(|collection| NavSection {
            id: collection.id.clone(),
            name: collection.name.clone(),
            default_open: collection.is_default,
            items: collection
                .entries
                .iter()
                .filter_map(|game_id| {
                    let entry = registry.get(game_id)?;
                    Some(NavItem {
                        game_id: game_id.clone(),
                        label: entry.game().name.clone(),
                        route: game_route(game_id),
                        installed: entry.status().is_installed(),
                    })
                })
                .collect(),
        })
        .collect()
}

/// Whether any section still contains the given game.
pub fn contains_game(sections: &[NavSection], game_id: &GameId) -> bool {
    sections
        .iter()
        .any(|section| section.items.iter().any(|item| &item.game_id == game_id))
}
