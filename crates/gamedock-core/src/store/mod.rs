//! Reactive library state.
//!
//! [`LibraryStore`] is the single writer-side container: the game
//! registry, the icon cache, and the published snapshot cells
//! (collections, navigation tree, loading flag). All snapshot cells are
//! `watch` channels so readers observe whole consistent values rather
//! than incremental mutations.

mod registry;

pub use registry::{GameRegistry, RegistryEntry};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::model::{Collection, Game, GameId, GameStatus, IconResource};
use crate::nav::{self, NavSection};

/// Shared reactive state behind the engine.
pub struct LibraryStore {
    registry: GameRegistry,
    icons: DashMap<GameId, Arc<IconResource>>,
    collections: watch::Sender<Arc<Vec<Collection>>>,
    nav: watch::Sender<Arc<Vec<NavSection>>>,
    loading: watch::Sender<bool>,
    last_aggregated: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for LibraryStore {
    fn default() -> Self {
        let (collections, _) = watch::channel(Arc::new(Vec::new()));
        let (nav, _) = watch::channel(Arc::new(Vec::new()));
        let (loading, _) = watch::channel(false);
        let (last_aggregated, _) = watch::channel(None);
        Self {
            registry: GameRegistry::new(),
            icons: DashMap::new(),
            collections,
            nav,
            loading,
            last_aggregated,
        }
    }
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    // ── Icon cache ──

    /// Register the durable entry for a game, creating it on first sight.
    pub fn ensure_game(&self, game: Game) -> Arc<RegistryEntry> {
        self.registry.ensure(game)
    }

    pub fn icon(&self, id: &GameId) -> Option<Arc<IconResource>> {
        self.icons.get(id).map(|r| Arc::clone(r.value()))
    }

    pub fn has_icon(&self, id: &GameId) -> bool {
        self.icons.contains_key(id)
    }

    pub fn store_icon(&self, id: GameId, icon: IconResource) {
        self.icons.insert(id, Arc::new(icon));
    }

    // ── Published snapshots ──

    pub fn collections(&self) -> Arc<Vec<Collection>> {
        self.collections.borrow().clone()
    }

    pub fn subscribe_collections(&self) -> watch::Receiver<Arc<Vec<Collection>>> {
        self.collections.subscribe()
    }

    pub fn nav_sections(&self) -> Arc<Vec<NavSection>> {
        self.nav.borrow().clone()
    }

    pub fn subscribe_nav(&self) -> watch::Receiver<Arc<Vec<NavSection>>> {
        self.nav.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn last_aggregated(&self) -> Option<DateTime<Utc>> {
        *self.last_aggregated.borrow()
    }

    // ── Writer side ──

    /// Mark the start of an aggregation pass.
    ///
    /// Only the initial pass enters the loading state and clears any
    /// stale snapshot before fetching; later passes keep the previous
    /// snapshot visible while the new one is assembled, without
    /// flashing a loading indicator at presentation.
    pub fn begin_pass(&self, initial: bool) {
        if initial {
            self.loading.send_replace(true);
            self.collections.send_replace(Arc::new(Vec::new()));
            self.republish_nav();
        }
    }

    /// Atomically publish a freshly aggregated collection list and the
    /// navigation tree derived from it.
    pub fn publish_collections(&self, collections: Vec<Collection>) {
        debug!(count = collections.len(), "publishing collection snapshot");
        self.collections.send_replace(Arc::new(collections));
        self.republish_nav();
        self.last_aggregated.send_replace(Some(Utc::now()));
        self.loading.send_replace(false);
    }

    /// Mark a pass as finished without publishing (failure path).
    pub fn end_pass(&self) {
        self.loading.send_replace(false);
    }

    /// Apply a pushed status change and refresh the derived nav tree.
    ///
    /// Returns `false` if the game is not registered.
    pub fn apply_status(&self, id: &GameId, status: GameStatus) -> bool {
        if self.registry.set_status(id, status) {
            self.republish_nav();
            true
        } else {
            false
        }
    }

    fn republish_nav(&self) {
        let sections = nav::project(&self.collections.borrow(), &self.registry);
        self.nav.send_replace(Arc::new(sections));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectId;
    use bytes::Bytes;

    fn game(id: &str, name: &str) -> Game {
        Game {
            id: GameId::from(id),
            name: name.to_owned(),
            icon: ObjectId::new(format!("icon-{id}")),
        }
    }

    fn collection(id: &str, name: &str, games: &[&str]) -> Collection {
        Collection {
            id: id.to_owned(),
            name: name.to_owned(),
            is_default: false,
            entries: games.iter().map(|g| GameId::from(*g)).collect(),
        }
    }

    #[test]
    fn publish_updates_collections_and_nav_together() {
        let store = LibraryStore::new();
        let mut nav_rx = store.subscribe_nav();
        store.ensure_game(game("a", "Aurora"));

        store.publish_collections(vec![collection("favs", "Favourites", &["a"])]);

        assert!(nav_rx.has_changed().unwrap());
        let sections = nav_rx.borrow_and_update().clone();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].items[0].label, "Aurora");
        assert!(store.last_aggregated().is_some());
        assert!(!store.is_loading());
    }

    #[test]
    fn initial_pass_clears_previous_snapshot() {
        let store = LibraryStore::new();
        store.ensure_game(game("a", "Aurora"));
        store.publish_collections(vec![collection("favs", "Favourites", &["a"])]);

        store.begin_pass(true);
        assert!(store.is_loading());
        assert!(store.collections().is_empty());
        assert!(store.nav_sections().is_empty());
    }

    #[test]
    fn refresh_pass_keeps_previous_snapshot_and_stays_quiet() {
        let store = LibraryStore::new();
        store.ensure_game(game("a", "Aurora"));
        store.publish_collections(vec![collection("favs", "Favourites", &["a"])]);

        // A non-initial pass must not flash the loading indicator.
        store.begin_pass(false);
        assert!(!store.is_loading());
        assert_eq!(store.collections().len(), 1);
        assert_eq!(store.nav_sections().len(), 1);
    }

    #[test]
    fn apply_status_republishes_nav() {
        let store = LibraryStore::new();
        store.ensure_game(game("a", "Aurora"));
        store.publish_collections(vec![collection("favs", "Favourites", &["a"])]);
        let mut nav_rx = store.subscribe_nav();
        nav_rx.borrow_and_update();

        assert!(store.apply_status(&GameId::from("a"), GameStatus::Installed));

        assert!(nav_rx.has_changed().unwrap());
        assert!(nav_rx.borrow_and_update()[0].items[0].installed);
    }

    #[test]
    fn apply_status_for_unknown_game_is_ignored() {
        let store = LibraryStore::new();
        let mut nav_rx = store.subscribe_nav();
        assert!(!store.apply_status(&GameId::from("ghost"), GameStatus::Installed));
        assert!(!nav_rx.has_changed().unwrap());
    }

    #[test]
    fn icon_cache_round_trip() {
        let store = LibraryStore::new();
        let id = GameId::from("a");
        assert!(!store.has_icon(&id));

        store.store_icon(
            id.clone(),
            IconResource {
                content_type: "image/png".to_owned(),
                bytes: Bytes::from_static(b"png"),
            },
        );

        assert!(store.has_icon(&id));
        assert_eq!(store.icon(&id).unwrap().content_type, "image/png");
    }
}
