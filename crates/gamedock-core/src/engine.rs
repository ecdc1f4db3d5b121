// ── Library engine ──
//
// Full lifecycle management for a game library session. Drives
// aggregation passes against the backend, routes live push events into
// the registry, and gates first paint on the initial pass.

use std::sync::Arc;

use futures_util::future::join_all;
use indexmap::IndexMap;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{
    Collection, Game, GameId, GameStatus, IconResource, LibraryEvent, RemoteCollection,
};
use crate::nav::{self, LIBRARY_ROOT_ROUTE, NavSection};
use crate::provider::LibraryProvider;
use crate::search::{self, FilteredSection};
use crate::store::{LibraryStore, RegistryEntry};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Owns the reactive store and
/// the background tasks: the bootstrap pass, the readiness gate, and the
/// live-update listener.
pub struct LibraryEngine<P> {
    inner: Arc<EngineInner<P>>,
}

impl<P> Clone for LibraryEngine<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<P> {
    provider: Arc<P>,
    config: EngineConfig,
    store: Arc<LibraryStore>,
    /// Serializes aggregation passes — concurrent triggers queue up
    /// rather than interleave their fetches and publishes.
    pass_lock: Mutex<()>,
    /// Flips to `true` exactly once, when first paint may proceed.
    ready: watch::Sender<bool>,
    route: watch::Sender<String>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<P: LibraryProvider> LibraryEngine<P> {
    /// Create an engine over a backend provider. Does NOT fetch anything —
    /// call [`start()`](Self::start) to run the initial pass and spawn
    /// background tasks.
    pub fn new(provider: P, config: EngineConfig) -> Self {
        let (ready, _) = watch::channel(false);
        let (route, _) = watch::channel(LIBRARY_ROOT_ROUTE.to_owned());

        Self {
            inner: Arc::new(EngineInner {
                provider: Arc::new(provider),
                config,
                store: Arc::new(LibraryStore::new()),
                pass_lock: Mutex::new(()),
                ready,
                route,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the reactive store.
    pub fn store(&self) -> &Arc<LibraryStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the initial aggregation pass and spawn background tasks.
    ///
    /// The initial pass runs concurrently with the caller: subscribe to
    /// [`ready()`](Self::ready) to learn when first paint may proceed.
    /// The readiness gate opens when the pass completes or after the
    /// configured bootstrap timeout, whichever comes first.
    pub async fn start(&self, events: broadcast::Receiver<LibraryEvent>) {
        let mut handles = self.inner.task_handles.lock().await;

        // Initial aggregation. Failure still opens the gate — consumers
        // render an empty library and a later refresh recovers.
        {
            let engine = self.clone();
            handles.push(tokio::spawn(async move {
                if let Err(e) = engine.aggregate(false, true).await {
                    warn!(error = %e, "initial aggregation failed");
                }
                engine.mark_ready();
            }));
        }

        // Readiness gate timer.
        {
            let engine = self.clone();
            let cancel = self.inner.cancel.clone();
            let timeout = self.inner.config.bootstrap_timeout;
            handles.push(tokio::spawn(async move {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(timeout) => {
                        engine.mark_ready();
                    }
                }
            }));
        }

        // Live-update listener.
        {
            let engine = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(listener_task(engine, events, cancel)));
        }

        info!("engine started");
    }

    /// Stop background tasks and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("engine shut down");
    }

    // ── Aggregation ──────────────────────────────────────────────

    /// Re-aggregate the library, bypassing any backend response cache.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.aggregate(true, false).await
    }

    /// One aggregation pass: fetch the primary library and the named
    /// collections, register every game seen, publish the collection
    /// snapshot, then resolve missing icons.
    ///
    /// Passes are serialized; a pass triggered while another runs waits
    /// its turn. `initial` clears the previous snapshot up front instead
    /// of keeping it visible during the fetch.
    async fn aggregate(&self, hard_refresh: bool, initial: bool) -> Result<(), CoreError> {
        let _pass = self.inner.pass_lock.lock().await;
        let store = &self.inner.store;

        store.begin_pass(initial);

        let fetched = {
            let provider = &self.inner.provider;
            let (library_res, collections_res) = tokio::join!(
                provider.fetch_library(hard_refresh),
                provider.fetch_collections(hard_refresh),
            );
            match (library_res, collections_res) {
                (Ok(library), Ok(collections)) => Ok((library, collections)),
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        };

        let (library, remote_collections) = match fetched {
            Ok(data) => data,
            Err(e) => {
                store.end_pass();
                return Err(e);
            }
        };

        // Register every game before anything is published or resolved.
        // First sight wins: primary list first, then collection entries,
        // deduplicated by id.
        let mut seen: IndexMap<GameId, Arc<Game>> = IndexMap::new();
        let mut primary: Vec<Arc<Game>> = Vec::with_capacity(library.len());
        for game in library {
            let entry = store.ensure_game(game);
            let game = Arc::clone(entry.game());
            seen.insert(game.id.clone(), Arc::clone(&game));
            primary.push(game);
        }
        for collection in &remote_collections {
            for game in &collection.games {
                if !seen.contains_key(&game.id) {
                    let entry = store.ensure_game(game.clone());
                    let game = Arc::clone(entry.game());
                    seen.insert(game.id.clone(), game);
                }
            }
        }

        let mut collections = Vec::with_capacity(remote_collections.len() + 1);
        collections.push(Collection::library(&primary));
        collections.extend(remote_collections.into_iter().map(reduce_collection));

        debug!(
            games = seen.len(),
            collections = collections.len(),
            hard_refresh,
            "aggregation pass assembled"
        );
        store.publish_collections(collections);
        self.reroute_if_vanished();

        self.resolve_missing_icons(seen.into_values()).await;
        Ok(())
    }

    /// Fetch icons for games that don't have one cached yet. Per-icon
    /// failures are logged and skipped.
    async fn resolve_missing_icons(&self, games: impl Iterator<Item = Arc<Game>>) {
        let store = &self.inner.store;
        let missing: Vec<Arc<Game>> = games.filter(|g| !store.has_icon(&g.id)).collect();
        if missing.is_empty() {
            return;
        }
        debug!(count = missing.len(), "resolving missing icons");

        let futs = missing.into_iter().map(|game| {
            let provider = Arc::clone(&self.inner.provider);
            async move {
                match provider.resolve_icon(&game.icon).await {
                    Ok(icon) => Some((game.id.clone(), icon)),
                    Err(e) => {
                        warn!(game_id = %game.id, error = %e, "icon fetch failed");
                        None
                    }
                }
            }
        });
        for (id, icon) in join_all(futs).await.into_iter().flatten() {
            store.store_icon(id, icon);
        }
    }

    // ── Event application ────────────────────────────────────────

    /// Apply a pushed status change to the matching registry entry.
    /// Pushes for unregistered games are dropped.
    pub fn apply_status(&self, game_id: &GameId, status: GameStatus) -> bool {
        self.inner.store.apply_status(game_id, status)
    }

    // ── Readiness gate ───────────────────────────────────────────

    /// Whether first paint may proceed.
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    /// Subscribe to the readiness gate. It flips to `true` exactly once.
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.inner.ready.subscribe()
    }

    fn mark_ready(&self) {
        let opened = self.inner.ready.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
        if opened {
            info!("readiness gate opened");
        }
    }

    // ── Routing ──────────────────────────────────────────────────

    /// The current route.
    pub fn route(&self) -> String {
        self.inner.route.borrow().clone()
    }

    /// Subscribe to route changes.
    pub fn subscribe_route(&self) -> watch::Receiver<String> {
        self.inner.route.subscribe()
    }

    /// Navigate to a route.
    pub fn navigate(&self, route: impl Into<String>) {
        self.inner.route.send_replace(route.into());
    }

    /// If the current route points at a game that no longer appears in
    /// the navigation tree, fall back to the library root.
    fn reroute_if_vanished(&self) {
        let current = self.inner.route.borrow().clone();
        let Some(game_id) = nav::route_game_id(&current) else {
            return;
        };
        if !nav::contains_game(&self.inner.store.nav_sections(), &game_id) {
            debug!(game_id = %game_id, "routed game vanished, returning to root");
            self.inner.route.send_replace(LIBRARY_ROOT_ROUTE.to_owned());
        }
    }

    // ── Snapshot accessors (delegate to LibraryStore) ────────────

    pub fn collections(&self) -> Arc<Vec<Collection>> {
        self.inner.store.collections()
    }

    pub fn subscribe_collections(&self) -> watch::Receiver<Arc<Vec<Collection>>> {
        self.inner.store.subscribe_collections()
    }

    pub fn nav_sections(&self) -> Arc<Vec<NavSection>> {
        self.inner.store.nav_sections()
    }

    pub fn subscribe_nav(&self) -> watch::Receiver<Arc<Vec<NavSection>>> {
        self.inner.store.subscribe_nav()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.store.is_loading()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.store.subscribe_loading()
    }

    /// Look up a game's registry entry (metadata + live status cell).
    pub fn game(&self, id: &GameId) -> Option<Arc<RegistryEntry>> {
        self.inner.store.registry().get(id)
    }

    /// Look up a game's resolved icon, if cached.
    pub fn icon(&self, id: &GameId) -> Option<Arc<IconResource>> {
        self.inner.store.icon(id)
    }

    /// Filter the current navigation tree by a search query.
    pub fn search(&self, query: &str) -> Vec<FilteredSection> {
        search::filter_sections(&self.inner.store.nav_sections(), query)
    }
}

/// Reduce a fetched collection to its published id-list form.
fn reduce_collection(remote: RemoteCollection) -> Collection {
    Collection {
        id: remote.id,
        name: remote.name,
        is_default: remote.is_default,
        entries: remote.games.into_iter().map(|g| g.id).collect(),
    }
}

/// Background task: apply push events until cancelled or the stream
/// closes. A `LibraryChanged` signal forces a full hard-refresh pass; a
/// lagged receiver does the same, since dropped status events would
/// otherwise go stale silently.
async fn listener_task<P: LibraryProvider>(
    engine: LibraryEngine<P>,
    mut events: broadcast::Receiver<LibraryEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = events.recv() => {
                match result {
                    Ok(LibraryEvent::LibraryChanged) => {
                        debug!("library change signalled, re-aggregating");
                        if let Err(e) = engine.aggregate(true, false).await {
                            warn!(error = %e, "re-aggregation failed");
                        }
                    }
                    Ok(LibraryEvent::GameStatus { game_id, status }) => {
                        engine.apply_status(&game_id, status);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event listener lagged, re-aggregating");
                        if let Err(e) = engine.aggregate(true, false).await {
                            warn!(error = %e, "re-aggregation failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("event listener exiting");
}
