#![allow(clippy::unwrap_used)]
// Integration tests for `LibraryEngine` over an in-memory provider.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;
use tokio::time::Instant;

use gamedock_core::{
    Collection, CoreError, EngineConfig, Game, GameId, GameStatus, IconResource, LIBRARY_ROOT_ROUTE,
    LibraryEngine, LibraryEvent, LibraryProvider, ObjectId, RemoteCollection, game_route,
};

// ── Fake backend ────────────────────────────────────────────────────

#[derive(Default)]
struct FakeBackend {
    library: Mutex<Vec<Game>>,
    collections: Mutex<Vec<RemoteCollection>>,
    fetch_delay: Mutex<Duration>,
    fail_fetches: AtomicBool,
    library_calls: AtomicUsize,
    icon_calls: AtomicUsize,
    /// In-flight library fetches, and the highest overlap ever seen.
    /// Serialized passes never push the maximum above one.
    active_library_fetches: AtomicUsize,
    max_overlapping_fetches: AtomicUsize,
}

#[derive(Clone, Default)]
struct FakeProvider(Arc<FakeBackend>);

impl FakeProvider {
    fn set_library(&self, games: Vec<Game>) {
        *self.0.library.lock().unwrap() = games;
    }

    fn set_collections(&self, collections: Vec<RemoteCollection>) {
        *self.0.collections.lock().unwrap() = collections;
    }

    fn set_fetch_delay(&self, delay: Duration) {
        *self.0.fetch_delay.lock().unwrap() = delay;
    }

    fn set_failing(&self, failing: bool) {
        self.0.fail_fetches.store(failing, Ordering::SeqCst);
    }

    fn library_calls(&self) -> usize {
        self.0.library_calls.load(Ordering::SeqCst)
    }

    fn icon_calls(&self) -> usize {
        self.0.icon_calls.load(Ordering::SeqCst)
    }

    fn max_overlapping_fetches(&self) -> usize {
        self.0.max_overlapping_fetches.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = *self.0.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_failure(&self) -> Result<(), CoreError> {
        if self.0.fail_fetches.load(Ordering::SeqCst) {
            Err(CoreError::FetchFailed {
                message: "backend down".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl LibraryProvider for FakeProvider {
    async fn fetch_library(&self, _hard_refresh: bool) -> Result<Vec<Game>, CoreError> {
        let active = self.0.active_library_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.0
            .max_overlapping_fetches
            .fetch_max(active, Ordering::SeqCst);
        self.simulate_latency().await;
        self.0.active_library_fetches.fetch_sub(1, Ordering::SeqCst);

        self.0.library_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.0.library.lock().unwrap().clone())
    }

    async fn fetch_collections(
        &self,
        _hard_refresh: bool,
    ) -> Result<Vec<RemoteCollection>, CoreError> {
        self.simulate_latency().await;
        self.check_failure()?;
        Ok(self.0.collections.lock().unwrap().clone())
    }

    async fn resolve_icon(&self, icon: &ObjectId) -> Result<IconResource, CoreError> {
        self.0.icon_calls.fetch_add(1, Ordering::SeqCst);
        Ok(IconResource {
            content_type: "image/png".to_owned(),
            bytes: Bytes::copy_from_slice(icon.as_str().as_bytes()),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn game(id: &str, name: &str) -> Game {
    Game {
        id: GameId::from(id),
        name: name.to_owned(),
        icon: ObjectId::new(format!("icon-{id}")),
    }
}

fn remote_collection(id: &str, name: &str, games: Vec<Game>) -> RemoteCollection {
    RemoteCollection {
        id: id.to_owned(),
        name: name.to_owned(),
        is_default: false,
        games,
    }
}

struct Harness {
    engine: LibraryEngine<FakeProvider>,
    provider: FakeProvider,
    events: broadcast::Sender<LibraryEvent>,
}

async fn start_engine(provider: FakeProvider, config: EngineConfig) -> Harness {
    let engine = LibraryEngine::new(provider.clone(), config);
    let (events, rx) = broadcast::channel(16);
    engine.start(rx).await;
    Harness {
        engine,
        provider,
        events,
    }
}

/// Wait until a collection snapshot has been published.
async fn settle(engine: &LibraryEngine<FakeProvider>) -> Arc<Vec<Collection>> {
    let mut rx = engine.subscribe_collections();
    rx.wait_for(|c| !c.is_empty()).await.unwrap().clone()
}

// ── Aggregation ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn initial_pass_publishes_library_then_collections() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);
    provider.set_collections(vec![remote_collection(
        "favs",
        "Favourites",
        vec![game("b", "Borealis"), game("c", "Caldera")],
    )]);

    let h = start_engine(provider, EngineConfig::default()).await;
    let collections = settle(&h.engine).await;

    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].id, "library");
    assert!(collections[0].is_default);
    assert_eq!(
        collections[0].entries,
        vec![GameId::from("a"), GameId::from("b")]
    );
    assert_eq!(collections[1].id, "favs");

    let sections = h.engine.nav_sections();
    assert_eq!(sections.len(), 2);
    assert!(sections[0].default_open);
    assert_eq!(sections[1].items.len(), 2);
    assert_eq!(sections[1].items[1].label, "Caldera");

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn games_are_deduplicated_by_id_across_sources() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);
    provider.set_collections(vec![remote_collection(
        "favs",
        "Favourites",
        vec![game("b", "Borealis (copy)"), game("c", "Caldera")],
    )]);

    let h = start_engine(provider, EngineConfig::default()).await;
    let collections = settle(&h.engine).await;

    // Primary list defines the Library; the collection-only game is
    // registered but not added to it.
    assert_eq!(
        collections[0].entries,
        vec![GameId::from("a"), GameId::from("b")]
    );
    assert_eq!(h.engine.store().registry().len(), 3);

    // First sight wins: the primary list's metadata is canonical.
    let entry = h.engine.game(&GameId::from("b")).unwrap();
    assert_eq!(entry.game().name, "Borealis");

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn icons_resolve_once_and_are_cached() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;

    let mut rx = h.engine.subscribe_loading();
    rx.wait_for(|loading| !loading).await.unwrap();
    // Icon resolution runs within the pass; give it a turn to finish.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.provider.icon_calls(), 2);
    let icon = h.engine.icon(&GameId::from("a")).unwrap();
    assert_eq!(icon.content_type, "image/png");
    assert_eq!(icon.bytes.as_ref(), b"icon-a");

    // A refresh re-fetches lists but not already-cached icons.
    h.engine.refresh().await.unwrap();
    assert_eq!(h.provider.icon_calls(), 2);

    h.engine.shutdown().await;
}

// ── Live updates ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn status_push_flips_installed_without_refetch() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora")]);

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;
    let calls_before = h.provider.library_calls();

    let mut nav_rx = h.engine.subscribe_nav();
    nav_rx.borrow_and_update();
    let entry = h.engine.game(&GameId::from("a")).unwrap();
    assert_eq!(entry.status(), GameStatus::Remote);

    h.events
        .send(LibraryEvent::GameStatus {
            game_id: GameId::from("a"),
            status: GameStatus::Installed,
        })
        .unwrap();

    let sections = nav_rx.wait_for(|s| s[0].items[0].installed).await.unwrap();
    assert_eq!(sections[0].items[0].label, "Aurora");
    drop(sections);

    assert_eq!(entry.status(), GameStatus::Installed);
    assert_eq!(h.provider.library_calls(), calls_before);

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn status_push_for_unknown_game_is_dropped() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora")]);

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;
    let mut nav_rx = h.engine.subscribe_nav();
    nav_rx.borrow_and_update();

    h.events
        .send(LibraryEvent::GameStatus {
            game_id: GameId::from("ghost"),
            status: GameStatus::Installed,
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!nav_rx.has_changed().unwrap());
    assert_eq!(h.engine.store().registry().len(), 1);

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn library_change_signal_reaggregates_and_reroutes_vanished_game() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;

    h.engine.navigate(game_route(&GameId::from("b")));
    let mut route_rx = h.engine.subscribe_route();
    route_rx.borrow_and_update();

    h.provider.set_library(vec![game("a", "Aurora")]);
    h.events.send(LibraryEvent::LibraryChanged).unwrap();

    let route = route_rx.wait_for(|r| r == LIBRARY_ROOT_ROUTE).await.unwrap();
    assert_eq!(*route, LIBRARY_ROOT_ROUTE);
    drop(route);

    // The registry never forgets: the vanished game keeps its entry and
    // status cell, it just stops appearing in the published tree.
    assert!(h.engine.game(&GameId::from("b")).is_some());
    let sections = h.engine.nav_sections();
    assert_eq!(sections[0].items.len(), 1);

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn route_to_surviving_game_is_untouched_by_refresh() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;

    let target = game_route(&GameId::from("a"));
    h.engine.navigate(target.clone());

    h.events.send(LibraryEvent::LibraryChanged).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(h.engine.route(), target);

    h.engine.shutdown().await;
}

// ── Bootstrap gate ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn fast_initial_pass_opens_gate_before_timeout() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora")]);
    provider.set_fetch_delay(Duration::from_millis(50));

    let started = Instant::now();
    let h = start_engine(provider, EngineConfig::default()).await;

    let mut ready_rx = h.engine.subscribe_ready();
    ready_rx.wait_for(|ready| *ready).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(!h.engine.collections().is_empty());

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_initial_pass_opens_gate_at_timeout_and_publishes_late() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora")]);
    provider.set_fetch_delay(Duration::from_secs(10));

    let started = Instant::now();
    let h = start_engine(provider, EngineConfig::default()).await;

    let mut ready_rx = h.engine.subscribe_ready();
    ready_rx.wait_for(|ready| *ready).await.unwrap();

    // Gate opened by the timer, pass still in flight.
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(h.engine.collections().is_empty());
    assert!(h.engine.is_loading());

    // The late pass still lands.
    let collections = settle(&h.engine).await;
    assert_eq!(collections[0].entries.len(), 1);
    assert!(!h.engine.is_loading());

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_initial_pass_opens_gate_and_clears_loading() {
    let provider = FakeProvider::default();
    provider.set_failing(true);

    let h = start_engine(provider, EngineConfig::default()).await;

    let mut ready_rx = h.engine.subscribe_ready();
    ready_rx.wait_for(|ready| *ready).await.unwrap();
    let mut loading_rx = h.engine.subscribe_loading();
    loading_rx.wait_for(|loading| !loading).await.unwrap();

    assert!(h.engine.collections().is_empty());
    assert!(h.engine.nav_sections().is_empty());

    // Recovery: the backend comes back and a manual refresh succeeds.
    h.provider.set_failing(false);
    h.provider.set_library(vec![game("a", "Aurora")]);
    h.engine.refresh().await.unwrap();
    assert_eq!(h.engine.collections().len(), 1);

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_last_good_snapshot() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);

    let h = start_engine(provider, EngineConfig::default()).await;
    let before = settle(&h.engine).await;

    h.provider.set_failing(true);
    h.engine.refresh().await.unwrap_err();

    // The model retains its last-good value, and a non-initial pass
    // never flashed the loading indicator.
    assert_eq!(*h.engine.collections(), *before);
    assert_eq!(h.engine.nav_sections()[0].items.len(), 2);
    assert!(!h.engine.is_loading());

    h.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_are_serialized() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora")]);
    provider.set_fetch_delay(Duration::from_millis(100));

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;

    let (first, second) = tokio::join!(h.engine.refresh(), h.engine.refresh());
    first.unwrap();
    second.unwrap();

    // Queued, not interleaved: at no point did two passes fetch at once.
    assert_eq!(h.provider.max_overlapping_fetches(), 1);
    assert_eq!(h.provider.library_calls(), 3);
    assert_eq!(h.engine.collections().len(), 1);

    h.engine.shutdown().await;
}

// ── Search ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn search_filters_published_tree() {
    let provider = FakeProvider::default();
    provider.set_library(vec![game("a", "Aurora"), game("b", "Borealis")]);
    provider.set_collections(vec![remote_collection(
        "favs",
        "Favourites",
        vec![game("b", "Borealis")],
    )]);

    let h = start_engine(provider, EngineConfig::default()).await;
    settle(&h.engine).await;

    let all = h.engine.search("");
    assert_eq!(all.len(), 2);

    let hits = h.engine.search("bore");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].items.len(), 1);
    assert_eq!(hits[0].items[0].label, "Borealis");

    assert!(h.engine.search("zzz").is_empty());

    h.engine.shutdown().await;
}
