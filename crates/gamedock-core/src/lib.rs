//! Reactive game-library layer between `gamedock-api` and UI consumers.
//!
//! This crate owns the business logic, domain model, and reactive state
//! for the Gamedock workspace:
//!
//! - **[`LibraryEngine`]** — Central facade managing the session:
//!   [`start()`](LibraryEngine::start) runs the initial aggregation pass,
//!   spawns the live-update listener, and gates first paint on a
//!   readiness flag that opens when the pass completes or a short timeout
//!   elapses, whichever comes first.
//!
//! - **[`LibraryStore`]** — Reactive storage: a durable game registry
//!   (`DashMap` + per-game `tokio::sync::watch` status cells), an icon
//!   cache, and wholesale-replaced snapshots of the collection list and
//!   the derived navigation tree.
//!
//! - **[`LibraryProvider`]** — The backend seam. `BackendClient` from
//!   `gamedock-api` implements it for production; tests substitute an
//!   in-memory provider.
//!
//! - **Domain model** ([`model`]) — `Game`, `GameStatus` (ten lifecycle
//!   states), `Collection`, and the push-event vocabulary, keyed by
//!   opaque [`GameId`]s.

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod model;
pub mod nav;
pub mod provider;
pub mod search;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::EngineConfig;
pub use engine::LibraryEngine;
pub use error::CoreError;
pub use provider::{LibraryProvider, bridge_events};
pub use store::{GameRegistry, LibraryStore, RegistryEntry};

pub use nav::{LIBRARY_ROOT_ROUTE, NavItem, NavSection, game_route};
pub use search::{FilteredSection, filter_sections};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Collection, Game, GameId, GameStatus, IconResource, LibraryEvent, ObjectId, RemoteCollection,
    StatusAccent, LIBRARY_COLLECTION_ID, LIBRARY_COLLECTION_NAME,
};
