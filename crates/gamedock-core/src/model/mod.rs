//! Canonical domain types for the library engine.

pub mod collection;
pub mod event;
pub mod game;

pub use collection::{Collection, LIBRARY_COLLECTION_ID, LIBRARY_COLLECTION_NAME, RemoteCollection};
pub use event::LibraryEvent;
pub use game::{Game, GameId, GameStatus, IconResource, ObjectId, StatusAccent};
