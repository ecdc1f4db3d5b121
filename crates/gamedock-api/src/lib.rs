// gamedock-api: Async Rust client for the Gamedock game backend

pub mod client;
pub mod error;
pub mod events;
pub mod transport;
pub mod types;

pub use client::{BackendClient, BackendConfig};
pub use error::Error;
pub use events::{BackendEvent, EventStreamHandle, ReconnectConfig};
pub use types::{CollectionDoc, CollectionEntryDoc, GameDoc, GameStatusDoc, ObjectResource};
