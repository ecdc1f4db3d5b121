// ── Backend seam ──
//
// The engine reaches the backend only through this trait: two list
// fetches and icon resolution. Status pushes and library-change signals
// arrive separately, through the event stream (see `bridge_events`).
// Tests substitute an in-memory implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gamedock_api::{BackendClient, BackendEvent};

use crate::error::CoreError;
use crate::model::{Game, GameId, IconResource, LibraryEvent, ObjectId, RemoteCollection};

/// The external game backend, seen from the engine.
///
/// `hard_refresh` asks the implementation to bypass any response cache it
/// keeps. All methods are `Send` futures so the engine can drive them
/// from spawned tasks.
pub trait LibraryProvider: Send + Sync + 'static {
    /// The primary/default game list.
    fn fetch_library(
        &self,
        hard_refresh: bool,
    ) -> impl Future<Output = Result<Vec<Game>, CoreError>> + Send;

    /// All named collections, entry games embedded.
    fn fetch_collections(
        &self,
        hard_refresh: bool,
    ) -> impl Future<Output = Result<Vec<RemoteCollection>, CoreError>> + Send;

    /// Resolve an opaque icon reference to a displayable resource.
    fn resolve_icon(
        &self,
        icon: &ObjectId,
    ) -> impl Future<Output = Result<IconResource, CoreError>> + Send;
}

impl LibraryProvider for BackendClient {
    async fn fetch_library(&self, hard_refresh: bool) -> Result<Vec<Game>, CoreError> {
        let docs = BackendClient::fetch_library(self, hard_refresh).await?;
        Ok(docs.into_iter().map(Game::from).collect())
    }

    async fn fetch_collections(
        &self,
        hard_refresh: bool,
    ) -> Result<Vec<RemoteCollection>, CoreError> {
        let docs = BackendClient::fetch_collections(self, hard_refresh).await?;
        Ok(docs.into_iter().map(RemoteCollection::from).collect())
    }

    async fn resolve_icon(&self, icon: &ObjectId) -> Result<IconResource, CoreError> {
        let resource = self.fetch_object(icon.as_str()).await?;
        Ok(IconResource {
            content_type: resource.content_type,
            bytes: resource.bytes,
        })
    }
}

// ── Event bridge ─────────────────────────────────────────────────────

/// Bridge raw backend events into domain [`LibraryEvent`]s.
///
/// Spawns a mapping task that runs until the token is cancelled or the
/// source stream closes. Lagged receivers are logged and skipped — a
/// later `LibraryChanged` signal re-synchronizes everything anyway.
pub fn bridge_events(
    mut source: broadcast::Receiver<Arc<BackendEvent>>,
    cancel: CancellationToken,
) -> broadcast::Receiver<LibraryEvent> {
    let (tx, rx) = broadcast::channel(256);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = source.recv() => {
                    match result {
                        Ok(event) => {
                            let mapped = match event.as_ref() {
                                BackendEvent::LibraryUpdated => LibraryEvent::LibraryChanged,
                                BackendEvent::GameStatus { game_id, status } => {
                                    LibraryEvent::GameStatus {
                                        game_id: GameId::new(game_id.clone()),
                                        status: (*status).into(),
                                    }
                                }
                            };
                            let _ = tx.send(mapped);
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "event bridge: receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
        debug!("event bridge exiting");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamedock_api::GameStatusDoc;

    use crate::model::GameStatus;

    #[tokio::test]
    async fn bridge_maps_raw_events_to_domain() {
        let (raw_tx, raw_rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let mut rx = bridge_events(raw_rx, cancel.clone());

        raw_tx.send(Arc::new(BackendEvent::LibraryUpdated)).unwrap();
        raw_tx
            .send(Arc::new(BackendEvent::GameStatus {
                game_id: "game-a".to_owned(),
                status: GameStatusDoc::Installed,
            }))
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), LibraryEvent::LibraryChanged);
        assert_eq!(
            rx.recv().await.unwrap(),
            LibraryEvent::GameStatus {
                game_id: GameId::from("game-a"),
                status: GameStatus::Installed,
            }
        );

        cancel.cancel();
    }

    #[tokio::test]
    async fn bridge_exits_when_source_closes() {
        let (raw_tx, raw_rx) = broadcast::channel::<Arc<BackendEvent>>(16);
        let mut rx = bridge_events(raw_rx, CancellationToken::new());

        drop(raw_tx);

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
