// ── Wire → domain conversions ──
//
// Raw `gamedock-api` documents become canonical model types here, and
// nowhere else. Collection entries keep their embedded games so the
// aggregator can register games that only exist inside a collection.

use gamedock_api::{CollectionDoc, GameDoc, GameStatusDoc};

use crate::model::{Game, GameId, GameStatus, ObjectId, RemoteCollection};

impl From<GameDoc> for Game {
    fn from(doc: GameDoc) -> Self {
        Self {
            id: GameId::new(doc.id),
            name: doc.m_name,
            icon: ObjectId::new(doc.m_icon_object_id),
        }
    }
}

impl From<CollectionDoc> for RemoteCollection {
    fn from(doc: CollectionDoc) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            is_default: doc.is_default,
            games: doc.entries.into_iter().map(|e| e.game.into()).collect(),
        }
    }
}

impl From<GameStatusDoc> for GameStatus {
    fn from(doc: GameStatusDoc) -> Self {
        match doc {
            GameStatusDoc::Remote => Self::Remote,
            GameStatusDoc::Queued => Self::Queued,
            GameStatusDoc::Downloading => Self::Downloading,
            GameStatusDoc::Validating => Self::Validating,
            GameStatusDoc::Updating => Self::Updating,
            GameStatusDoc::Installed => Self::Installed,
            GameStatusDoc::SetupRequired => Self::SetupRequired,
            GameStatusDoc::PartiallyInstalled => Self::PartiallyInstalled,
            GameStatusDoc::Running => Self::Running,
            GameStatusDoc::Uninstalling => Self::Uninstalling,
        }
    }
}
