use std::collections::HashMap;
use std::sync::Arc;

use lifequest_core::{Coach, Persona, Session};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::AppError;
use crate::leaderboard::RivalSource;

pub type SharedSession = Arc<Mutex<Session>>;

/// Session-keyed in-memory store. The per-session mutex serialises
/// mutating operations on one ledger.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub async fn create(&self, persona: Persona, coach: Arc<Coach>) -> Uuid {
        let session_id = Uuid::now_v7();
        let session = Arc::new(Mutex::new(Session::new(persona, coach)));
        self.sessions.write().await.insert(session_id, session);
        session_id
    }

    pub async fn get(&self, session_id: Uuid) -> Result<SharedSession, AppError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| AppError::session_not_found(session_id))
    }

    /// Drop a session. Handlers still holding its `Arc` finish normally.
    pub async fn remove(&self, session_id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&session_id)
            .map(|_| ())
            .ok_or_else(|| AppError::session_not_found(session_id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub coach: Arc<Coach>,
    pub sessions: SessionStore,
    pub rivals: Arc<dyn RivalSource>,
}

#[cfg(test)]
mod tests {
    use lifequest_core::generation::OfflineGenerator;
    use lifequest_core::persona::find_persona;
    use lifequest_core::prompts::PromptTemplates;

    use super::*;

    #[tokio::test]
    async fn removed_sessions_are_gone() {
        let store = SessionStore::default();
        let coach = Arc::new(Coach::new(Arc::new(OfflineGenerator), PromptTemplates::default()));
        let id = store
            .create(find_persona("tom_carter").unwrap(), coach)
            .await;
        assert_eq!(store.len().await, 1);

        store.remove(id).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(store.get(id).await.is_err());
        assert!(store.remove(id).await.is_err());
    }
}
