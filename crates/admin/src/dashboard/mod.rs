//! Admin dashboard state.
//!
//! The dashboard is the list panel plus the editor panel. All of it (active
//! tab, search term, last rows read, open draft) lives in the HTTP session
//! and is loaded and stored around each request.

pub mod editor;
pub mod guard;
pub mod list;
pub mod notify;

use aitoonic_core::EntityKind;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

pub use editor::EditorPanel;
pub use guard::{SessionGuard, SignedOut};
pub use list::{FetchTicket, Fetched, ListPanel};
pub use notify::{Level, Notice, Notices, push_flash, take_flash};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    pub list: ListPanel,
    pub editor: EditorPanel,
}

impl Dashboard {
    /// Load the dashboard from the session, or start a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get(session_keys::DASHBOARD)
            .await?
            .unwrap_or_default())
    }

    /// Persist the dashboard into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn store(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::DASHBOARD, self).await
    }

    /// Forget the dashboard state (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(session_keys::DASHBOARD).await?;
        Ok(())
    }

    /// Switch tabs. Changing tab discards the open draft.
    ///
    /// Returns `false` if `kind` was already active.
    pub fn switch_tab(&mut self, kind: EntityKind) -> bool {
        let changed = self.list.switch_tab(kind);
        if changed {
            self.editor.close();
        }
        changed
    }

    /// Open a blank draft of the active kind.
    pub fn open_new(&mut self) {
        self.editor.open_new(self.list.active());
    }

    /// Open the listed entry with `id` in the editor.
    ///
    /// Returns `false` if the current list has no such entry.
    pub fn select(&mut self, id: &str) -> bool {
        match self.list.find(id) {
            Some(entity) => {
                self.editor.select(entity);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use aitoonic_core::store::AccessToken;
    use aitoonic_core::{Draft, Table};
    use aitoonic_store::MemoryStore;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_switching_tab_discards_draft() {
        let mut dashboard = Dashboard::default();
        dashboard.open_new();
        assert_eq!(dashboard.editor.draft().map(Draft::kind), Some(EntityKind::Category));

        dashboard.switch_tab(EntityKind::Category);
        assert!(dashboard.editor.is_open());

        dashboard.switch_tab(EntityKind::Tool);
        assert!(!dashboard.editor.is_open());

        dashboard.open_new();
        assert_eq!(dashboard.editor.draft().map(Draft::kind), Some(EntityKind::Tool));
    }

    #[tokio::test]
    async fn test_select_from_saved_list() {
        let store = MemoryStore::new();
        let token = AccessToken::new("t");
        let mut dashboard = Dashboard::default();
        dashboard.open_new();
        dashboard.editor.apply_form(&[
            ("name".to_string(), "Video".to_string()),
            ("description".to_string(), "Clips".to_string()),
        ]);

        let mut notices = Notices::new();
        assert!(dashboard.editor.save(&store, &token, &mut notices).await);
        dashboard.list.refresh(&store, &token, &mut notices).await;
        assert_eq!(dashboard.list.items().len(), 1);
        let id = dashboard.list.items()[0].id().to_string();
        assert!(dashboard.select(&id));
        assert!(dashboard.editor.draft().is_some_and(|d| !d.is_new()));
    }

    #[tokio::test]
    async fn test_select_unknown_id() {
        let store = MemoryStore::new();
        store
            .seed(Table::Categories, json!({"name": "Image", "description": "Pictures"}))
            .await;
        let mut dashboard = Dashboard::default();
        dashboard
            .list
            .refresh(&store, &AccessToken::new("t"), &mut Notices::new())
            .await;

        assert!(!dashboard.select("missing"));
        assert!(!dashboard.editor.is_open());
    }

    #[tokio::test]
    async fn test_round_trips_through_session() {
        let store = MemoryStore::new();
        store
            .seed(Table::Agents, json!({"name": "Scout", "description": "Finds"}))
            .await;
        let session = Session::new(None, Arc::new(tower_sessions::MemoryStore::default()), None);
        let mut dashboard = Dashboard::default();
        dashboard.switch_tab(EntityKind::Agent);
        dashboard
            .list
            .refresh(&store, &AccessToken::new("t"), &mut Notices::new())
            .await;
        dashboard.list.set_search("scout");
        dashboard.open_new();
        dashboard.store(&session).await.unwrap();

        let loaded = Dashboard::load(&session).await.unwrap();
        assert_eq!(loaded.list.active(), EntityKind::Agent);
        assert_eq!(loaded.list.search(), "scout");
        assert_eq!(loaded.list.items().len(), 1);
        assert_eq!(loaded.editor.draft().map(Draft::kind), Some(EntityKind::Agent));

        Dashboard::clear(&session).await.unwrap();
        assert_eq!(Dashboard::load(&session).await.unwrap().list.active(), EntityKind::Category);
    }
}
