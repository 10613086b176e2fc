//! Entity list panel.
//!
//! Shows every entry of the active kind, newest first, narrowed by a local
//! search term. Each fetch carries a [`FetchTicket`]; switching tabs bumps the
//! panel's generation so a fetch issued for the old tab can never overwrite
//! the new tab's list.
//!
//! Reading and applying are separate steps ([`ListPanel::fetch`] and
//! [`ListPanel::apply`]) so a caller can check the ticket against state that
//! changed while the read was in flight.

use aitoonic_core::store::{AccessToken, DataStore, StoreResult, list_categories, list_entities};
use aitoonic_core::{Category, Entity, EntityKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::notify::Notices;

/// Identifies the tab state a fetch was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: EntityKind,
    pub generation: u64,
}

/// A finished read, not yet applied to any panel.
#[derive(Debug)]
pub struct Fetched {
    pub ticket: FetchTicket,
    items: StoreResult<Vec<Entity>>,
    /// Only read for the tools tab.
    categories: Option<StoreResult<Vec<Category>>>,
}

/// List state, including the last rows read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPanel {
    active: EntityKind,
    generation: u64,
    search: String,
    #[serde(default)]
    items: Vec<Entity>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl ListPanel {
    #[must_use]
    pub const fn active(&self) -> EntityKind {
        self.active
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Change the search term. Filtering is local, so no fetch is needed.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Make `kind` the active tab.
    ///
    /// Returns `false` if it already was. Otherwise the current rows are
    /// dropped and any fetch still in flight becomes stale.
    pub fn switch_tab(&mut self, kind: EntityKind) -> bool {
        if kind == self.active {
            return false;
        }
        self.active = kind;
        self.generation = self.generation.wrapping_add(1);
        self.items.clear();
        self.categories.clear();
        true
    }

    #[must_use]
    pub const fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            kind: self.active,
            generation: self.generation,
        }
    }

    fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket == self.begin_fetch()
    }

    /// Apply a finished entity fetch.
    ///
    /// A stale ticket is ignored. On error the previous rows stay and a
    /// notice is raised. Returns whether the result was applied.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: StoreResult<Vec<Entity>>,
        notices: &mut Notices,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(kind = %ticket.kind, "Discarding stale fetch");
            return false;
        }
        match result {
            Ok(items) => self.items = items,
            Err(e) => {
                warn!(error = %e, table = %ticket.kind.table(), "List fetch failed");
                notices.push_error(format!("Failed to fetch {}", ticket.kind.table()));
            }
        }
        true
    }

    /// Apply a finished category fetch (tools tab picker).
    pub fn complete_categories(
        &mut self,
        ticket: FetchTicket,
        result: StoreResult<Vec<Category>>,
        notices: &mut Notices,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale category fetch");
            return false;
        }
        match result {
            Ok(categories) => self.categories = categories,
            Err(e) => {
                warn!(error = %e, "Category fetch failed");
                notices.push_error("Failed to fetch categories");
            }
        }
        true
    }

    /// Read the rows for `ticket`. The tools tab also reads the category
    /// list, concurrently.
    pub async fn fetch(store: &dyn DataStore, token: &AccessToken, ticket: FetchTicket) -> Fetched {
        if ticket.kind == EntityKind::Tool {
            let (items, categories) = tokio::join!(
                list_entities(store, ticket.kind, Some(token)),
                list_categories(store, Some(token)),
            );
            Fetched {
                ticket,
                items,
                categories: Some(categories),
            }
        } else {
            Fetched {
                ticket,
                items: list_entities(store, ticket.kind, Some(token)).await,
                categories: None,
            }
        }
    }

    /// Apply a finished read. Returns `false` if its ticket is stale.
    pub fn apply(&mut self, fetched: Fetched, notices: &mut Notices) -> bool {
        let Fetched {
            ticket,
            items,
            categories,
        } = fetched;
        if !self.complete_fetch(ticket, items, notices) {
            return false;
        }
        if let Some(categories) = categories {
            self.complete_categories(ticket, categories, notices);
        }
        true
    }

    /// Re-read the active tab in place.
    pub async fn refresh(&mut self, store: &dyn DataStore, token: &AccessToken, notices: &mut Notices) {
        let fetched = Self::fetch(store, token, self.begin_fetch()).await;
        self.apply(fetched, notices);
    }

    #[must_use]
    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Rows whose name or description contains the search term, ignoring
    /// case. A blank term matches everything; otherwise the term is used as
    /// typed, surrounding spaces included.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Entity> {
        if self.search.trim().is_empty() {
            return self.items.iter().collect();
        }
        let needle = self.search.to_lowercase();
        self.items.iter().filter(|e| e.matches(&needle)).collect()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Entity> {
        self.items.iter().find(|e| e.id() == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aitoonic_core::{StoreError, Table};
    use aitoonic_store::MemoryStore;
    use serde_json::json;

    use super::*;

    fn token() -> AccessToken {
        AccessToken::new("t")
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(Table::Categories, json!({"name": "Image", "description": "Pictures"}))
            .await;
        store
            .seed(Table::Categories, json!({"name": "Audio", "description": "Sound and voice"}))
            .await;
        store
            .seed(Table::Agents, json!({"name": "Scout", "description": "Finds things"}))
            .await;
        store
    }

    #[tokio::test]
    async fn test_refresh_lists_newest_first() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        let mut notices = Notices::new();

        panel.refresh(&store, &token(), &mut notices).await;

        let names: Vec<_> = panel.items().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Audio", "Image"]);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_tools_tab_also_reads_categories_by_name() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        panel.switch_tab(EntityKind::Tool);

        panel.refresh(&store, &token(), &mut Notices::new()).await;

        assert!(panel.items().is_empty());
        let names: Vec<_> = panel.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Audio", "Image"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_rows() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        let mut notices = Notices::new();
        panel.refresh(&store, &token(), &mut notices).await;

        store.fail_reads(Table::Categories, "boom");
        panel.refresh(&store, &token(), &mut notices).await;

        assert_eq!(panel.items().len(), 2);
        let messages: Vec<_> = notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["Failed to fetch categories"]);
    }

    #[tokio::test]
    async fn test_failed_category_picker_read() {
        let store = seeded().await;
        store.fail_reads(Table::Categories, "boom");
        let mut panel = ListPanel::default();
        panel.switch_tab(EntityKind::Tool);
        let mut notices = Notices::new();

        panel.refresh(&store, &token(), &mut notices).await;

        let messages: Vec<_> = notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["Failed to fetch categories"]);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut panel = ListPanel::default();
        let stale = panel.begin_fetch();
        assert!(panel.switch_tab(EntityKind::Agent));

        let mut notices = Notices::new();
        let applied = panel.complete_fetch(
            stale,
            Err(StoreError::Transport("late".to_string())),
            &mut notices,
        );

        assert!(!applied);
        assert!(notices.is_empty());
        assert!(panel.items().is_empty());
        assert!(!panel.complete_categories(stale, Ok(Vec::new()), &mut notices));
    }

    #[tokio::test]
    async fn test_stale_rows_never_replace_new_tab() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        let stale = panel.begin_fetch();
        let category_rows = list_entities(&store, EntityKind::Category, None).await;

        panel.switch_tab(EntityKind::Agent);
        panel.refresh(&store, &token(), &mut Notices::new()).await;
        panel.complete_fetch(stale, category_rows, &mut Notices::new());

        let names: Vec<_> = panel.items().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Scout"]);
    }

    #[test]
    fn test_switching_to_same_tab_keeps_generation() {
        let mut panel = ListPanel::default();
        let ticket = panel.begin_fetch();
        assert!(!panel.switch_tab(EntityKind::Category));
        assert_eq!(panel.begin_fetch(), ticket);
    }

    #[tokio::test]
    async fn test_search_filters_locally() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        panel.refresh(&store, &token(), &mut Notices::new()).await;
        let calls = store.data_calls();

        panel.set_search("VOICE");
        let names: Vec<_> = panel.filtered().into_iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Audio"]);

        panel.set_search("and ");
        let names: Vec<_> = panel.filtered().into_iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Audio"]);

        panel.set_search(" voice ");
        assert!(panel.filtered().is_empty());

        panel.set_search("   ");
        assert_eq!(panel.filtered().len(), 2);
        assert_eq!(store.data_calls(), calls);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        panel.refresh(&store, &token(), &mut Notices::new()).await;

        let id = panel.items()[1].id().to_string();
        assert_eq!(panel.find(&id).map(Entity::name), Some("Image"));
        assert!(panel.find("missing").is_none());
    }

    #[tokio::test]
    async fn test_rows_survive_serialization() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        panel.switch_tab(EntityKind::Agent);
        panel.set_search("scout");
        panel.refresh(&store, &token(), &mut Notices::new()).await;

        let value = serde_json::to_value(&panel).unwrap();
        assert_eq!(value["active"], "agent");
        assert_eq!(value["generation"], 1);

        let restored: ListPanel = serde_json::from_value(value).unwrap();
        assert_eq!(restored.begin_fetch(), panel.begin_fetch());
        let names: Vec<_> = restored.filtered().into_iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Scout"]);
    }

    #[tokio::test]
    async fn test_fetch_applies_only_while_ticket_is_current() {
        let store = seeded().await;
        let mut panel = ListPanel::default();
        panel.switch_tab(EntityKind::Agent);
        let fetched = ListPanel::fetch(&store, &token(), panel.begin_fetch()).await;

        let mut moved_on = panel.clone();
        moved_on.switch_tab(EntityKind::Category);
        let ticket = fetched.ticket;
        assert!(!moved_on.apply(fetched, &mut Notices::new()));
        assert!(moved_on.items().is_empty());

        let fetched = ListPanel::fetch(&store, &token(), ticket).await;
        assert!(panel.apply(fetched, &mut Notices::new()));
        assert_eq!(panel.items().len(), 1);
    }
}
