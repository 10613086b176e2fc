//! In-process test double for the data store.
//!
//! It behaves like the hosted service closely enough for the catalog: rows
//! are JSON objects with store-assigned `id` and `created_at`, `eq`/`ilike`
//! filters and single-column ordering work the same way, and sign-in and
//! sign-out publish auth events. On top of that it counts calls and can be
//! told to fail. No binary wires it in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use aitoonic_core::store::{
    AccessToken, AuthEvent, AuthSubscription, Credentials, DataStore, Filter, Select, Session,
    StoreError, StoreResult,
};
use aitoonic_core::{Table, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

const AUTH_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct User {
    id: UserId,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct Failures {
    reads: HashMap<Table, String>,
    writes: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<Table, Vec<Map<String, Value>>>,
    users: Vec<User>,
    sessions: HashMap<String, Session>,
    last_created: Option<DateTime<Utc>>,
}

/// In-memory [`DataStore`].
///
/// Cloning shares the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    failures: Arc<Mutex<Failures>>,
    events: broadcast::Sender<AuthEvent>,
    data_calls: Arc<AtomicU64>,
    write_calls: Arc<AtomicU64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            inner: Arc::default(),
            failures: Arc::default(),
            events,
            data_calls: Arc::default(),
            write_calls: Arc::default(),
        }
    }

    /// Register a user who can sign in with `email` and `password`.
    #[must_use]
    pub fn with_user(self, email: &str, password: &str) -> Self {
        if let Ok(mut inner) = self.inner.try_write() {
            inner.users.push(User {
                id: UserId::new(Uuid::new_v4().to_string()),
                email: email.to_string(),
                password: password.to_string(),
            });
        }
        self
    }

    /// Insert a row directly, bypassing counters and failure injection.
    ///
    /// Missing `id` and `created_at` fields are filled in. Returns the row.
    pub async fn seed(&self, table: Table, row: Value) -> Value {
        let mut inner = self.inner.write().await;
        let stored = inner.store_row(table, row);
        Value::Object(stored)
    }

    /// Drop every session for `user_id` as if it expired on the server.
    ///
    /// No event is published.
    pub async fn expire_sessions(&self, user_id: &UserId) {
        self.inner
            .write()
            .await
            .sessions
            .retain(|_, session| &session.user_id != user_id);
    }

    /// Publish an auth event to every subscriber.
    pub fn publish(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Make reads of `table` fail with `message`.
    pub fn fail_reads(&self, table: Table, message: &str) {
        self.failures().reads.insert(table, message.to_string());
    }

    /// Make inserts and updates fail with `message`.
    pub fn fail_writes(&self, message: &str) {
        self.failures().writes = Some(message.to_string());
    }

    /// Remove every injected failure.
    pub fn clear_failures(&self) {
        *self.failures() = Failures::default();
    }

    /// Number of data calls (select, count, insert, update) served so far.
    #[must_use]
    pub fn data_calls(&self) -> u64 {
        self.data_calls.load(Ordering::SeqCst)
    }

    /// Number of insert and update calls served so far.
    #[must_use]
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Live auth subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Snapshot of every row in `table`, in insertion order.
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.inner
            .read()
            .await
            .tables
            .get(&table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_read(&self, table: Table) -> StoreResult<()> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        match self.failures().reads.get(&table) {
            Some(message) => Err(StoreError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> StoreResult<()> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match &self.failures().writes {
            Some(message) => Err(StoreError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Inner {
    /// Strictly increasing creation time, so newest-first ordering is total.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(next);
        next
    }

    fn store_row(&mut self, table: Table, row: Value) -> Map<String, Value> {
        let mut object = match row {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        if !object.get("id").is_some_and(Value::is_string) {
            object.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !object.contains_key("created_at") {
            let created_at = self
                .next_created_at()
                .to_rfc3339_opts(SecondsFormat::Micros, true);
            object.insert("created_at".to_string(), Value::String(created_at));
        }
        self.tables.entry(table).or_default().push(object.clone());
        object
    }
}

fn text(row: &Map<String, Value>, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches(row: &Map<String, Value>, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq { column, value } => text(row, column).as_deref() == Some(value.as_str()),
        Filter::ILike { column, value } => {
            text(row, column).is_some_and(|v| v.to_lowercase() == value.to_lowercase())
        }
    })
}

fn sort(rows: &mut [Map<String, Value>], column: &str, ascending: bool) {
    rows.sort_by(|a, b| {
        let ordering = text(a, column).cmp(&text(b, column));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn authenticate(&self, credentials: &Credentials) -> StoreResult<Session> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter()
            .find(|u| u.email == credentials.email && u.password == credentials.password)
            .cloned()
            .ok_or_else(|| StoreError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;

        let session = Session {
            user_id: user.id,
            email: user.email,
            access_token: AccessToken::new(Uuid::new_v4().to_string()),
        };
        inner
            .sessions
            .insert(session.access_token.expose().to_string(), session.clone());
        drop(inner);

        debug!(user_id = %session.user_id, "Signed in");
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn get_session(&self, token: &AccessToken) -> StoreResult<Option<Session>> {
        Ok(self.inner.read().await.sessions.get(token.expose()).cloned())
    }

    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()> {
        let removed = self.inner.write().await.sessions.remove(token.expose());
        if let Some(session) = removed {
            debug!(user_id = %session.user_id, "Signed out");
            self.publish(AuthEvent::SignedOut {
                user_id: session.user_id,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }

    async fn select(
        &self,
        table: Table,
        query: &Select,
        _token: Option<&AccessToken>,
    ) -> StoreResult<Vec<Value>> {
        self.check_read(table)?;

        let inner = self.inner.read().await;
        let mut rows: Vec<_> = inner
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(inner);

        if let Some(order) = &query.order {
            sort(&mut rows, &order.column, order.ascending);
        }
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        _token: Option<&AccessToken>,
    ) -> StoreResult<u64> {
        self.check_read(table)?;

        let inner = self.inner.read().await;
        let count = inner
            .tables
            .get(&table)
            .map_or(0, |rows| rows.iter().filter(|row| matches(row, filters)).count());
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert(
        &self,
        table: Table,
        record: &Value,
        _token: Option<&AccessToken>,
    ) -> StoreResult<Value> {
        self.check_write()?;

        let mut record = record.clone();
        if let Value::Object(object) = &mut record {
            object.remove("id");
            object.remove("created_at");
        }
        let stored = self.inner.write().await.store_row(table, record);
        Ok(Value::Object(stored))
    }

    async fn update(
        &self,
        table: Table,
        id: &str,
        record: &Value,
        _token: Option<&AccessToken>,
    ) -> StoreResult<Value> {
        self.check_write()?;

        let mut inner = self.inner.write().await;
        let row = inner
            .tables
            .get_mut(&table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Value::Object(fields) = record {
            for (key, value) in fields {
                if key != "id" && key != "created_at" {
                    row.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(Value::Object(row.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_increasing_created_at() {
        let store = MemoryStore::new();
        let first = store
            .insert(Table::Categories, &json!({"name": "A"}), None)
            .await
            .unwrap();
        let second = store
            .insert(Table::Categories, &json!({"name": "B"}), None)
            .await
            .unwrap();

        assert!(first["id"].is_string());
        assert_ne!(first["id"], second["id"]);
        assert!(second["created_at"].as_str() > first["created_at"].as_str());
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let store = MemoryStore::new();
        store.seed(Table::Tools, json!({"name": "Old", "category_id": "c1"})).await;
        store.seed(Table::Tools, json!({"name": "Other", "category_id": "c2"})).await;
        store.seed(Table::Tools, json!({"name": "New", "category_id": "c1"})).await;

        let query = Select::all()
            .filter(Filter::eq("category_id", "c1"))
            .order_by("created_at", false);
        let rows = store.select(Table::Tools, &query, None).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["New", "Old"]);

        let count = store
            .count(Table::Tools, &[Filter::eq("category_id", "c2")], None)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_ilike_is_case_insensitive_exact() {
        let store = MemoryStore::new();
        store.seed(Table::Categories, json!({"name": "Image Generation"})).await;
        store.seed(Table::Categories, json!({"name": "Image Generation Pro"})).await;

        let query = Select::all().filter(Filter::ilike("name", "image generation"));
        let rows = store.select(Table::Categories, &query, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Image Generation");
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let row = store
            .seed(Table::Categories, json!({"name": "A", "description": "x"}))
            .await;
        let id = row["id"].as_str().unwrap();

        let updated = store
            .update(Table::Categories, id, &json!({"name": "B"}), None)
            .await
            .unwrap();
        assert_eq!(updated["name"], "B");
        assert_eq!(updated["description"], "x");
        assert_eq!(updated["created_at"], row["created_at"]);

        let missing = store
            .update(Table::Categories, "nope", &json!({"name": "C"}), None)
            .await;
        assert_eq!(missing, Err(StoreError::NotFound("nope".to_string())));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail_reads(Table::Tools, "tools offline");
        store.fail_writes("read-only");

        let read = store.select(Table::Tools, &Select::all(), None).await;
        assert_eq!(read.unwrap_err().to_string(), "tools offline");
        assert!(store.select(Table::Agents, &Select::all(), None).await.is_ok());

        let write = store.insert(Table::Agents, &json!({}), None).await;
        assert_eq!(write.unwrap_err().to_string(), "read-only");
        assert!(store.rows(Table::Agents).await.is_empty());

        store.clear_failures();
        assert!(store.select(Table::Tools, &Select::all(), None).await.is_ok());
        assert_eq!(store.data_calls(), 4);
    }

    #[tokio::test]
    async fn test_auth_lifecycle_publishes_events() {
        let store = MemoryStore::new().with_user("admin@example.com", "pw");
        let mut events = store.subscribe();
        assert_eq!(store.subscriber_count(), 1);

        let bad = store
            .authenticate(&Credentials::new("admin@example.com", "wrong"))
            .await;
        assert_eq!(bad.unwrap_err().to_string(), "Invalid login credentials");

        let session = store
            .authenticate(&Credentials::new("admin@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(
            events.recv().await,
            Some(AuthEvent::SignedIn(session.clone()))
        );
        assert_eq!(
            store.get_session(&session.access_token).await.unwrap(),
            Some(session.clone())
        );

        store.sign_out(&session.access_token).await.unwrap();
        assert_eq!(
            events.recv().await,
            Some(AuthEvent::SignedOut {
                user_id: session.user_id.clone()
            })
        );
        assert_eq!(store.get_session(&session.access_token).await.unwrap(), None);

        drop(events);
        assert_eq!(store.subscriber_count(), 0);
    }
}
