//! The hosted data store contract.
//!
//! Every component talks to the catalog through [`DataStore`]. The store is
//! the single source of truth: nothing here caches rows or retries calls, and
//! failures are surfaced to the caller as [`StoreError`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::types::{
    Category, CategoryWithCount, Entity, EntityKind, Table, UserId,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors reported by a data store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service rejected the request. Displays as the service's message.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Missing, invalid or expired credentials.
    #[error("invalid login credentials")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    /// A response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Auth
// =============================================================================

/// A bearer token issued by the store's auth service.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// E-mail and password sign-in credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An authenticated session as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub access_token: AccessToken,
}

/// Auth state changes pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut { user_id: UserId },
    TokenRefreshed(Session),
}

/// A live subscription to [`AuthEvent`]s.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    #[must_use]
    pub const fn new(receiver: broadcast::Receiver<AuthEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next event.
    ///
    /// Events missed because the subscriber fell behind are skipped. Returns
    /// `None` once the store stops publishing.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// A row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Column equals the value exactly.
    Eq { column: String, value: String },
    /// Column equals the value ignoring case. Implementations escape `%`, `_`
    /// and `\`; a backend that cannot escape `*` may widen it to a single
    /// character wildcard, so callers needing exact names re-check the rows.
    ILike { column: String, value: String },
}

impl Filter {
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn ilike(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ILike {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    /// Column list; `*` for every column.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Default for Select {
    fn default() -> Self {
        Self {
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }
}

impl Select {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// A hosted relational store with an auth service.
///
/// Data calls take an optional access token; anonymous calls run with the
/// store's public key.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Sign in with e-mail and password.
    async fn authenticate(&self, credentials: &Credentials) -> StoreResult<Session>;

    /// Look up the session behind `token`. `Ok(None)` means no valid session.
    async fn get_session(&self, token: &AccessToken) -> StoreResult<Option<Session>>;

    /// End the session behind `token`.
    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()>;

    /// Subscribe to auth state changes.
    fn subscribe(&self) -> AuthSubscription;

    async fn select(
        &self,
        table: Table,
        query: &Select,
        token: Option<&AccessToken>,
    ) -> StoreResult<Vec<serde_json::Value>>;

    /// Exact row count matching every filter.
    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        token: Option<&AccessToken>,
    ) -> StoreResult<u64>;

    /// Insert one record, returning the stored row.
    async fn insert(
        &self,
        table: Table,
        record: &serde_json::Value,
        token: Option<&AccessToken>,
    ) -> StoreResult<serde_json::Value>;

    /// Replace the fields of the row with `id`, returning the stored row.
    async fn update(
        &self,
        table: Table,
        id: &str,
        record: &serde_json::Value,
        token: Option<&AccessToken>,
    ) -> StoreResult<serde_json::Value>;
}

// =============================================================================
// Typed reads
// =============================================================================

/// Every entry of `kind`, newest first.
///
/// # Errors
///
/// Returns the store error, or [`StoreError::Decode`] for a malformed row.
pub async fn list_entities(
    store: &dyn DataStore,
    kind: EntityKind,
    token: Option<&AccessToken>,
) -> StoreResult<Vec<Entity>> {
    let query = Select::all().order_by("created_at", false);
    let rows = store.select(kind.table(), &query, token).await?;
    rows.into_iter()
        .map(|row| Entity::from_row(kind, row).map_err(StoreError::from))
        .collect()
}

/// Every category, ordered by name.
///
/// # Errors
///
/// Returns the store error, or [`StoreError::Decode`] for a malformed row.
pub async fn list_categories(
    store: &dyn DataStore,
    token: Option<&AccessToken>,
) -> StoreResult<Vec<Category>> {
    let query = Select::all().order_by("name", true);
    let rows = store.select(Table::Categories, &query, token).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

/// Number of tools in a category.
///
/// # Errors
///
/// Returns the store error.
pub async fn count_tools(
    store: &dyn DataStore,
    category: &Category,
    token: Option<&AccessToken>,
) -> StoreResult<u64> {
    let filters = [Filter::eq("category_id", category.id.as_str())];
    store.count(Table::Tools, &filters, token).await
}

/// Keep categories that have tools, most tools first.
///
/// The sort is stable, so categories with equal counts keep their input order.
#[must_use]
pub fn rank_by_tool_count(mut categories: Vec<CategoryWithCount>) -> Vec<CategoryWithCount> {
    categories.retain(|c| c.tool_count > 0);
    categories.sort_by(|a, b| b.tool_count.cmp(&a.tool_count));
    categories
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CategoryId;

    fn counted(name: &str, tool_count: u64) -> CategoryWithCount {
        CategoryWithCount {
            category: Category {
                id: CategoryId::new(name),
                name: name.to_string(),
                description: String::new(),
                seo_title: None,
                seo_description: None,
                created_at: None,
            },
            tool_count,
        }
    }

    #[test]
    fn test_rank_drops_empty_and_keeps_ties_stable() {
        let ranked = rank_by_tool_count(vec![
            counted("Audio", 2),
            counted("Code", 0),
            counted("Image", 5),
            counted("Video", 2),
        ]);

        let names: Vec<_> = ranked.iter().map(|c| c.category.name.as_str()).collect();
        assert_eq!(names, vec!["Image", "Audio", "Video"]);
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-jwt");
        assert!(!format!("{token:?}").contains("secret-jwt"));
        assert_eq!(token.expose(), "secret-jwt");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("admin@example.com", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("admin@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_api_error_displays_service_message() {
        let err = StoreError::Api {
            status: 409,
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate key value");
    }

    #[test]
    fn test_select_builder() {
        let query = Select::all()
            .filter(Filter::eq("category_id", "c1"))
            .order_by("created_at", false);
        assert_eq!(query.columns, "*");
        assert_eq!(query.filters.len(), 1);
        assert_eq!(
            query.order,
            Some(Order {
                column: "created_at".to_string(),
                ascending: false
            })
        );
    }

    #[tokio::test]
    async fn test_subscription_skips_lag_and_ends_on_close() {
        let (tx, rx) = broadcast::channel(1);
        let mut subscription = AuthSubscription::new(rx);

        let user_id = UserId::new("u1");
        tx.send(AuthEvent::SignedOut {
            user_id: user_id.clone(),
        })
        .unwrap();
        tx.send(AuthEvent::SignedOut {
            user_id: UserId::new("u2"),
        })
        .unwrap();
        drop(tx);

        assert_eq!(
            subscription.recv().await,
            Some(AuthEvent::SignedOut {
                user_id: UserId::new("u2")
            })
        );
        assert_eq!(subscription.recv().await, None);
    }
}
