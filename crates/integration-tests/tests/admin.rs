//! Integration tests for the admin dashboard.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use aitoonic_core::Table;
use aitoonic_core::store::{
    AccessToken, AuthSubscription, Credentials, DataStore, Filter, Select, Session, StoreResult,
};
use aitoonic_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, AdminClient, store};
use aitoonic_store::MemoryStore;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Delegates to a [`MemoryStore`] but answers tool reads late.
struct SlowTools {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl DataStore for SlowTools {
    async fn authenticate(&self, credentials: &Credentials) -> StoreResult<Session> {
        self.inner.authenticate(credentials).await
    }

    async fn get_session(&self, token: &AccessToken) -> StoreResult<Option<Session>> {
        self.inner.get_session(token).await
    }

    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()> {
        self.inner.sign_out(token).await
    }

    fn subscribe(&self) -> AuthSubscription {
        self.inner.subscribe()
    }

    async fn select(
        &self,
        table: Table,
        query: &Select,
        token: Option<&AccessToken>,
    ) -> StoreResult<Vec<Value>> {
        if table == Table::Tools {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.select(table, query, token).await
    }

    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        token: Option<&AccessToken>,
    ) -> StoreResult<u64> {
        self.inner.count(table, filters, token).await
    }

    async fn insert(
        &self,
        table: Table,
        record: &Value,
        token: Option<&AccessToken>,
    ) -> StoreResult<Value> {
        self.inner.insert(table, record, token).await
    }

    async fn update(
        &self,
        table: Table,
        id: &str,
        record: &Value,
        token: Option<&AccessToken>,
    ) -> StoreResult<Value> {
        self.inner.update(table, id, record, token).await
    }
}

async fn logged_in(store: &MemoryStore) -> AdminClient {
    let mut client = AdminClient::new(store);
    let response = client.login().await;
    assert!(response.redirects_to("/"), "login failed: {response:?}");
    client
}

async fn seed_category(store: &MemoryStore, name: &str) -> String {
    let row = store
        .seed(
            Table::Categories,
            json!({"name": name, "description": format!("{name} tools")}),
        )
        .await;
    row["id"].as_str().unwrap().to_string()
}

fn with<'a>(base: &[(&'a str, &'a str)], extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    base.iter().chain(extra).copied().collect()
}

#[tokio::test]
async fn test_dashboard_requires_login() {
    let store = store();
    let mut client = AdminClient::new(&store);

    let response = client.get("/").await;
    assert!(response.redirects_to("/login"));

    let page = client.get("/login").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please log in to access the admin panel"));
}

#[tokio::test]
async fn test_bad_credentials_rerender_login() {
    let store = store();
    let mut client = AdminClient::new(&store);

    let response = client
        .post_form("/login", &[("email", ADMIN_EMAIL), ("password", "wrong")])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid login credentials"));
    assert!(response.body.contains(ADMIN_EMAIL));

    assert!(client.get("/").await.redirects_to("/login"));
}

#[tokio::test]
async fn test_login_shows_categories_newest_first() {
    let store = store();
    seed_category(&store, "Audio").await;
    seed_category(&store, "Video").await;
    let mut client = logged_in(&store).await;

    let page = client.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(ADMIN_EMAIL));
    let video = page.body.find("Video").expect("Video listed");
    let audio = page.body.find("Audio").expect("Audio listed");
    assert!(video < audio);

    // Logged-in admins skip the login form.
    assert!(client.get("/login").await.redirects_to("/"));
}

#[tokio::test]
async fn test_search_filters_loaded_rows_without_refetching() {
    let store = store();
    seed_category(&store, "Audio").await;
    seed_category(&store, "Video").await;
    let mut client = logged_in(&store).await;

    let calls = store.data_calls();
    client.get("/").await;
    assert_eq!(store.data_calls(), calls + 1);

    let page = client.get("/?q=VID").await;
    assert_eq!(store.data_calls(), calls + 1);
    assert!(page.body.contains("Video"));
    assert!(!page.body.contains("Audio tools"));
}

#[tokio::test]
async fn test_late_fetch_for_old_tab_does_not_replace_new_tab() {
    let store = store();
    store
        .seed(Table::Agents, json!({"name": "Scout", "description": "Finds"}))
        .await;
    let mut client = AdminClient::with_store(Arc::new(SlowTools {
        inner: store.clone(),
        delay: Duration::from_millis(300),
    }));
    assert!(client.login().await.redirects_to("/"));

    let (tools, agents) = tokio::join!(client.get_concurrent("/?tab=tools"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.get_concurrent("/?tab=agents").await
    });
    assert_eq!(tools.status, StatusCode::OK);
    assert!(agents.body.contains("Scout"));

    assert!(client.get("/new").await.redirects_to("/"));
    let page = client.get("/?q=").await;
    assert!(page.body.contains("<h2>New Agent</h2>"));
    assert!(page.body.contains("Scout"));
}

#[tokio::test]
async fn test_unknown_tab_is_bad_request() {
    let store = store();
    let mut client = logged_in(&store).await;
    assert_eq!(client.get("/?tab=widgets").await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_category() {
    let store = store();
    let mut client = logged_in(&store).await;

    assert!(client.get("/new").await.redirects_to("/"));
    let page = client.get("/").await;
    assert!(page.body.contains("<h2>New Category</h2>"));

    let page = client
        .post_form(
            "/editor",
            &[
                ("name", "  Video "),
                ("description", "Clips"),
                ("seo_title", ""),
                ("seo_description", ""),
                ("action", "save"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Category saved successfully!"));
    assert!(!page.body.contains("<h2>New Category</h2>"));
    assert!(page.body.contains("<strong>Video</strong>"));

    let rows = store.rows(Table::Categories).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Video");
    assert_eq!(rows[0]["seo_title"], Value::Null);
}

#[tokio::test]
async fn test_invalid_tool_is_not_saved() {
    let store = store();
    let mut client = logged_in(&store).await;
    client.get("/?tab=tools").await;
    client.get("/new").await;
    let calls = store.data_calls();

    let page = client
        .post_form(
            "/editor",
            &[
                ("name", "Painter"),
                ("description", "Paints"),
                ("url", ""),
                ("category_id", ""),
                ("action", "save"),
            ],
        )
        .await;
    assert!(page.body.contains("Tool URL is required"));
    assert!(page.body.contains("<h2>New Tool</h2>"));
    assert_eq!(store.write_calls(), 0);
    assert_eq!(store.data_calls(), calls);
}

#[tokio::test]
async fn test_create_tool_with_category_picker() {
    let store = store();
    let image = seed_category(&store, "Image").await;
    let mut client = logged_in(&store).await;

    let page = client.get("/?tab=tools").await;
    assert!(page.body.contains("No tools yet."));
    client.get("/new").await;
    let page = client.get("/").await;
    assert!(page.body.contains(&format!("<option value=\"{image}\"")));

    let page = client
        .post_form(
            "/editor",
            &[
                ("name", "Painter"),
                ("description", "Paints"),
                ("url", "https://painter.example"),
                ("category_id", image.as_str()),
                ("action", "save"),
            ],
        )
        .await;
    assert!(page.body.contains("Tool saved successfully!"));

    let rows = store.rows(Table::Tools).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category_id"], image.as_str());
    assert_eq!(rows[0]["useCases"], json!([]));
}

#[tokio::test]
async fn test_edit_agent_features_and_save() {
    let store = store();
    let row = store
        .seed(
            Table::Agents,
            json!({"name": "Scout", "description": "Finds", "agent_features": ["Memory"]}),
        )
        .await;
    let id = row["id"].as_str().unwrap().to_string();
    let mut client = logged_in(&store).await;

    client.get("/?tab=agents").await;
    assert!(client.get(&format!("/items/{id}")).await.redirects_to("/"));
    let page = client.get("/").await;
    assert!(page.body.contains("<h2>Edit Agent</h2>"));
    assert!(page.body.contains("value=\"Memory\""));

    let base = [
        ("name", "Scout"),
        ("description", "Finds"),
        ("pricing_type", "paid"),
        ("is_featured", "on"),
        ("feature_0", "Memory"),
    ];
    let page = client
        .post_form("/editor", &with(&base, &[("action", "add_feature")]))
        .await;
    assert!(page.body.contains("name=\"feature_1\""));

    let page = client
        .post_form(
            "/editor",
            &with(&base, &[("feature_1", "   "), ("action", "save")]),
        )
        .await;
    assert!(page.body.contains("Agent saved successfully!"));

    let rows = store.rows(Table::Agents).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["agent_features"], json!(["Memory"]));
    assert_eq!(rows[0]["capabilities"], json!(["Memory"]));
    assert_eq!(rows[0]["pricing_type"], "paid");
    assert_eq!(rows[0]["is_featured"], true);
    assert_eq!(rows[0]["status"], "active");
}

#[tokio::test]
async fn test_remove_feature_action() {
    let store = store();
    let mut client = logged_in(&store).await;
    client.get("/?tab=agents").await;
    client.get("/new").await;
    client.post_form("/editor", &[("action", "add_feature")]).await;
    client.post_form("/editor", &[("action", "add_feature")]).await;

    let page = client
        .post_form(
            "/editor",
            &[
                ("feature_0", "First"),
                ("feature_1", "Second"),
                ("action", "remove_feature:0"),
            ],
        )
        .await;
    assert!(page.body.contains("value=\"Second\""));
    assert!(!page.body.contains("value=\"First\""));

    let page = client.post_form("/editor", &[("action", "explode")]).await;
    assert_eq!(page.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_failure_keeps_draft() {
    let store = store();
    let mut client = logged_in(&store).await;
    client.get("/new").await;
    store.fail_writes("duplicate key value violates unique constraint");
    let calls = store.data_calls();

    let page = client
        .post_form(
            "/editor",
            &[("name", "Video"), ("description", "Clips"), ("action", "save")],
        )
        .await;
    assert!(page
        .body
        .contains("Error saving item: duplicate key value violates unique constraint"));
    assert!(page.body.contains("value=\"Video\""));
    // The rejected insert only; the list is not re-read.
    assert_eq!(store.data_calls(), calls + 1);
}

#[tokio::test]
async fn test_fetch_failure_is_reported() {
    let store = store();
    let mut client = logged_in(&store).await;
    store.fail_reads(Table::Agents, "boom");

    let page = client.get("/?tab=agents").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Failed to fetch agents"));
}

#[tokio::test]
async fn test_switching_tab_discards_draft() {
    let store = store();
    let mut client = logged_in(&store).await;
    client.get("/new").await;
    assert!(client.get("/").await.body.contains("<h2>New Category</h2>"));

    let page = client.get("/?tab=tools").await;
    assert!(!page.body.contains("<h2>"));
    assert!(page.body.contains("Select an item to edit"));
}

#[tokio::test]
async fn test_close_editor_discards_draft() {
    let store = store();
    let mut client = logged_in(&store).await;
    client.get("/new").await;

    assert!(client.post_form("/editor/close", &[]).await.redirects_to("/"));
    let page = client.get("/").await;
    assert!(page.body.contains("Select an item to edit"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let store = store();
    let mut client = logged_in(&store).await;

    assert!(client.post_form("/logout", &[]).await.redirects_to("/login"));
    let page = client.get("/login").await;
    assert!(page.body.contains("Logged out successfully"));
    assert!(client.get("/").await.redirects_to("/login"));
}

#[tokio::test]
async fn test_expired_store_session_redirects_to_login() {
    let store = store();
    let mut client = logged_in(&store).await;
    assert_eq!(client.get("/").await.status, StatusCode::OK);

    let session = store
        .authenticate(&Credentials::new(ADMIN_EMAIL, ADMIN_PASSWORD))
        .await
        .unwrap();
    store.expire_sessions(&session.user_id).await;

    assert!(client.get("/").await.redirects_to("/login"));
    let page = client.get("/login").await;
    assert!(page.body.contains("Please log in to access the admin panel"));
}

#[tokio::test]
async fn test_health() {
    let store = store();
    let mut client = AdminClient::new(&store);
    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}
