//! Integration tests for Aitoonic.
//!
//! Both routers are driven in-process with `tower::ServiceExt::oneshot`
//! against a [`MemoryStore`], so no server or hosted project is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aitoonic-integration-tests
//! ```

use std::sync::Arc;
use std::time::Duration;

use aitoonic_admin::config::AdminConfig;
use aitoonic_core::store::DataStore;
use aitoonic_site::config::{DEFAULT_CONTACT_EMAIL, SiteConfig};
use aitoonic_store::{MemoryStore, StoreConfig};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@aitoonic.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// A store with one admin user.
#[must_use]
pub fn store() -> MemoryStore {
    MemoryStore::new().with_user(ADMIN_EMAIL, ADMIN_PASSWORD)
}

fn store_config() -> StoreConfig {
    StoreConfig::new("http://localhost:54321", "test-anon-key").expect("valid store config")
}

/// Site router over `store`. A zero `cache_ttl` disables the browser cache.
#[must_use]
pub fn site(store: &MemoryStore, cache_ttl: Duration) -> Router {
    let config = SiteConfig {
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
        cache_ttl,
        store: store_config(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    };
    aitoonic_site::app(aitoonic_site::state::AppState::new(
        config,
        Arc::new(store.clone()),
    ))
}

/// Admin router over `store`.
#[must_use]
pub fn admin(store: &MemoryStore) -> Router {
    admin_with(Arc::new(store.clone()))
}

/// Admin router over any data store.
#[must_use]
pub fn admin_with(store: Arc<dyn DataStore>) -> Router {
    let config = AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        store: store_config(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    };
    aitoonic_admin::app(aitoonic_admin::state::AppState::new(config, store))
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Whether this is a redirect to `path`.
    #[must_use]
    pub fn redirects_to(&self, path: &str) -> bool {
        self.status.is_redirection() && self.location.as_deref() == Some(path)
    }
}

/// Send one request through `app`.
///
/// # Panics
///
/// Panics if the router fails or the body cannot be read.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");

    let header_text = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let status = response.status();
    let location = header_text(header::LOCATION);
    let set_cookie = header_text(header::SET_COOKIE);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    TestResponse {
        status,
        location,
        set_cookie,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// GET `uri` with no cookies.
pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::get(uri).body(Body::empty()).expect("valid request")).await
}

/// Encode form fields as `application/x-www-form-urlencoded`.
#[must_use]
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Browser-like client for the admin router that keeps the session cookie.
pub struct AdminClient {
    app: Router,
    cookie: Option<String>,
}

impl AdminClient {
    #[must_use]
    pub fn new(store: &MemoryStore) -> Self {
        Self::with_store(Arc::new(store.clone()))
    }

    #[must_use]
    pub fn with_store(store: Arc<dyn DataStore>) -> Self {
        Self {
            app: admin_with(store),
            cookie: None,
        }
    }

    async fn send(&mut self, mut builder: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = send(&self.app, builder.body(body).expect("valid request")).await;

        if let Some(set_cookie) = &response.set_cookie {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::get(uri), Body::empty()).await
    }

    /// GET with the current cookie without waiting for other requests, so
    /// several can overlap. The cookie is not updated from the response.
    pub async fn get_concurrent(&self, uri: &str) -> TestResponse {
        let mut builder = Request::get(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        send(&self.app, builder.body(Body::empty()).expect("valid request")).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.send(builder, Body::from(form_body(fields))).await
    }

    /// Sign in as the test admin.
    pub async fn login(&mut self) -> TestResponse {
        self.post_form(
            "/login",
            &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)],
        )
        .await
    }
}
