//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                   - Redirect to /categories
//! GET  /categories         - Category browser
//! GET  /category/{name}    - Category detail (`all` lists every tool)
//! GET  /contact            - Contact page
//! GET  /health             - Liveness check
//! GET  /health/ready       - Readiness check (store reachable)
//! ```

pub mod categories;
pub mod contact;

use axum::{Router, response::Redirect, routing::get};

use crate::state::AppState;

/// Create the page routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/categories", get(categories::index))
        .route("/category/{name}", get(categories::show))
        .route("/contact", get(contact::show))
}

async fn home() -> Redirect {
    Redirect::permanent("/categories")
}
