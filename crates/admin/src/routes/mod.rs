//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (email + password against the data store)
//! GET  /login                  - Login page
//! POST /login                  - Sign in
//! POST /logout                 - Sign out
//!
//! # Dashboard
//! GET  /                       - Entity list (query: tab, q) and editor
//! GET  /new                    - Open a blank draft of the active kind
//! GET  /items/{id}             - Open a listed entry in the editor
//! POST /editor                 - Apply editor form (action: save, add_feature,
//!                                remove_feature:{i}, update)
//! POST /editor/close           - Discard the draft
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod auth;
pub mod dashboard;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        // Dashboard
        .route("/", get(dashboard::index))
        .route("/new", get(dashboard::new_item))
        .route("/items/{id}", get(dashboard::select_item))
        .route("/editor", post(dashboard::editor))
        .route("/editor/close", post(dashboard::close_editor))
}
