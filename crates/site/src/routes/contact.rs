//! Contact page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub email: String,
}

/// Display the contact page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> ContactTemplate {
    ContactTemplate {
        email: state.config().contact_email.clone(),
    }
}
