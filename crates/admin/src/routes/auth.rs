//! Authentication route handlers.
//!
//! Admins sign in with the data store's email/password auth. The returned
//! access token is kept in the HTTP session and used for every data call.

use aitoonic_core::StoreError;
use aitoonic_core::store::Credentials;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::dashboard::{Dashboard, Notice, Notices, push_flash, take_flash};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_admin, current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Display the login page.
#[instrument(skip_all)]
pub async fn login_page(session: Session) -> Result<Response, AppError> {
    if current_admin(&session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let notices = take_flash(&session).await?;
    Ok(LoginTemplate {
        email: String::new(),
        notices: notices.into_vec(),
    }
    .into_response())
}

/// Sign in and start an admin session.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = Credentials::new(form.email.trim(), form.password);

    match state.store().authenticate(&credentials).await {
        Ok(store_session) => {
            // Prevent session fixation
            session.cycle_id().await?;

            let admin = CurrentAdmin::from(store_session);
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.user_id, &admin.email);
            tracing::info!(user_id = %admin.user_id, "Admin logged in");

            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            let message = match &e {
                StoreError::Api { .. } | StoreError::Unauthorized => e.to_string(),
                _ => {
                    tracing::error!(error = %e, "Login request failed");
                    "Unable to sign in right now. Please try again.".to_string()
                }
            };
            tracing::info!(error = %e, "Login rejected");

            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    email: credentials.email,
                    notices: Notices::error(message).into_vec(),
                },
            )
                .into_response())
        }
    }
}

/// Sign out and clear the admin session.
///
/// Always ends on the login page, whether or not the store accepted the
/// sign-out.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    if let Some(admin) = current_admin(&session).await? {
        let notice = match state.store().sign_out(&admin.access_token).await {
            Ok(()) => {
                tracing::info!(user_id = %admin.user_id, "Admin logged out");
                Notices::success("Logged out successfully")
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-out failed");
                Notices::error("Error logging out")
            }
        };

        clear_current_admin(&session).await?;
        Dashboard::clear(&session).await?;
        clear_sentry_user();
        push_flash(&session, notice).await?;
    }

    Ok(Redirect::to("/login").into_response())
}
