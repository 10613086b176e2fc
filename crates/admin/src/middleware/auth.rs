//! Authentication extractor and session helpers for admin.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, error, warn};

use crate::dashboard::{Notices, SessionGuard, push_flash};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Shown when a protected page is opened without a live session.
pub const LOGIN_REQUIRED: &str = "Please log in to access the admin panel";

/// Extractor that requires a signed-in admin with a live store session.
///
/// Activates a [`SessionGuard`] for the request. If the admin is not logged
/// in, or the store no longer recognises their token, redirects to the login
/// page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin { admin, .. }: RequireAdmin) -> String {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin {
    pub admin: CurrentAdmin,
    pub guard: SessionGuard,
    pub session: Session,
}

/// Error returned when admin authentication is required but missing.
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// The session layer is not installed.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::MissingSession)?;

        let admin: Option<CurrentAdmin> = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten();
        let Some(admin) = admin else {
            flash_login_required(&session).await;
            return Err(AdminAuthRejection::RedirectToLogin);
        };

        match SessionGuard::activate(state.store(), &admin.access_token).await {
            Ok(Some(guard)) => Ok(Self {
                admin,
                guard,
                session,
            }),
            Ok(None) => {
                debug!(user_id = %admin.user_id, "Store session no longer valid");
                if let Err(e) = clear_current_admin(&session).await {
                    warn!(error = %e, "Failed to clear admin from session");
                }
                flash_login_required(&session).await;
                Err(AdminAuthRejection::RedirectToLogin)
            }
            Err(e) => {
                error!(error = %e, "Session check failed");
                Err(AdminAuthRejection::RedirectToLogin)
            }
        }
    }
}

async fn flash_login_required(session: &Session) {
    if let Err(e) = push_flash(session, Notices::error(LOGIN_REQUIRED)).await {
        warn!(error = %e, "Failed to queue login notice");
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

/// Look up the admin stored in the session, if any.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn current_admin(
    session: &Session,
) -> Result<Option<CurrentAdmin>, tower_sessions::session::Error> {
    session.get(session_keys::CURRENT_ADMIN).await
}
