//! Session guard for admin views.
//!
//! A guard is activated once per view. It confirms the admin's token is
//! still backed by a live session and then holds an auth subscription so a
//! sign-out that happens mid-request (from another tab, another device or
//! the store itself) ends the view instead of letting it finish with a dead
//! token. Dropping the guard releases the subscription.

use std::future::Future;

use aitoonic_core::UserId;
use aitoonic_core::store::{
    AccessToken, AuthEvent, AuthSubscription, DataStore, Session, StoreResult,
};
use thiserror::Error;

/// The guarded admin signed out while a view was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("admin session ended")]
pub struct SignedOut;

/// An authenticated view over the store.
#[derive(Debug)]
pub struct SessionGuard {
    session: Session,
    subscription: AuthSubscription,
}

impl SessionGuard {
    /// Check `token` against the store and start watching auth events.
    ///
    /// Returns `Ok(None)` if the token has no live session.
    ///
    /// # Errors
    ///
    /// Returns the store error if the session lookup fails.
    pub async fn activate(store: &dyn DataStore, token: &AccessToken) -> StoreResult<Option<Self>> {
        // Subscribe first so a sign-out racing the lookup is not missed.
        let subscription = store.subscribe();
        let Some(session) = store.get_session(token).await? else {
            return Ok(None);
        };

        Ok(Some(Self {
            session,
            subscription,
        }))
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.session.user_id
    }

    /// The token data calls should run with.
    #[must_use]
    pub const fn token(&self) -> &AccessToken {
        &self.session.access_token
    }

    /// Resolve once the guarded admin signs out.
    ///
    /// Sign-in and refresh events for the same admin keep the guard
    /// authenticated and pick up the newest token. Never resolves if the
    /// store stops publishing.
    pub async fn signed_out(&mut self) {
        loop {
            match self.subscription.recv().await {
                Some(AuthEvent::SignedOut { user_id }) if user_id == self.session.user_id => {
                    tracing::info!(user_id = %user_id, "Admin signed out during view");
                    return;
                }
                Some(AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session))
                    if session.user_id == self.session.user_id =>
                {
                    self.session = session;
                }
                Some(_) => {}
                None => std::future::pending::<()>().await,
            }
        }
    }

    /// Run `work` unless the admin signs out first.
    ///
    /// On sign-out the in-flight work is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SignedOut`] if a sign-out for this admin arrives before
    /// `work` completes.
    pub async fn watch<F: Future>(&mut self, work: F) -> Result<F::Output, SignedOut> {
        tokio::select! {
            biased;
            () = self.signed_out() => Err(SignedOut),
            output = work => Ok(output),
        }
    }
}
