//! Toast notifications.
//!
//! Notices raised while handling a request are either rendered directly or
//! flashed into the HTTP session and drained by the next render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    /// CSS modifier used by the toast markup.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            Level::Success => "toast-success",
            Level::Error => "toast-error",
        }
    }
}

/// Notices collected during one request, in the order raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let mut notices = Self::new();
        notices.push(Level::Error, message);
        notices
    }

    /// A single success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        let mut notices = Self::new();
        notices.push(Level::Success, message);
        notices
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.0.push(Notice {
            level,
            message: message.into(),
        });
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    pub fn push_success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Notice> {
        self.0
    }
}

/// Queue notices for the next render.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    notices: Notices,
) -> Result<(), tower_sessions::session::Error> {
    if notices.is_empty() {
        return Ok(());
    }
    let mut pending: Notices = session.get(session_keys::FLASH).await?.unwrap_or_default();
    pending.extend(notices);
    session.insert(session_keys::FLASH, pending).await
}

/// Drain queued notices.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take_flash(session: &Session) -> Result<Notices, tower_sessions::session::Error> {
    Ok(session
        .remove::<Notices>(session_keys::FLASH)
        .await?
        .unwrap_or_default())
}
