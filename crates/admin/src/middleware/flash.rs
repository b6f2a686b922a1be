//! Flash messages.
//!
//! A handler stores at most one success and one error message before it
//! redirects; the next rendered page takes both out of the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key for pending flash messages.
const FLASH_KEY: &str = "flash";

/// Messages carried to the next rendered page.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    /// Whether there is nothing to show.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.success.is_none() && self.error.is_none()
    }
}

async fn update(session: &Session, apply: impl FnOnce(&mut Flash)) {
    let mut flash = session
        .get::<Flash>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    apply(&mut flash);
    if let Err(e) = session.insert(FLASH_KEY, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Queue a success message for the next page.
pub async fn flash_success(session: &Session, message: impl Into<String>) {
    let message = message.into();
    update(session, |flash| flash.success = Some(message)).await;
}

/// Queue an error message for the next page.
pub async fn flash_error(session: &Session, message: impl Into<String>) {
    let message = message.into();
    update(session, |flash| flash.error = Some(message)).await;
}

/// Take the pending messages out of the session.
pub async fn take_flash(session: &Session) -> Flash {
    match session.remove::<Flash>(FLASH_KEY).await {
        Ok(flash) => flash.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Flash::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn messages_are_consumed_once() {
        let session = session();
        flash_success(&session, "Customer created successfully!").await;
        flash_error(&session, "first").await;
        flash_error(&session, "second").await;

        let flash = take_flash(&session).await;
        assert_eq!(flash.success.as_deref(), Some("Customer created successfully!"));
        assert_eq!(flash.error.as_deref(), Some("second"));

        assert!(take_flash(&session).await.is_empty());
    }
}
