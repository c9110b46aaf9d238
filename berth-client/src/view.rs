//! View identity and teardown
//!
//! Every mounted view (a shell, a chart, a file manager) owns one
//! [`ViewScope`]. Disposing the scope does not abort remote calls already in
//! flight, but their responses resolve to [`BerthError::Stale`] and are never
//! applied to the disposed view.

use std::future::Future;

use berth_utils::{BerthError, Result};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ViewScope {
    id: Uuid,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Mark the view as gone; idempotent
    pub fn dispose(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(view = %self.id, "view disposed");
        }
        self.token.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that fires when the view is disposed
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run a remote call on behalf of this view
    ///
    /// Resolves to `Stale` if the view is disposed before or while the call
    /// is pending, so callers never apply a late response.
    pub async fn guard<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_disposed() {
            return Err(BerthError::Stale);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(BerthError::Stale),
            result = call => {
                if self.is_disposed() {
                    Err(BerthError::Stale)
                } else {
                    result
                }
            }
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}
