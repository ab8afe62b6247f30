//! Serialized access to a [`Reconciler`].
//!
//! The HTTP trigger and the periodic scheduler share one [`SyncService`]; its
//! pass lock keeps two passes from ever touching the same calendars at once.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::SyncResult;
use crate::reconciler::Reconciler;
use crate::report::PassReport;

/// Outcome of the most recent pass.
#[derive(Debug, Clone)]
pub enum LastPass {
    Completed(PassReport),
    Failed {
        at: chrono::DateTime<chrono::Utc>,
        error: String,
    },
}

/// A reconciler plus a pass lock and the last outcome.
#[derive(Debug)]
pub struct SyncService {
    reconciler: Reconciler,
    pass_lock: Mutex<()>,
    last: RwLock<Option<LastPass>>,
}

/// Shared service handle.
pub type SharedSyncService = Arc<SyncService>;

impl SyncService {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            pass_lock: Mutex::new(()),
            last: RwLock::new(None),
        }
    }

    /// Runs a pass, waiting for any pass already in progress to finish first.
    pub async fn run_pass(&self) -> SyncResult<PassReport> {
        let _guard = match self.pass_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("a pass is already running, waiting");
                self.pass_lock.lock().await
            }
        };

        let result = self.reconciler.run_pass().await;
        let outcome = match &result {
            Ok(report) => LastPass::Completed(report.clone()),
            Err(err) => LastPass::Failed {
                at: chrono::Utc::now(),
                error: err.to_string(),
            },
        };
        *self.last.write().await = Some(outcome);
        result
    }

    /// Returns the outcome of the most recent pass.
    pub async fn last_pass(&self) -> Option<LastPass> {
        self.last.read().await.clone()
    }

    /// Returns the reconciler.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }
}
