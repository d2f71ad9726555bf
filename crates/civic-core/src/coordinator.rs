//! Drives issue operations against the gateway and applies their results
//!
//! Every operation follows the same contract: mark the store loading and
//! clear the error, call the gateway, then either apply one transition and
//! clear loading, or record the failure message and clear loading. Nothing
//! is retried, cancelled or re-thrown.

use crate::gateway::IssueGateway;
use crate::issue::{IssueDraft, IssuePatch, ListParams};
use crate::store::IssueStateStore;
use crate::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Logical operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    FetchIssues,
    FetchIssueById,
    CreateIssue,
    UpdateIssue,
    DeleteIssue,
    VerifyIssue,
    FetchMyIssues,
    CloseIssue,
}

impl OperationKind {
    /// Shown when the service gives no message of its own
    pub fn fallback_message(&self) -> &'static str {
        match self {
            OperationKind::FetchIssues => "Failed to fetch issues",
            OperationKind::FetchIssueById => "Failed to fetch issue",
            OperationKind::CreateIssue => "Failed to create issue",
            OperationKind::UpdateIssue => "Failed to update issue",
            OperationKind::DeleteIssue => "Failed to delete issue",
            OperationKind::VerifyIssue => "Failed to verify issue",
            OperationKind::FetchMyIssues => "Failed to fetch your issues",
            OperationKind::CloseIssue => "Failed to close issue",
        }
    }

    /// Reads that overwrite a whole view; only these can go stale
    pub fn replaces_view(&self) -> bool {
        matches!(
            self,
            OperationKind::FetchIssues
                | OperationKind::FetchIssueById
                | OperationKind::FetchMyIssues
        )
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::FetchIssues => write!(f, "fetch_issues"),
            OperationKind::FetchIssueById => write!(f, "fetch_issue_by_id"),
            OperationKind::CreateIssue => write!(f, "create_issue"),
            OperationKind::UpdateIssue => write!(f, "update_issue"),
            OperationKind::DeleteIssue => write!(f, "delete_issue"),
            OperationKind::VerifyIssue => write!(f, "verify_issue"),
            OperationKind::FetchMyIssues => write!(f, "fetch_my_issues"),
            OperationKind::CloseIssue => write!(f, "close_issue"),
        }
    }
}

/// How an operation ended, from the store's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The success transition was applied
    Applied,
    /// `error` now holds the failure message
    Failed,
    /// A newer request of the same kind was issued; the store was not touched
    Discarded,
}

/// Epoch bookkeeping for stale-response detection
#[derive(Debug, Default)]
struct Epochs {
    next: AtomicU64,
    latest: Mutex<HashMap<OperationKind, u64>>,
}

impl Epochs {
    fn issue(&self, kind: OperationKind) -> u64 {
        let epoch = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, epoch);
        epoch
    }

    fn is_latest(&self, kind: OperationKind, epoch: u64) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .is_none_or(|latest| *latest == epoch)
    }
}

/// Sole writer of an [`IssueStateStore`]
///
/// Clones share the same store and gateway, so operations can be driven
/// from separate tasks and overlap freely.
pub struct IssueCoordinator<G: ?Sized> {
    gateway: Arc<G>,
    store: Arc<Mutex<IssueStateStore>>,
    epochs: Arc<Epochs>,
    discard_stale: bool,
}

impl<G: ?Sized> Clone for IssueCoordinator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            store: Arc::clone(&self.store),
            epochs: Arc::clone(&self.epochs),
            discard_stale: self.discard_stale,
        }
    }
}

impl<G: IssueGateway + ?Sized> IssueCoordinator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            store: Arc::new(Mutex::new(IssueStateStore::new())),
            epochs: Arc::new(Epochs::default()),
            discard_stale: false,
        }
    }

    /// Drop late responses to view-replacing reads when a newer read of the
    /// same kind has been issued. Off by default.
    pub fn with_stale_discard(mut self, enabled: bool) -> Self {
        self.discard_stale = enabled;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Read the store without copying it
    pub fn read<R>(&self, f: impl FnOnce(&IssueStateStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> IssueStateStore {
        self.lock().clone()
    }

    pub fn clear_error(&self) {
        self.lock().clear_error();
    }

    pub fn reset_issues(&self) {
        self.lock().reset_issues();
    }

    pub async fn fetch_issues(&self, params: &ListParams) -> Outcome {
        self.run(OperationKind::FetchIssues, self.gateway.list(params), |store, page| {
            store.replace_feed(page.issues, page.pagination)
        })
        .await
    }

    pub async fn fetch_issue_by_id(&self, id: &str) -> Outcome {
        self.run(OperationKind::FetchIssueById, self.gateway.get(id), |store, issue| {
            store.set_current(issue)
        })
        .await
    }

    pub async fn create_issue(&self, draft: &IssueDraft) -> Outcome {
        self.run(OperationKind::CreateIssue, self.gateway.create(draft), |store, issue| {
            store.prepend(issue)
        })
        .await
    }

    pub async fn update_issue(&self, id: &str, patch: &IssuePatch) -> Outcome {
        self.run(OperationKind::UpdateIssue, self.gateway.update(id, patch), |store, issue| {
            store.replace(issue)
        })
        .await
    }

    pub async fn delete_issue(&self, id: &str) -> Outcome {
        self.run(OperationKind::DeleteIssue, self.gateway.remove(id), |store, _ack| {
            store.remove(id)
        })
        .await
    }

    /// The service's copy carries the new count; nothing is incremented locally.
    pub async fn verify_issue(&self, id: &str) -> Outcome {
        self.run(OperationKind::VerifyIssue, self.gateway.verify(id), |store, issue| {
            store.replace(issue)
        })
        .await
    }

    pub async fn fetch_my_issues(&self, params: &ListParams) -> Outcome {
        self.run(OperationKind::FetchMyIssues, self.gateway.list_mine(params), |store, page| {
            store.replace_mine(page.issues, page.pagination)
        })
        .await
    }

    pub async fn close_issue(&self, id: &str) -> Outcome {
        self.run(OperationKind::CloseIssue, self.gateway.close(id), |store, issue| {
            store.replace(issue)
        })
        .await
    }

    async fn run<T>(
        &self,
        kind: OperationKind,
        call: impl Future<Output = Result<T>>,
        apply: impl FnOnce(&mut IssueStateStore, T),
    ) -> Outcome {
        let epoch = self.epochs.issue(kind);
        self.lock().begin();
        debug!(op = %kind, epoch, "operation started");

        let result = call.await;

        let mut store = self.lock();
        if self.discard_stale && kind.replaces_view() && !self.epochs.is_latest(kind, epoch) {
            debug!(op = %kind, epoch, "discarding stale response");
            return Outcome::Discarded;
        }

        match result {
            Ok(value) => {
                apply(&mut store, value);
                store.settle();
                debug!(op = %kind, epoch, "operation applied");
                Outcome::Applied
            }
            Err(err) => {
                warn!(op = %kind, epoch, error = %err, "operation failed");
                let message = err
                    .service_message()
                    .map(str::to_owned)
                    .unwrap_or_else(|| kind.fallback_message().to_owned());
                store.fail(message);
                Outcome::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, IssueStateStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
