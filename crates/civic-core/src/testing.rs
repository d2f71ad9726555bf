//! Scripted gateway for coordinator tests
//!
//! Replies are queued per operation kind. A gated reply is held back until
//! the test fires its sender, which lets tests pick the order in which
//! overlapping calls resolve.

use crate::coordinator::OperationKind;
use crate::gateway::{Ack, IssueGateway, IssuePage};
use crate::issue::{IssueDraft, IssuePatch, IssueRecord, ListParams};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Debug)]
pub(crate) enum Canned {
    Page(IssuePage),
    Issue(IssueRecord),
    Deleted,
    Fail(Error),
}

struct Reply {
    gate: Option<oneshot::Receiver<()>>,
    canned: Canned,
}

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    replies: Mutex<HashMap<OperationKind, VecDeque<Reply>>>,
    calls: Mutex<Vec<(OperationKind, String)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: OperationKind, canned: Canned) {
        self.enqueue(kind, Reply { gate: None, canned });
    }

    /// Queue a reply that resolves only once the returned sender fires
    pub fn push_gated(&self, kind: OperationKind, canned: Canned) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(
            kind,
            Reply {
                gate: Some(rx),
                canned,
            },
        );
        tx
    }

    /// Calls that have reached the gateway so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, kind: OperationKind) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    fn enqueue(&self, kind: OperationKind, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(reply);
    }

    async fn answer(&self, kind: OperationKind, arg: &str) -> Result<Canned> {
        self.calls.lock().unwrap().push((kind, arg.to_string()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("no reply scripted for {kind}"));

        if let Some(gate) = reply.gate {
            let _ = gate.await;
        }
        match reply.canned {
            Canned::Fail(err) => Err(err),
            other => Ok(other),
        }
    }

    async fn page(&self, kind: OperationKind) -> Result<IssuePage> {
        match self.answer(kind, "").await? {
            Canned::Page(page) => Ok(page),
            other => panic!("{kind} expects a page, scripted {other:?}"),
        }
    }

    async fn issue(&self, kind: OperationKind, id: &str) -> Result<IssueRecord> {
        match self.answer(kind, id).await? {
            Canned::Issue(issue) => Ok(issue),
            other => panic!("{kind} expects an issue, scripted {other:?}"),
        }
    }
}

#[async_trait]
impl IssueGateway for ScriptedGateway {
    async fn list(&self, _params: &ListParams) -> Result<IssuePage> {
        self.page(OperationKind::FetchIssues).await
    }

    async fn get(&self, id: &str) -> Result<IssueRecord> {
        self.issue(OperationKind::FetchIssueById, id).await
    }

    async fn create(&self, draft: &IssueDraft) -> Result<IssueRecord> {
        self.issue(OperationKind::CreateIssue, &draft.title).await
    }

    async fn update(&self, id: &str, _patch: &IssuePatch) -> Result<IssueRecord> {
        self.issue(OperationKind::UpdateIssue, id).await
    }

    async fn remove(&self, id: &str) -> Result<Ack> {
        match self.answer(OperationKind::DeleteIssue, id).await? {
            Canned::Deleted => Ok(Ack::default()),
            other => panic!("delete expects an ack, scripted {other:?}"),
        }
    }

    async fn verify(&self, id: &str) -> Result<IssueRecord> {
        self.issue(OperationKind::VerifyIssue, id).await
    }

    async fn list_mine(&self, _params: &ListParams) -> Result<IssuePage> {
        self.page(OperationKind::FetchMyIssues).await
    }

    async fn close(&self, id: &str) -> Result<IssueRecord> {
        self.issue(OperationKind::CloseIssue, id).await
    }
}
