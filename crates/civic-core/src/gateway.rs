//! Contract with the remote issue service
//!
//! The coordinator only ever talks to the service through [`IssueGateway`].
//! Credentials, timeouts and transport concerns live in the implementation.

use crate::issue::{IssueDraft, IssuePatch, IssueRecord, ListParams, Pagination};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of list results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePage {
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// `{ issue }` body returned by get/create/update/verify/close
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEnvelope {
    pub issue: IssueRecord,
    #[serde(default)]
    pub message: Option<String>,
}

/// Delete confirmation; the body is otherwise unused
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait IssueGateway: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<IssuePage>;

    async fn get(&self, id: &str) -> Result<IssueRecord>;

    /// The service assigns id, status, owner and timestamps.
    async fn create(&self, draft: &IssueDraft) -> Result<IssueRecord>;

    async fn update(&self, id: &str, patch: &IssuePatch) -> Result<IssueRecord>;

    async fn remove(&self, id: &str) -> Result<Ack>;

    async fn verify(&self, id: &str) -> Result<IssueRecord>;

    async fn list_mine(&self, params: &ListParams) -> Result<IssuePage>;

    /// Owner marks the issue solved.
    async fn close(&self, id: &str) -> Result<IssueRecord>;
}
