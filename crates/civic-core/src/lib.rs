//! civic-core: Core library for the civic issue sync client
//!
//! Mediates every issue operation against the remote issue service and keeps
//! the feed, "my issues" and detail views in step with its answers.

pub mod classify;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod http;
pub mod issue;
pub mod policy;
pub mod store;

#[cfg(test)]
mod testing;

pub use classify::{Badge, priority_badge, status_badge};
pub use config::Config;
pub use coordinator::{IssueCoordinator, OperationKind, Outcome};
pub use error::Error;
pub use gateway::{IssueGateway, IssuePage};
pub use http::HttpGateway;
pub use issue::{
    Category, IssueDraft, IssuePatch, IssueRecord, ListParams, Location, Pagination, Priority,
    Status,
};
pub use policy::{Eligibility, User, can_verify, eligibility};
pub use store::IssueStateStore;

/// Result type for civic-core operations
pub type Result<T> = std::result::Result<T, Error>;
