//! Client-side verification gating
//!
//! Advisory only. The service makes the final call and may still reject a
//! verify request that passes here, e.g. when `verified_by` is stale.

use crate::issue::IssueRecord;
use serde::{Deserialize, Serialize};

/// The signed-in viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Why a user may or may not verify an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Reporters cannot verify their own issue
    Owner,
    AlreadyVerified,
    Eligible,
}

pub fn eligibility(user: &User, issue: &IssueRecord) -> Eligibility {
    if user.id == issue.owner_id {
        Eligibility::Owner
    } else if issue.is_verified_by(&user.id) {
        Eligibility::AlreadyVerified
    } else {
        Eligibility::Eligible
    }
}

pub fn can_verify(user: &User, issue: &IssueRecord) -> bool {
    eligibility(user, issue) == Eligibility::Eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::fixtures::record;

    #[test]
    fn test_owner_cannot_verify() {
        let issue = record("i1", "u1");
        assert!(!can_verify(&User::new("u1"), &issue));
        assert_eq!(eligibility(&User::new("u1"), &issue), Eligibility::Owner);
    }

    #[test]
    fn test_repeat_verifier_cannot_verify() {
        let mut issue = record("i1", "u1");
        issue.verified_by = vec!["u2".into()];
        assert!(!can_verify(&User::new("u2"), &issue));
        assert_eq!(
            eligibility(&User::new("u2"), &issue),
            Eligibility::AlreadyVerified
        );
    }

    #[test]
    fn test_other_user_can_verify() {
        let issue = record("i1", "u1");
        assert!(can_verify(&User::new("u2"), &issue));
    }

    #[test]
    fn test_owner_check_wins_over_verified_by() {
        // Inconsistent server data: owner listed as a verifier
        let mut issue = record("i1", "u1");
        issue.verified_by = vec!["u1".into()];
        assert_eq!(eligibility(&User::new("u1"), &issue), Eligibility::Owner);
    }
}
