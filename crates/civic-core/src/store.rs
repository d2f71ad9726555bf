//! In-memory issue state for the client
//!
//! Holds the feed, "my issues" and detail views. Only the coordinator writes
//! here; every write is one of the transition functions below.

use crate::issue::{IssueRecord, Pagination};

/// Issue views plus shared request status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueStateStore {
    issues: Vec<IssueRecord>,
    my_issues: Vec<IssueRecord>,
    current_issue: Option<IssueRecord>,
    /// Shared by the feed and "my issues" fetches; last to resolve wins
    pagination: Pagination,
    /// Shared by every operation kind
    loading: bool,
    error: Option<String>,
}

impl IssueStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global feed, in server order
    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    /// Issues reported by the signed-in user
    pub fn my_issues(&self) -> &[IssueRecord] {
        &self.my_issues
    }

    pub fn current_issue(&self) -> Option<&IssueRecord> {
        self.current_issue.as_ref()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// `false` does not mean nothing is in flight, only that some operation
    /// finished most recently.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Find an issue in the feed
    pub fn get(&self, id: &str) -> Option<&IssueRecord> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub(crate) fn settle(&mut self) {
        self.loading = false;
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }

    /// Empty the feed and rewind pagination
    pub(crate) fn reset_issues(&mut self) {
        self.issues.clear();
        self.pagination = Pagination::default();
    }

    pub(crate) fn replace_feed(&mut self, issues: Vec<IssueRecord>, pagination: Pagination) {
        self.issues = issues;
        self.pagination = pagination;
    }

    pub(crate) fn replace_mine(&mut self, issues: Vec<IssueRecord>, pagination: Pagination) {
        self.my_issues = issues;
        self.pagination = pagination;
    }

    pub(crate) fn set_current(&mut self, issue: IssueRecord) {
        self.current_issue = Some(issue);
    }

    /// Put a freshly created issue at the top of the feed
    pub(crate) fn prepend(&mut self, issue: IssueRecord) {
        self.issues.retain(|i| i.id != issue.id);
        self.issues.insert(0, issue);
    }

    /// Swap in the service's copy of an issue in the feed and detail view.
    ///
    /// `my_issues` is deliberately left alone; it only changes on its own fetch.
    pub(crate) fn replace(&mut self, issue: IssueRecord) {
        for slot in self.issues.iter_mut().filter(|i| i.id == issue.id) {
            *slot = issue.clone();
        }
        if self
            .current_issue
            .as_ref()
            .is_some_and(|current| current.id == issue.id)
        {
            self.current_issue = Some(issue);
        }
    }

    /// Drop an issue from the feed only
    pub(crate) fn remove(&mut self, id: &str) {
        self.issues.retain(|i| i.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::fixtures::record;

    fn store_with(ids: &[&str]) -> IssueStateStore {
        let mut store = IssueStateStore::new();
        let issues = ids.iter().map(|id| record(id, "u1")).collect();
        store.replace_feed(issues, Pagination::default());
        store
    }

    #[test]
    fn test_begin_clears_error() {
        let mut store = IssueStateStore::new();
        store.fail("boom".into());
        assert_eq!(store.error(), Some("boom"));
        assert!(!store.is_loading());

        store.begin();
        assert!(store.is_loading());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn test_prepend_keeps_ids_unique() {
        let mut store = store_with(&["i1", "i2"]);
        store.prepend(record("i9", "u1"));
        assert_eq!(store.issues().len(), 3);
        assert_eq!(store.issues()[0].id, "i9");

        let mut again = record("i2", "u1");
        again.title = "moved".into();
        store.prepend(again);
        let ids: Vec<_> = store.issues().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i2", "i9", "i1"]);
        assert_eq!(store.issues()[0].title, "moved");
    }

    #[test]
    fn test_replace_touches_feed_and_current_not_mine() {
        let mut store = store_with(&["i1", "i2"]);
        store.replace_mine(vec![record("i2", "u1")], Pagination::default());
        store.set_current(record("i2", "u1"));

        let mut fresh = record("i2", "u1");
        fresh.verification_count = 3;
        store.replace(fresh);

        assert_eq!(store.get("i2").unwrap().verification_count, 3);
        assert_eq!(store.current_issue().unwrap().verification_count, 3);
        assert_eq!(store.my_issues()[0].verification_count, 0);
    }

    #[test]
    fn test_replace_leaves_other_current_alone() {
        let mut store = store_with(&["i1"]);
        store.set_current(record("i5", "u1"));

        let mut fresh = record("i1", "u1");
        fresh.title = "renamed".into();
        store.replace(fresh);

        assert_eq!(store.current_issue().unwrap().id, "i5");
        assert_eq!(store.issues()[0].title, "renamed");
    }

    #[test]
    fn test_remove_is_feed_only() {
        let mut store = store_with(&["i1", "i9"]);
        store.replace_mine(vec![record("i9", "u1")], Pagination::default());
        store.set_current(record("i9", "u1"));

        store.remove("i9");

        assert!(store.get("i9").is_none());
        assert_eq!(store.my_issues().len(), 1);
        assert_eq!(store.current_issue().unwrap().id, "i9");
    }

    #[test]
    fn test_reset_issues() {
        let mut store = store_with(&["i1"]);
        store.replace_feed(
            vec![record("i1", "u1")],
            Pagination {
                page: 3,
                limit: 20,
                total: 60,
                pages: 3,
            },
        );
        store.reset_issues();
        assert!(store.issues().is_empty());
        assert_eq!(*store.pagination(), Pagination::default());
    }
}
