//! In-memory collaborator implementations
//!
//! Simple `Vec`/`HashMap` backed stores that keep insertion order as source
//! order. Not thread-safe; designed for single-threaded use by tests and by
//! embedders that need a reference implementation of the ports.

use std::collections::{HashMap, HashSet};

use crate::errors::{ExError, ExErrorKind, Result, ShareListError};
use crate::model::node::normalize_path;
use crate::model::{Node, NodeId, Share, ShareType};
use crate::ports::{FileTree, Page, ShareStore, UserDirectory};
use crate::report::{ReportArchive, StoredReport};

fn storage_error(message: &str) -> ExError {
    ShareListError::Storage {
        message: message.to_string(),
    }
    .into()
}

/// Share store over a list of shares
#[derive(Debug, Clone, Default)]
pub struct InMemoryShareStore {
    shares: Vec<Share>,
    group_members: HashMap<String, Vec<String>>,
    failing_users: HashSet<String>,
}

impl InMemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, share: Share) {
        self.shares.push(share);
    }

    /// Make `user` a member of `group` for inbound group-share queries
    pub fn add_group_member(&mut self, group: &str, user: &str) {
        self.group_members
            .entry(group.to_string())
            .or_default()
            .push(user.to_string());
    }

    /// Every query scoped to `user` fails with a storage error
    pub fn fail_queries_for(&mut self, user: &str) {
        self.failing_users.insert(user.to_string());
    }

    fn check(&self, user: &str, op: &str) -> Result<()> {
        if self.failing_users.contains(user) {
            return Err(storage_error("share backend unavailable")
                .with_op(op)
                .with_user_id(user));
        }
        Ok(())
    }

    fn is_recipient(&self, share: &Share, user: &str) -> bool {
        let Some(recipient) = share.recipient.as_deref() else {
            return false;
        };
        match share.share_type {
            ShareType::Group => self
                .group_members
                .get(recipient)
                .is_some_and(|members| members.iter().any(|m| m == user)),
            ShareType::Link => false,
            _ => recipient == user,
        }
    }
}

impl ShareStore for InMemoryShareStore {
    fn shares_by(&self, user: &str, share_type: ShareType, page: Page) -> Result<Vec<Share>> {
        self.check(user, "shares_by")?;
        let matching: Vec<Share> = self
            .shares
            .iter()
            .filter(|s| s.share_type == share_type && (s.owner == user || s.initiator == user))
            .cloned()
            .collect();
        Ok(page.slice(&matching))
    }

    fn shared_with(&self, user: &str, share_type: ShareType, page: Page) -> Result<Vec<Share>> {
        self.check(user, "shared_with")?;
        let matching: Vec<Share> = self
            .shares
            .iter()
            .filter(|s| s.share_type == share_type && self.is_recipient(s, user))
            .cloned()
            .collect();
        Ok(page.slice(&matching))
    }

    fn share_by_token(&self, token: &str) -> Result<Option<Share>> {
        Ok(self
            .shares
            .iter()
            .find(|s| s.token.as_ref().is_some_and(|t| t.matches(token)))
            .cloned())
    }

    fn all_shares(&self) -> Result<Vec<Share>> {
        Ok(self.shares.clone())
    }
}

#[derive(Debug, Clone)]
struct UserTree {
    root: Node,
    nodes: Vec<Node>,
}

impl UserTree {
    fn holds(&self, folder: &Node) -> bool {
        self.root == *folder || self.nodes.iter().any(|n| n == folder)
    }
}

/// File tree keyed by user, each user owning a root folder and its nodes
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileTree {
    trees: HashMap<String, UserTree>,
    failing_users: HashSet<String>,
}

impl InMemoryFileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root folder for `user`
    pub fn add_user(&mut self, user: &str, root_id: NodeId) {
        self.trees.insert(
            user.to_string(),
            UserTree {
                root: Node::folder(root_id, "/").owned_by(user),
                nodes: Vec::new(),
            },
        );
    }

    /// Add a node to `user`'s tree; ignored until [`Self::add_user`] created it
    pub fn add_node(&mut self, user: &str, node: Node) {
        if let Some(tree) = self.trees.get_mut(user) {
            tree.nodes.push(node.owned_by(user));
        }
    }

    /// Delete a node (and everything below it) from `user`'s tree
    pub fn remove_node(&mut self, user: &str, node_id: NodeId) {
        if let Some(tree) = self.trees.get_mut(user) {
            let removed: Vec<Node> = tree
                .nodes
                .iter()
                .filter(|n| n.id == node_id)
                .cloned()
                .collect();
            tree.nodes
                .retain(|n| !removed.iter().any(|r| r.contains_path(&n.path)));
        }
    }

    pub fn remove_user(&mut self, user: &str) {
        self.trees.remove(user);
    }

    /// Every root-folder lookup for `user` fails with a storage error
    pub fn fail_user_folder(&mut self, user: &str) {
        self.failing_users.insert(user.to_string());
    }

    /// The owner's tree, provided it still holds `folder`
    ///
    /// A folder without an owner was not handed out by this tree; one its
    /// owner's tree no longer holds was deleted since it was resolved.
    fn tree_for(&self, folder: &Node) -> Result<&UserTree> {
        let Some(owner) = folder.owner.as_deref() else {
            return Err(ExError::new(ExErrorKind::Internal)
                .with_path(folder.path.clone())
                .with_message(format!("node {} carries no owner", folder.id)));
        };
        self.trees
            .get(owner)
            .filter(|t| t.holds(folder))
            .ok_or_else(|| {
                ShareListError::NodeNotFound {
                    user_id: owner.to_string(),
                    node_id: folder.id,
                }
                .into()
            })
    }
}

impl FileTree for InMemoryFileTree {
    fn user_folder(&self, user: &str) -> Result<Node> {
        if self.failing_users.contains(user) {
            return Err(storage_error("filesystem backend unavailable")
                .with_op("user_folder")
                .with_user_id(user));
        }
        self.trees
            .get(user)
            .map(|t| t.root.clone())
            .ok_or_else(|| {
                ShareListError::UserNotFound {
                    user_id: user.to_string(),
                }
                .into()
            })
    }

    fn resolve(&self, folder: &Node, path: &str) -> Result<Option<Node>> {
        let tree = self.tree_for(folder)?;
        let target = normalize_path(&format!("{}/{}", folder.path, path));
        if target == tree.root.path {
            return Ok(Some(tree.root.clone()));
        }
        Ok(tree.nodes.iter().find(|n| n.path == target).cloned())
    }

    fn by_id(&self, folder: &Node, node_id: NodeId) -> Result<Vec<Node>> {
        let tree = self.tree_for(folder)?;
        let mut found: Vec<Node> = Vec::new();
        if tree.root.id == node_id && folder.contains_path(&tree.root.path) {
            found.push(tree.root.clone());
        }
        found.extend(
            tree.nodes
                .iter()
                .filter(|n| n.id == node_id && folder.contains_path(&n.path))
                .cloned(),
        );
        Ok(found)
    }
}

/// User directory over an ordered list of seen users
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Vec<String>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, user: &str) {
        if !self.users.iter().any(|u| u == user) {
            self.users.push(user.to_string());
        }
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn for_each_seen_user(&self, callback: &mut dyn FnMut(&str)) {
        for user in &self.users {
            callback(user);
        }
    }

    fn user_exists(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }
}

/// Report archive holding previously stored reports per target folder
#[derive(Debug, Clone, Default)]
pub struct InMemoryReportArchive {
    reports: HashMap<(String, String), Vec<StoredReport>>,
}

impl InMemoryReportArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report; later stores count as more recent
    pub fn store(&mut self, user: &str, folder: &str, report: StoredReport) {
        self.reports
            .entry((user.to_string(), normalize_path(folder)))
            .or_default()
            .push(report);
    }
}

impl ReportArchive for InMemoryReportArchive {
    fn latest_json_report(&self, user: &str, folder: &str) -> Result<Option<StoredReport>> {
        Ok(self
            .reports
            .get(&(user.to_string(), normalize_path(folder)))
            .and_then(|reports| {
                reports
                    .iter()
                    .rev()
                    .find(|r| r.name.ends_with(crate::report::JSON_REPORT_SUFFIX))
                    .cloned()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn share(id: &str, share_type: ShareType, owner: &str) -> Share {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Share::new(id, share_type, 10, owner, time)
    }

    #[test]
    fn test_group_shares_reach_members() {
        let mut store = InMemoryShareStore::new();
        store.insert(share("1", ShareType::Group, "alice").with_recipient("staff"));
        store.add_group_member("staff", "bob");

        let inbound = store
            .shared_with("bob", ShareType::Group, Page::UNLIMITED)
            .unwrap();
        assert_eq!(inbound.len(), 1);
        assert!(store
            .shared_with("carol", ShareType::Group, Page::UNLIMITED)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_page_window_applies() {
        let mut store = InMemoryShareStore::new();
        for id in ["1", "2", "3"] {
            store.insert(share(id, ShareType::Link, "alice"));
        }
        let page = Page {
            limit: Some(1),
            offset: 1,
        };
        let ids: Vec<String> = store
            .shares_by("alice", ShareType::Link, page)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_by_id_is_scoped_to_folder_subtree() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);
        tree.add_node("alice", Node::folder(2, "/Docs"));
        tree.add_node("alice", Node::file(3, "/Docs/a.txt"));
        tree.add_node("alice", Node::file(4, "/b.txt"));

        let root = tree.user_folder("alice").unwrap();
        let docs = tree.resolve(&root, "Docs").unwrap().unwrap();
        assert_eq!(tree.by_id(&docs, 3).unwrap().len(), 1);
        assert!(tree.by_id(&docs, 4).unwrap().is_empty());
        assert_eq!(tree.by_id(&root, 4).unwrap().len(), 1);
    }

    #[test]
    fn test_removing_folder_removes_descendants() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);
        tree.add_node("alice", Node::folder(2, "/Docs"));
        tree.add_node("alice", Node::file(3, "/Docs/a.txt"));
        tree.remove_node("alice", 2);

        let root = tree.user_folder("alice").unwrap();
        assert!(tree.by_id(&root, 3).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_user_folder_is_not_found() {
        let tree = InMemoryFileTree::new();
        let err = tree.user_folder("ghost").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_identical_folders_resolve_in_their_own_tree() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);
        tree.add_user("bob", 100);
        tree.add_node("alice", Node::folder(2, "/Docs"));
        tree.add_node("bob", Node::folder(2, "/Docs"));
        tree.add_node("bob", Node::file(50, "/Docs/b.txt"));

        let bob_root = tree.user_folder("bob").unwrap();
        let bob_docs = tree.resolve(&bob_root, "/Docs").unwrap().unwrap();
        assert_eq!(bob_docs.owner.as_deref(), Some("bob"));
        for _ in 0..20 {
            assert_eq!(tree.by_id(&bob_docs, 50).unwrap().len(), 1);
        }

        let alice_root = tree.user_folder("alice").unwrap();
        let alice_docs = tree.resolve(&alice_root, "/Docs").unwrap().unwrap();
        assert!(tree.by_id(&alice_docs, 50).unwrap().is_empty());
    }

    #[test]
    fn test_deleted_folder_is_node_not_found() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);
        tree.add_node("alice", Node::folder(2, "/Docs"));
        let root = tree.user_folder("alice").unwrap();
        let docs = tree.resolve(&root, "Docs").unwrap().unwrap();
        tree.remove_node("alice", 2);

        let err = tree.by_id(&docs, 3).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.user_id(), Some("alice"));
    }

    #[test]
    fn test_folder_without_owner_is_rejected() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);

        let err = tree.resolve(&Node::folder(1, "/"), "Docs").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Internal);
        assert_eq!(err.code(), "ERR_INTERNAL");
    }

    #[test]
    fn test_backend_failures_are_storage_errors() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);
        tree.fail_user_folder("alice");
        let err = tree.user_folder("alice").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert_eq!(err.op(), Some("user_folder"));
        assert!(err.message().contains("filesystem backend unavailable"));
    }
}
