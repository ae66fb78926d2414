//! Collaborator contracts implemented by the surrounding system
//!
//! The core only reads through these traits. Every method returns the
//! structured [`ExError`] so that callers can decide whether a failure is
//! fatal (enumeration) or means "exclude this item" (filter predicates).

use crate::errors::Result;
use crate::model::{Node, NodeId, Share, ShareType};

/// Pagination window passed to share-store queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// `None` requests every result
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    /// Unlimited results starting at offset 0
    pub const UNLIMITED: Page = Page {
        limit: None,
        offset: 0,
    };

    /// Apply this window to a result list
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let rest = items.iter().skip(self.offset);
        match self.limit {
            Some(limit) => rest.take(limit).cloned().collect(),
            None => rest.cloned().collect(),
        }
    }
}

/// Source of share records
pub trait ShareStore {
    /// Shares of `share_type` owned or initiated by `user` (outbound)
    fn shares_by(&self, user: &str, share_type: ShareType, page: Page) -> Result<Vec<Share>>;

    /// Shares of `share_type` granted to `user` (inbound)
    fn shared_with(&self, user: &str, share_type: ShareType, page: Page) -> Result<Vec<Share>>;

    /// Direct lookup of a link or email share by its token
    fn share_by_token(&self, token: &str) -> Result<Option<Share>>;

    /// Every share known to the store
    fn all_shares(&self) -> Result<Vec<Share>>;
}

/// Per-user view of the filesystem
pub trait FileTree {
    /// Root folder of `user`
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist.
    fn user_folder(&self, user: &str) -> Result<Node>;

    /// Resolve a user-relative path below `folder`; `None` if nothing is there
    fn resolve(&self, folder: &Node, path: &str) -> Result<Option<Node>>;

    /// Nodes with id `node_id` at or below `folder` (empty if none)
    fn by_id(&self, folder: &Node, node_id: NodeId) -> Result<Vec<Node>>;
}

/// Directory of known users
pub trait UserDirectory {
    /// Invoke `callback` once for every user that has ever logged in
    fn for_each_seen_user(&self, callback: &mut dyn FnMut(&str));

    fn user_exists(&self, user: &str) -> bool;
}
