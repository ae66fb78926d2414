//! Share filter pipeline
//!
//! Stages wrap the enumerated stream one predicate at a time, in this order:
//!
//! 1. path (short-circuits to [`FilteredShares::PathNotFound`] when the path
//!    does not resolve)
//! 2. token (replaces the source with a direct token lookup)
//! 3. role
//! 4. expiration
//! 5. orphan exclusion, always last
//!
//! Nothing is evaluated until the consumer pulls. Lookup failures inside a
//! predicate exclude the share; they never end the stream. Store failures
//! from enumeration pass through untouched.

use serde::Deserialize;

use crate::enumerate::{ShareEnumerator, ShareStream};
use crate::errors::{Result, ShareListError};
use crate::model::{Node, Share};
use crate::ports::{FileTree, ShareStore};

/// Filter selector as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterCode {
    #[default]
    None,
    Owner,
    Initiator,
    Recipient,
    /// Accepted for compatibility; token filtering is driven by the token value
    Token,
    HasExpiration,
    NoExpiration,
}

impl FilterCode {
    /// Total mapping from the textual filter name; unknown or absent is `None`
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("owner") => FilterCode::Owner,
            Some("initiator") => FilterCode::Initiator,
            Some("recipient") => FilterCode::Recipient,
            Some("token") => FilterCode::Token,
            Some("has-expiration") => FilterCode::HasExpiration,
            Some("no-expiration") => FilterCode::NoExpiration,
            _ => FilterCode::None,
        }
    }

    pub fn role(&self) -> RoleFilter {
        match self {
            FilterCode::Owner => RoleFilter::Owner,
            FilterCode::Initiator => RoleFilter::Initiator,
            FilterCode::Recipient => RoleFilter::Recipient,
            _ => RoleFilter::None,
        }
    }

    pub fn expiration(&self) -> ExpirationFilter {
        match self {
            FilterCode::HasExpiration => ExpirationFilter::HasExpiration,
            FilterCode::NoExpiration => ExpirationFilter::NoExpiration,
            _ => ExpirationFilter::Any,
        }
    }
}

impl From<&str> for FilterCode {
    fn from(value: &str) -> Self {
        FilterCode::parse(Some(value))
    }
}

/// Position of a share relative to the queried user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    None,
    Owner,
    Initiator,
    /// Neither owner nor initiator. Group and link recipients cannot be
    /// identified precisely, but nobody can share with themselves.
    Recipient,
}

impl RoleFilter {
    pub fn matches(&self, share: &Share, user: Option<&str>) -> bool {
        let is = |who: &str| user == Some(who);
        match self {
            RoleFilter::None => true,
            RoleFilter::Owner => is(&share.owner),
            RoleFilter::Initiator => is(&share.initiator),
            RoleFilter::Recipient => !is(&share.owner) && !is(&share.initiator),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpirationFilter {
    #[default]
    Any,
    HasExpiration,
    NoExpiration,
}

impl ExpirationFilter {
    pub fn matches(&self, share: &Share) -> bool {
        match self {
            ExpirationFilter::Any => true,
            ExpirationFilter::HasExpiration => share.expiration.is_some(),
            ExpirationFilter::NoExpiration => share.expiration.is_none(),
        }
    }
}

/// Named filters for one enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub user: Option<String>,
    pub path: Option<String>,
    pub token: Option<String>,
    pub role: RoleFilter,
    pub expiration: ExpirationFilter,
}

impl FilterOptions {
    /// Shares of every user
    pub fn all_users() -> Self {
        Self::default()
    }

    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_role(mut self, role: RoleFilter) -> Self {
        self.role = role;
        self
    }

    pub fn with_expiration(mut self, expiration: ExpirationFilter) -> Self {
        self.expiration = expiration;
        self
    }

    /// Set role and expiration stages from a single filter code
    pub fn with_filter_code(self, code: FilterCode) -> Self {
        self.with_role(code.role()).with_expiration(code.expiration())
    }
}

/// Output of the pipeline
///
/// `PathNotFound` behaves as an empty iterator but lets callers tell "the
/// path did not resolve" apart from "nothing matched".
pub enum FilteredShares<'a> {
    Shares(ShareStream<'a>),
    PathNotFound { path: String },
}

impl FilteredShares<'_> {
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, FilteredShares::PathNotFound { .. })
    }
}

impl Iterator for FilteredShares<'_> {
    type Item = Result<Share>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            FilteredShares::Shares(shares) => shares.next(),
            FilteredShares::PathNotFound { .. } => None,
        }
    }
}

/// Predicate stages over an enumerated share stream
#[derive(Clone, Copy)]
pub struct FilterPipeline<'a> {
    enumerator: ShareEnumerator<'a>,
    store: &'a dyn ShareStore,
    tree: &'a dyn FileTree,
}

impl<'a> FilterPipeline<'a> {
    pub fn new(
        enumerator: ShareEnumerator<'a>,
        store: &'a dyn ShareStore,
        tree: &'a dyn FileTree,
    ) -> Self {
        Self {
            enumerator,
            store,
            tree,
        }
    }

    /// Build the filtered stream for `options`
    ///
    /// When both a token and a path are given, the path must still resolve,
    /// but the token lookup replaces the path-filtered source.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a path is given without a user.
    pub fn run(&self, options: &FilterOptions) -> Result<FilteredShares<'a>> {
        let user = options.user.clone();
        let tree = self.tree;

        let mut shares: ShareStream<'a> = self.enumerator.enumerate(user.as_deref());

        if let Some(path) = &options.path {
            let Some(user) = user.as_deref() else {
                return Err(ShareListError::PathRequiresUser { path: path.clone() }.into());
            };
            let Some(node) = resolve_user_path(tree, user, path) else {
                return Ok(FilteredShares::PathNotFound { path: path.clone() });
            };
            shares = Box::new(shares.filter(move |item| {
                keep(item, |share| {
                    node.id == share.node_id || contains_node(tree, &node, share)
                })
            }));
        }

        if let Some(token) = options.token.clone() {
            let store = self.store;
            shares = Box::new(
                std::iter::once_with(move || store.share_by_token(&token))
                    .filter_map(|found| found.transpose()),
            );
        }

        let role = options.role;
        if role != RoleFilter::None {
            let user = user.clone();
            shares = Box::new(
                shares.filter(move |item| keep(item, |share| role.matches(share, user.as_deref()))),
            );
        }

        let expiration = options.expiration;
        if expiration != ExpirationFilter::Any {
            shares = Box::new(shares.filter(move |item| keep(item, |s| expiration.matches(s))));
        }

        Ok(FilteredShares::Shares(exclude_orphans(tree, shares)))
    }

    /// Shares on nodes strictly inside the folder at `path` of `user`
    ///
    /// Sourced from every share in the store. The folder's own shares are
    /// excluded, and a path naming a file yields nothing.
    pub fn sub_shares(&self, user: &str, path: &str, role: RoleFilter) -> FilteredShares<'a> {
        let tree = self.tree;
        let Some(node) = resolve_user_path(tree, user, path) else {
            return FilteredShares::PathNotFound {
                path: path.to_string(),
            };
        };

        let below = move |share: &Share| {
            node.id != share.node_id && node.is_folder() && contains_node(tree, &node, share)
        };
        let mut shares: ShareStream<'a> = Box::new(
            self.enumerator
                .all_shares()
                .filter(move |item| keep(item, &below)),
        );

        if role != RoleFilter::None {
            let user = user.to_string();
            shares = Box::new(
                shares.filter(move |item| keep(item, |share| role.matches(share, Some(&user)))),
            );
        }

        FilteredShares::Shares(exclude_orphans(tree, shares))
    }
}

/// Locate the shared node in its owner's tree
///
/// # Errors
///
/// Propagates collaborator failures (owner gone, backend unavailable),
/// tagged with the share id.
pub fn locate_share_node(tree: &dyn FileTree, share: &Share) -> Result<Option<Node>> {
    tree.user_folder(&share.owner)
        .and_then(|folder| tree.by_id(&folder, share.node_id))
        .map(|nodes| nodes.into_iter().next())
        .map_err(|e| e.with_share_id(share.id.clone()))
}

/// Orphan stage: drop shares whose node no longer resolves for the owner
fn exclude_orphans<'a>(tree: &'a dyn FileTree, shares: ShareStream<'a>) -> ShareStream<'a> {
    Box::new(shares.filter(move |item| {
        keep(item, |share| match locate_share_node(tree, share) {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::debug!(
                    share_id = %share.id,
                    node_id = share.node_id,
                    "excluding orphan share"
                );
                false
            }
            Err(e) => {
                tracing::debug!(
                    share_id = %share.id,
                    err_code = e.code(),
                    "excluding share: owner tree lookup failed"
                );
                false
            }
        })
    }))
}

fn resolve_user_path(tree: &dyn FileTree, user: &str, path: &str) -> Option<Node> {
    let resolved = tree
        .user_folder(user)
        .and_then(|folder| tree.resolve(&folder, path));
    match resolved {
        Ok(node) => node,
        Err(e) => {
            tracing::debug!(user_id = user, path, err_code = e.code(), "path resolution failed");
            None
        }
    }
}

fn contains_node(tree: &dyn FileTree, folder: &Node, share: &Share) -> bool {
    if !folder.is_folder() {
        return false;
    }
    match tree.by_id(folder, share.node_id) {
        Ok(nodes) => !nodes.is_empty(),
        Err(e) => {
            tracing::debug!(share_id = %share.id, err_code = e.code(), "subtree lookup failed");
            false
        }
    }
}

/// Apply a predicate to successful items; errors always pass through
fn keep(item: &Result<Share>, predicate: impl FnOnce(&Share) -> bool) -> bool {
    item.as_ref().map_or(true, predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn share(owner: &str, initiator: &str) -> Share {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Share::new("1", crate::model::ShareType::User, 1, owner, time).with_initiator(initiator)
    }

    #[test]
    fn test_filter_code_parsing_is_total() {
        assert_eq!(FilterCode::parse(Some("owner")), FilterCode::Owner);
        assert_eq!(FilterCode::parse(Some("has-expiration")), FilterCode::HasExpiration);
        assert_eq!(FilterCode::parse(Some("no-expiration")), FilterCode::NoExpiration);
        assert_eq!(FilterCode::parse(Some("OWNER")), FilterCode::None);
        assert_eq!(FilterCode::parse(Some("")), FilterCode::None);
        assert_eq!(FilterCode::parse(None), FilterCode::None);
        assert_eq!(FilterCode::from("recipient"), FilterCode::Recipient);
    }

    #[test]
    fn test_filter_code_splits_into_stages() {
        let options = FilterOptions::for_user("alice").with_filter_code(FilterCode::Initiator);
        assert_eq!(options.role, RoleFilter::Initiator);
        assert_eq!(options.expiration, ExpirationFilter::Any);

        let options = FilterOptions::all_users().with_filter_code(FilterCode::NoExpiration);
        assert_eq!(options.role, RoleFilter::None);
        assert_eq!(options.expiration, ExpirationFilter::NoExpiration);

        let options = FilterOptions::all_users().with_filter_code(FilterCode::Token);
        assert_eq!(options, FilterOptions::all_users());
    }

    #[test]
    fn test_role_matching() {
        let reshare = share("alice", "bob");
        assert!(RoleFilter::Owner.matches(&reshare, Some("alice")));
        assert!(!RoleFilter::Owner.matches(&reshare, Some("bob")));
        assert!(RoleFilter::Initiator.matches(&reshare, Some("bob")));
        assert!(RoleFilter::Recipient.matches(&reshare, Some("carol")));
        assert!(!RoleFilter::Recipient.matches(&reshare, Some("bob")));
        assert!(RoleFilter::None.matches(&reshare, None));
    }

    #[test]
    fn test_role_without_user() {
        let s = share("alice", "alice");
        assert!(!RoleFilter::Owner.matches(&s, None));
        assert!(RoleFilter::Recipient.matches(&s, None));
    }

    #[test]
    fn test_expiration_matching() {
        let open = share("alice", "alice");
        let expiring = open
            .clone()
            .with_expiration(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        assert!(ExpirationFilter::HasExpiration.matches(&expiring));
        assert!(!ExpirationFilter::HasExpiration.matches(&open));
        assert!(ExpirationFilter::NoExpiration.matches(&open));
        assert!(ExpirationFilter::Any.matches(&expiring));
    }

    #[test]
    fn test_locate_share_node_failure_names_the_share() {
        use crate::memory::InMemoryFileTree;

        let mut tree = InMemoryFileTree::new();
        tree.add_user("alice", 1);
        tree.fail_user_folder("alice");

        let err = locate_share_node(&tree, &share("alice", "alice")).unwrap_err();
        assert_eq!(err.share_id(), Some("1"));
        assert_eq!(err.user_id(), Some("alice"));
        assert!(err.to_string().contains("(share_id: 1)"));
    }
}
