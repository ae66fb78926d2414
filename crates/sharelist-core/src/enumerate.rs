//! Share enumeration
//!
//! Merges the per-type outbound/inbound share queries of one user, or of
//! every seen user, into a single lazy stream. A query is only issued when
//! the consumer pulls past the results of the previous one.
//!
//! Store failures are fatal: the stream yields the error once and ends.

use std::collections::HashSet;
use std::vec;

use serde::Deserialize;

use crate::errors::Result;
use crate::model::{Share, ShareId, ShareType};
use crate::ports::{Page, ShareStore, UserDirectory};

/// A lazy, finite sequence of shares
pub type ShareStream<'a> = Box<dyn Iterator<Item = Result<Share>> + 'a>;

/// Where shares come from when no user is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnscopedSource {
    /// Concatenate the enumeration of every seen user
    #[default]
    SeenUsers,
    /// Ask the store for every share in one query
    AllShares,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Owned or initiated by the user
    Outbound,
    /// Shared with the user
    Inbound,
}

/// Entry point for share enumeration
#[derive(Clone, Copy)]
pub struct ShareEnumerator<'a> {
    store: &'a dyn ShareStore,
    directory: &'a dyn UserDirectory,
    unscoped: UnscopedSource,
}

impl<'a> ShareEnumerator<'a> {
    pub fn new(store: &'a dyn ShareStore, directory: &'a dyn UserDirectory) -> Self {
        Self {
            store,
            directory,
            unscoped: UnscopedSource::default(),
        }
    }

    pub fn with_unscoped_source(mut self, unscoped: UnscopedSource) -> Self {
        self.unscoped = unscoped;
        self
    }

    /// Shares of `user`, or of everyone when `user` is `None`
    ///
    /// Each share id appears at most once; the first occurrence wins.
    pub fn enumerate(&self, user: Option<&str>) -> ShareStream<'a> {
        let shares: ShareStream<'a> = match (user, self.unscoped) {
            (Some(user), _) => Box::new(self.for_user(user)),
            (None, UnscopedSource::SeenUsers) => Box::new(SeenUsersShares {
                store: self.store,
                directory: self.directory,
                users: None,
                current: None,
                failed: false,
            }),
            (None, UnscopedSource::AllShares) => self.all_shares(),
        };
        Box::new(unique_by_id(shares))
    }

    /// Outbound then inbound shares of `user`, type by type
    pub fn for_user(&self, user: &str) -> UserShares<'a> {
        UserShares::new(self.store, user)
    }

    /// Every share in the store, fetched on first pull
    pub fn all_shares(&self) -> ShareStream<'a> {
        let store = self.store;
        let fetched = std::iter::once_with(move || store.all_shares());
        Box::new(fetched.flat_map(|batch| -> ShareStream<'a> {
            match batch {
                Ok(shares) => Box::new(shares.into_iter().map(Ok)),
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        }))
    }
}

/// Lazy share sequence for a single user
pub struct UserShares<'a> {
    store: &'a dyn ShareStore,
    user: String,
    queries: Vec<(ShareType, Direction)>,
    next_query: usize,
    current: vec::IntoIter<Share>,
}

impl<'a> UserShares<'a> {
    fn new(store: &'a dyn ShareStore, user: &str) -> Self {
        let queries = ShareType::ALL
            .iter()
            .flat_map(|&share_type| {
                let inbound = share_type
                    .has_recipient()
                    .then_some((share_type, Direction::Inbound));
                std::iter::once((share_type, Direction::Outbound)).chain(inbound)
            })
            .collect();
        Self {
            store,
            user: user.to_string(),
            queries,
            next_query: 0,
            current: Vec::new().into_iter(),
        }
    }

    fn run_query(&self, share_type: ShareType, direction: Direction) -> Result<Vec<Share>> {
        tracing::debug!(
            user_id = %self.user,
            share_type = share_type.as_str(),
            ?direction,
            "querying shares"
        );
        match direction {
            Direction::Outbound => self.store.shares_by(&self.user, share_type, Page::UNLIMITED),
            Direction::Inbound => self
                .store
                .shared_with(&self.user, share_type, Page::UNLIMITED),
        }
    }
}

impl Iterator for UserShares<'_> {
    type Item = Result<Share>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(share) = self.current.next() {
                return Some(Ok(share));
            }
            let (share_type, direction) = *self.queries.get(self.next_query)?;
            self.next_query += 1;
            match self.run_query(share_type, direction) {
                Ok(shares) => self.current = shares.into_iter(),
                Err(e) => {
                    self.next_query = self.queries.len();
                    return Some(Err(e.with_user_id(self.user.clone())));
                }
            }
        }
    }
}

/// Concatenation of every seen user's shares, in directory order
struct SeenUsersShares<'a> {
    store: &'a dyn ShareStore,
    directory: &'a dyn UserDirectory,
    users: Option<vec::IntoIter<String>>,
    current: Option<UserShares<'a>>,
    failed: bool,
}

impl Iterator for SeenUsersShares<'_> {
    type Item = Result<Share>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.users.is_none() {
            let mut seen = Vec::new();
            self.directory
                .for_each_seen_user(&mut |user| seen.push(user.to_string()));
            self.users = Some(seen.into_iter());
        }
        loop {
            if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
                self.failed = item.is_err();
                return Some(item);
            }
            let user = self.users.as_mut()?.next()?;
            self.current = Some(UserShares::new(self.store, &user));
        }
    }
}

/// Drop shares whose id was already produced
fn unique_by_id<'a>(shares: ShareStream<'a>) -> impl Iterator<Item = Result<Share>> + 'a {
    let mut seen: HashSet<ShareId> = HashSet::new();
    shares.filter(move |item| match item {
        Ok(share) => seen.insert(share.id.clone()),
        Err(_) => true,
    })
}
