use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharelist_core_types::Sensitive;

use super::node::NodeId;
use super::permissions::Permissions;

pub type ShareId = String;

/// Kind of grant a share represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    User,
    Group,
    Link,
    Email,
    /// Federated share to a user on another server
    Remote,
}

impl ShareType {
    /// Every share type, in enumeration order
    pub const ALL: [ShareType; 5] = [
        ShareType::User,
        ShareType::Group,
        ShareType::Link,
        ShareType::Email,
        ShareType::Remote,
    ];

    /// Link shares have no recipient, so there is nothing "shared with" a user
    pub fn has_recipient(&self) -> bool {
        !matches!(self, ShareType::Link)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShareType::User => "user",
            ShareType::Group => "group",
            ShareType::Link => "link",
            ShareType::Email => "email",
            ShareType::Remote => "remote",
        }
    }
}

/// A grant of access to a filesystem node, as read from the share store
///
/// The core never mutates shares; they are created and deleted by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub id: ShareId,
    /// May dangle: the node can be deleted after the share was created
    pub node_id: NodeId,
    pub share_type: ShareType,
    pub owner: String,
    pub initiator: String,
    pub recipient: Option<String>,
    pub token: Option<Sensitive<String>>,
    pub permissions: Permissions,
    pub share_time: DateTime<Utc>,
    pub expiration: Option<DateTime<Utc>>,
}

impl Share {
    /// Create a share initiated by its owner, with all permissions
    pub fn new(
        id: impl Into<ShareId>,
        share_type: ShareType,
        node_id: NodeId,
        owner: impl Into<String>,
        share_time: DateTime<Utc>,
    ) -> Self {
        let owner = owner.into();
        Self {
            id: id.into(),
            node_id,
            share_type,
            initiator: owner.clone(),
            owner,
            recipient: None,
            token: None,
            permissions: Permissions::ALL,
            share_time,
            expiration: None,
        }
    }

    pub fn with_initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = initiator.into();
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Sensitive::new(token.into()));
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// The token in clear, for lookups and report output
    pub fn token_value(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose().as_str())
    }
}
