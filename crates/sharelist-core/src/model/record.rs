//! Flat, serializable projection of a share

use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::permissions::Permissions;

/// One row of a shares report
///
/// Serializes to a flat JSON object whose key order is the report column
/// order: `id, file_id, owner, initiator, time, permissions`, then
/// `path, name, is_directory` when the node resolved, then `type` with the
/// type-specific fields, then `expiration` when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRecord {
    pub id: String,
    pub file_id: NodeId,
    pub owner: String,
    pub initiator: String,
    /// Share time, RFC 3339 with numeric offset
    pub time: String,
    pub permissions: Permissions,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub location: Option<NodeLocation>,
    #[serde(flatten)]
    pub target: ShareTarget,
    /// `YYYY-MM-DD HH:MM:SS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

/// Where the shared node sits in its owner's tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLocation {
    pub path: String,
    pub name: String,
    pub is_directory: bool,
}

/// Type discriminant plus exactly the fields meaningful for that type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShareTarget {
    User {
        recipient: Option<String>,
    },
    Group {
        recipient: Option<String>,
    },
    Link {
        token: Option<String>,
    },
    Email {
        recipient: Option<String>,
        token: Option<String>,
    },
    Federated {
        recipient: Option<String>,
    },
}

impl ShareTarget {
    /// The `type` tag as written in reports
    pub fn type_name(&self) -> &'static str {
        match self {
            ShareTarget::User { .. } => "user",
            ShareTarget::Group { .. } => "group",
            ShareTarget::Link { .. } => "link",
            ShareTarget::Email { .. } => "email",
            ShareTarget::Federated { .. } => "federated",
        }
    }
}

impl FormattedRecord {
    pub fn is_directory(&self) -> bool {
        self.location.as_ref().is_some_and(|l| l.is_directory)
    }

    pub fn path(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.path.as_str())
    }
}
