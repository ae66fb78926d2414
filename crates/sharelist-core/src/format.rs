//! Projection of shares into report records

use chrono::{DateTime, SecondsFormat, Utc};

use crate::filter::locate_share_node;
use crate::model::{FormattedRecord, NodeLocation, Share, ShareTarget, ShareType};
use crate::ports::FileTree;

/// Format of the `expiration` column
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Share → record projection
///
/// Reads the owner's tree to fill in location fields; a node that cannot be
/// resolved leaves them out rather than failing. Orphans never reach the
/// formatter through the filter pipeline.
#[derive(Clone, Copy)]
pub struct ShareFormatter<'a> {
    tree: &'a dyn FileTree,
}

impl<'a> ShareFormatter<'a> {
    pub fn new(tree: &'a dyn FileTree) -> Self {
        Self { tree }
    }

    pub fn format(&self, share: &Share) -> FormattedRecord {
        FormattedRecord {
            id: share.id.clone(),
            file_id: share.node_id,
            owner: share.owner.clone(),
            initiator: share.initiator.clone(),
            time: format_share_time(&share.share_time),
            permissions: share.permissions,
            location: self.location(share),
            target: share_target(share),
            expiration: share.expiration.as_ref().map(format_expiration),
        }
    }

    fn location(&self, share: &Share) -> Option<NodeLocation> {
        match locate_share_node(self.tree, share) {
            Ok(node) => node.map(|node| NodeLocation {
                is_directory: node.is_folder(),
                path: node.path,
                name: node.name,
            }),
            Err(e) => {
                tracing::debug!(
                    share_id = %share.id,
                    err_code = e.code(),
                    "node location unavailable"
                );
                None
            }
        }
    }
}

/// Type-specific fields for a share
pub fn share_target(share: &Share) -> ShareTarget {
    let recipient = share.recipient.clone();
    let token = share.token_value().map(str::to_string);
    match share.share_type {
        ShareType::User => ShareTarget::User { recipient },
        ShareType::Group => ShareTarget::Group { recipient },
        ShareType::Link => ShareTarget::Link { token },
        ShareType::Email => ShareTarget::Email { recipient, token },
        ShareType::Remote => ShareTarget::Federated { recipient },
    }
}

/// RFC 3339 with whole seconds and a numeric offset (`2024-03-01T09:30:00+00:00`)
pub fn format_share_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Rendered in UTC, not the server's local zone. Callers wanting local
/// wall-clock text convert before formatting.
pub fn format_expiration(time: &DateTime<Utc>) -> String {
    time.format(EXPIRATION_FORMAT).to_string()
}
