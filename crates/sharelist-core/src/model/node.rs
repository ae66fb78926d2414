use serde::{Deserialize, Serialize};

/// Filesystem node identifier (the `file_id` of a report record)
pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// A node in a user's file tree, as seen from that user's root folder
///
/// `path` is relative to the user's root folder and starts with `/`; the
/// root folder itself has path `/` and an empty name. `owner` names the user
/// whose tree the node was resolved in; two users may see the same node id
/// at the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Node {
    pub fn file(id: NodeId, path: impl Into<String>) -> Self {
        Self::new(id, path, NodeKind::File)
    }

    pub fn folder(id: NodeId, path: impl Into<String>) -> Self {
        Self::new(id, path, NodeKind::Folder)
    }

    fn new(id: NodeId, path: impl Into<String>, kind: NodeKind) -> Self {
        let path = normalize_path(&path.into());
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            id,
            path,
            name,
            kind,
            owner: None,
        }
    }

    pub fn owned_by(mut self, user: impl Into<String>) -> Self {
        self.owner = Some(user.into());
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// True if `other` lies at or below this node
    pub fn contains_path(&self, other: &str) -> bool {
        if self.path == "/" {
            return true;
        }
        other == self.path
            || other
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Canonical form of a user-relative path: leading `/`, no trailing `/`,
/// no empty segments.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}
