use chrono::{DateTime, TimeZone, Utc};
use sharelist_core::memory::{InMemoryFileTree, InMemoryShareStore, InMemoryUserDirectory};
use sharelist_core::model::Node;
use sharelist_core::{Permissions, Share, ShareType, SharesList};

/// Collaborators of one test scenario
pub struct World {
    pub store: InMemoryShareStore,
    pub tree: InMemoryFileTree,
    pub directory: InMemoryUserDirectory,
}

impl World {
    #[allow(dead_code)]
    pub fn service(&self) -> SharesList<'_> {
        SharesList::new(&self.store, &self.tree, &self.directory)
    }
}

/// Fixed share time used by every fixture share
#[allow(dead_code)]
pub fn share_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

/// alice, bob and carol with a few files and a mix of share types
///
/// | id | type   | owner | initiator | node                        |
/// |----|--------|-------|-----------|-----------------------------|
/// | 1  | user   | alice | alice     | /Documents/report.pdf       |
/// | 2  | group  | alice | alice     | /Documents                  |
/// | 3  | link   | alice | alice     | /photo.jpg (expires)        |
/// | 4  | email  | alice | alice     | /Documents/Drafts/v1.txt    |
/// | 5  | remote | alice | alice     | /Überblick – 報告.md        |
/// | 6  | user   | bob   | bob       | bob's /Shared               |
/// | 7  | user   | alice | bob       | /Documents/report.pdf       |
/// | 8  | link   | alice | alice     | deleted node (orphan)       |
/// | 9  | link   | ghost | ghost     | owner has no tree (orphan)  |
#[allow(dead_code)]
pub fn sample_world() -> World {
    let mut tree = InMemoryFileTree::new();
    tree.add_user("alice", 1);
    tree.add_node("alice", Node::folder(2, "/Documents"));
    tree.add_node("alice", Node::file(3, "/Documents/report.pdf"));
    tree.add_node("alice", Node::folder(4, "/Documents/Drafts"));
    tree.add_node("alice", Node::file(5, "/Documents/Drafts/v1.txt"));
    tree.add_node("alice", Node::file(6, "/photo.jpg"));
    tree.add_node("alice", Node::file(7, "/Überblick – 報告.md"));
    tree.add_user("bob", 100);
    tree.add_node("bob", Node::folder(101, "/Shared"));
    tree.add_user("carol", 200);
    tree.add_node("carol", Node::folder(201, "/Reports"));
    tree.add_node("carol", Node::file(202, "/notes.txt"));

    let at = share_time();
    let mut store = InMemoryShareStore::new();
    store.insert(
        Share::new("1", ShareType::User, 3, "alice", at)
            .with_recipient("bob")
            .with_permissions(Permissions::READ),
    );
    store.insert(Share::new("2", ShareType::Group, 2, "alice", at).with_recipient("staff"));
    store.insert(
        Share::new("3", ShareType::Link, 6, "alice", at)
            .with_token("tok-photo")
            .with_permissions(Permissions::READ)
            .with_expiration(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
    );
    store.insert(
        Share::new("4", ShareType::Email, 5, "alice", at)
            .with_recipient("ext@example.com")
            .with_token("tok-mail"),
    );
    store.insert(
        Share::new("5", ShareType::Remote, 7, "alice", at).with_recipient("dave@remote.example"),
    );
    store.insert(Share::new("6", ShareType::User, 101, "bob", at).with_recipient("alice"));
    store.insert(
        Share::new("7", ShareType::User, 3, "alice", at)
            .with_initiator("bob")
            .with_recipient("carol"),
    );
    store.insert(Share::new("8", ShareType::Link, 999, "alice", at).with_token("tok-orphan"));
    store.insert(Share::new("9", ShareType::Link, 3, "ghost", at).with_token("tok-ghost"));
    store.add_group_member("staff", "bob");
    store.add_group_member("staff", "carol");

    let mut directory = InMemoryUserDirectory::new();
    for user in ["alice", "bob", "carol"] {
        directory.add_user(user);
    }

    World {
        store,
        tree,
        directory,
    }
}

/// Ids of a share sequence, panicking on the first error
#[allow(dead_code)]
pub fn ids(shares: impl Iterator<Item = sharelist_core::Result<Share>>) -> Vec<String> {
    shares.map(|s| s.unwrap().id).collect()
}
