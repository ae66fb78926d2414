pub mod node;
pub mod permissions;
pub mod record;
pub mod share;

pub use node::{Node, NodeId, NodeKind};
pub use permissions::Permissions;
pub use record::{FormattedRecord, NodeLocation, ShareTarget};
pub use share::{Share, ShareId, ShareType};
