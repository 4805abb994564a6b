use std::any::Any;

use crate::core::{id::NodeId, world::Core};

/// A value stored alongside a node, keyed by its type.
///
/// Attachments live exactly as long as their node. When the node is
/// disposed each attachment's [`dispose`](Attachment::dispose) hook runs
/// before the attachment is dropped.
pub trait Attachment: Any {
    /// Release resources held on behalf of `node`.
    fn dispose(&mut self, _core: &mut Core, _node: NodeId) {}
}
