//! The narrow interface the reconciler uses to build and mutate host nodes.

use crate::value::{EventHandler, PropValue};

/// Opaque handle to a node owned by the host document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(pub u64);

/// Host document collaborator.
///
/// Implementations are single-threaded and must tolerate re-entrant calls:
/// a listener invoked through the document may trigger a re-render that calls
/// back into it. Do not hold interior borrows while invoking handlers.
pub trait HostDocument {
    fn create_element(&self, tag: &str) -> HostNode;
    fn create_text(&self, text: &str) -> HostNode;

    fn append_child(&self, parent: HostNode, child: HostNode);
    fn replace_child(&self, parent: HostNode, new_child: HostNode, old_child: HostNode);
    fn remove_child(&self, parent: HostNode, child: HostNode);
    fn parent(&self, node: HostNode) -> Option<HostNode>;

    /// `event` is already lower-cased.
    fn add_listener(&self, node: HostNode, event: &str, handler: &EventHandler);
    fn remove_listener(&self, node: HostNode, event: &str, handler: &EventHandler);

    fn property(&self, node: HostNode, key: &str) -> Option<PropValue>;
    fn set_property(&self, node: HostNode, key: &str, value: &PropValue);

    /// `node` and its subtree were detached for good and will not be used again.
    fn release(&self, _node: HostNode) {}
}
