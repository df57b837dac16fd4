use std::rc::Rc;

use crate::element::Node;
use crate::error::RenderError;
use crate::host::{HostDocument, HostNode};
use crate::reconcile::NodeKey;
use crate::runtime::{Runtime, RuntimeConfig};

/// A tree attached to a host container.
///
/// Dropping the root unmounts the tree, exactly like [`Root::unmount`].
pub struct Root {
    runtime: Runtime,
    key: NodeKey,
    container: HostNode,
}

/// Renders `root` once and appends the result to `container`.
pub fn mount(
    document: Rc<dyn HostDocument>,
    container: HostNode,
    root: Node,
) -> Result<Root, RenderError> {
    mount_with(document, container, root, RuntimeConfig::default())
}

pub fn mount_with(
    document: Rc<dyn HostDocument>,
    container: HostNode,
    root: Node,
    config: RuntimeConfig,
) -> Result<Root, RenderError> {
    let runtime = Runtime::new(document, config);
    let key = runtime.materialize(root)?;
    if let Some(node) = runtime.host_node(key) {
        runtime.document().append_child(container, node);
    }
    log::debug!(
        "mounted root into {container:?} ({} rendered nodes)",
        runtime.node_count()
    );
    Ok(Root {
        runtime,
        key,
        container,
    })
}

impl Root {
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn container(&self) -> HostNode {
        self.container
    }

    /// Top-most host node of the tree.
    pub fn host_node(&self) -> Option<HostNode> {
        self.runtime.host_node(self.key)
    }

    pub fn pending_tasks(&self) -> usize {
        self.runtime.pending_tasks()
    }

    /// Drains deferred refreshes and dispatches.
    pub fn run_until_idle(&self) -> usize {
        self.runtime.run_until_idle()
    }

    /// Detaches the tree from the container and disposes every instance, running effect cleanups.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        let node = self.host_node();
        if let Some(node) = node {
            self.runtime.document().remove_child(self.container, node);
        }
        self.runtime.dispose(self.key);
        if let Some(node) = node {
            self.runtime.document().release(node);
        }
        log::debug!("unmounted root from {:?}", self.container);
    }
}
