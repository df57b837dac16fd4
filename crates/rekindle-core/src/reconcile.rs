//! Materialization and positional diffing of the rendered tree.
//!
//! The rendered tree lives in a slotmap arena owned by the [`Runtime`]. Each entry
//! records the host node it produced, so the reconciler never holds direct
//! references between rendered nodes and host nodes.
//!
//! Children are matched by index only. Reordering a list therefore patches or
//! replaces every position whose descriptor changed; there is no keyed matching.

use std::collections::BTreeSet;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::element::{Element, Node};
use crate::error::RenderError;
use crate::host::HostNode;
use crate::instance::Instance;
use crate::runtime::Runtime;
use crate::value::{CHILDREN, PropValue, Props, event_name};

new_key_type! {
    /// Address of a rendered node in the runtime's arena.
    pub struct NodeKey;
}

pub(crate) enum Mounted {
    Element {
        /// Descriptor this node was last patched to; supplies tag and props for the next diff.
        source: Rc<Element>,
        children: Vec<NodeKey>,
        dom: HostNode,
    },
    Text {
        text: Rc<str>,
        dom: HostNode,
    },
    Component(Box<Instance>),
}

enum Plan {
    Keep,
    Patch(Rc<Element>),
    Rerender(Rc<crate::element::ComponentElement>),
    Replace,
}

impl Runtime {
    /// Host node produced by `key`, following component instances down to their output.
    pub fn host_node(&self, key: NodeKey) -> Option<HostNode> {
        let tree = self.0.tree.borrow();
        let mut key = key;
        loop {
            match tree.get(key)? {
                Mounted::Element { dom, .. } | Mounted::Text { dom, .. } => return Some(*dom),
                Mounted::Component(inst) => key = inst.child?,
            }
        }
    }

    /// Creates host nodes for `node` and its subtree. Component descriptors become new instances.
    pub(crate) fn materialize(&self, node: Node) -> Result<NodeKey, RenderError> {
        let doc = self.0.document.clone();
        match node {
            Node::Text(text) => {
                let dom = doc.create_text(&text);
                Ok(self.0.tree.borrow_mut().insert(Mounted::Text { text, dom }))
            }
            Node::Element(el) => {
                let dom = doc.create_element(&el.tag);
                self.apply_props(dom, &el.props);

                let mut children = Vec::with_capacity(el.children.len());
                for child in &el.children {
                    match self.materialize(child.clone()) {
                        Ok(key) => {
                            if let Some(host) = self.host_node(key) {
                                doc.append_child(dom, host);
                            }
                            children.push(key);
                        }
                        Err(e) => {
                            for key in children {
                                self.dispose(key);
                            }
                            doc.release(dom);
                            return Err(e);
                        }
                    }
                }

                Ok(self.0.tree.borrow_mut().insert(Mounted::Element {
                    source: el,
                    children,
                    dom,
                }))
            }
            Node::Component(desc) => {
                let key = self
                    .0
                    .tree
                    .borrow_mut()
                    .insert(Mounted::Component(Box::new(Instance::new(desc))));
                if let Err(e) = self.render_instance(key) {
                    self.dispose(key);
                    return Err(e);
                }
                Ok(key)
            }
        }
    }

    /// Moves the node at `old` to `new`, reusing it where possible.
    ///
    /// Returns the key now occupying the position: `old` when patched in place, a
    /// fresh key when the node was replaced (the old one is disposed).
    pub(crate) fn reconcile(&self, old: NodeKey, new: Node) -> Result<NodeKey, RenderError> {
        let plan = {
            let tree = self.0.tree.borrow();
            match (tree.get(old), &new) {
                (None, _) => None,
                (Some(Mounted::Element { source, .. }), Node::Element(el)) if source.tag == el.tag => {
                    Some(Plan::Patch(el.clone()))
                }
                (Some(Mounted::Text { text, .. }), Node::Text(t)) if text == t => Some(Plan::Keep),
                (Some(Mounted::Component(inst)), Node::Component(desc))
                    if inst.component.id() == desc.component.id() =>
                {
                    if Rc::ptr_eq(&inst.descriptor, desc) {
                        Some(Plan::Keep)
                    } else {
                        Some(Plan::Rerender(desc.clone()))
                    }
                }
                _ => Some(Plan::Replace),
            }
        };

        match plan {
            None => self.materialize(new),
            Some(Plan::Keep) => Ok(old),
            Some(Plan::Patch(el)) => {
                self.patch_element(old, el)?;
                Ok(old)
            }
            Some(Plan::Rerender(desc)) => {
                let previous = self.with_instance_mut(old, |inst| {
                    let component = std::mem::replace(&mut inst.component, desc.component.clone());
                    (component, std::mem::replace(&mut inst.descriptor, desc))
                });
                if let Err(e) = self.render_instance(old) {
                    // The host tree still shows the previous props.
                    if let Some((component, descriptor)) = previous {
                        self.with_instance_mut(old, |inst| {
                            inst.component = component;
                            inst.descriptor = descriptor;
                        });
                    }
                    return Err(e);
                }
                Ok(old)
            }
            Some(Plan::Replace) => self.replace(old, new),
        }
    }

    fn replace(&self, old: NodeKey, new: Node) -> Result<NodeKey, RenderError> {
        let old_dom = self.host_node(old);
        let fresh = self.materialize(new)?;
        if let (Some(old_dom), Some(new_dom)) = (old_dom, self.host_node(fresh))
            && let Some(parent) = self.0.document.parent(old_dom)
        {
            self.0.document.replace_child(parent, new_dom, old_dom);
        }
        self.dispose(old);
        if let Some(old_dom) = old_dom {
            self.0.document.release(old_dom);
        }
        Ok(fresh)
    }

    fn patch_element(&self, key: NodeKey, new: Rc<Element>) -> Result<(), RenderError> {
        let (dom, old_source, old_children) = match self.0.tree.borrow().get(key) {
            Some(Mounted::Element {
                source,
                children,
                dom,
            }) => (*dom, source.clone(), children.clone()),
            _ => return Ok(()),
        };
        let doc = self.0.document.clone();

        self.patch_props(dom, &old_source.props, &new.props);

        let len = old_children.len().max(new.children.len());
        let mut next = Vec::with_capacity(new.children.len());
        let mut failure = None;
        for i in 0..len {
            match (old_children.get(i).copied(), new.children.get(i)) {
                (Some(old), None) => {
                    let host = self.host_node(old);
                    if let Some(host) = host {
                        doc.remove_child(dom, host);
                    }
                    self.dispose(old);
                    if let Some(host) = host {
                        doc.release(host);
                    }
                }
                (None, Some(child)) => match self.materialize(child.clone()) {
                    Ok(fresh) => {
                        if let Some(host) = self.host_node(fresh) {
                            doc.append_child(dom, host);
                        }
                        next.push(fresh);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                },
                (Some(old), Some(child)) => match self.reconcile(old, child.clone()) {
                    Ok(kept) => next.push(kept),
                    Err(e) => {
                        // Positions from `i` on were not touched.
                        next.extend_from_slice(&old_children[i..]);
                        failure = Some(e);
                        break;
                    }
                },
                (None, None) => {}
            }
        }

        if let Some(Mounted::Element {
            source, children, ..
        }) = self.0.tree.borrow_mut().get_mut(key)
        {
            *source = new;
            *children = next;
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn apply_props(&self, dom: HostNode, props: &Props) {
        let doc = &self.0.document;
        for (key, value) in props.iter() {
            if key == CHILDREN {
                continue;
            }
            if let (Some(event), PropValue::Handler(handler)) = (event_name(key), value) {
                doc.add_listener(dom, &event, handler);
            } else if key == "ref" {
                if let PropValue::Ref(node_ref) = value {
                    node_ref.set(Some(dom));
                }
            } else {
                doc.set_property(dom, key, value);
            }
        }
    }

    fn patch_props(&self, dom: HostNode, old: &Props, new: &Props) {
        let doc = &self.0.document;
        let keys: BTreeSet<&str> = old.keys().chain(new.keys()).collect();
        for key in keys {
            if key == CHILDREN {
                continue;
            }
            let (before, after) = (old.get(key), new.get(key));

            let (old_handler, new_handler) = (
                before.and_then(PropValue::as_handler),
                after.and_then(PropValue::as_handler),
            );
            if let Some(event) = event_name(key)
                && (old_handler.is_some() || new_handler.is_some())
            {
                let changed = match (old_handler, new_handler) {
                    (Some(a), Some(b)) => !a.ptr_eq(b),
                    (None, None) => false,
                    _ => true,
                };
                if changed {
                    if let Some(h) = old_handler {
                        doc.remove_listener(dom, &event, h);
                    }
                    if let Some(h) = new_handler {
                        doc.add_listener(dom, &event, h);
                    }
                }
                if new_handler.is_some() {
                    if before.is_some() && old_handler.is_none() {
                        doc.set_property(dom, key, &PropValue::Null);
                    }
                    continue;
                }
                // A plain value under an `onX` key is an ordinary property.
            }

            if key == "ref" {
                if let Some(PropValue::Ref(prev)) = before
                    && !before.zip(after).is_some_and(|(a, b)| a.same(b))
                {
                    prev.set(None);
                }
                if let Some(PropValue::Ref(node_ref)) = after {
                    node_ref.set(Some(dom));
                }
                continue;
            }

            let value = after.cloned().unwrap_or_default();
            let current = doc.property(dom, key).unwrap_or_default();
            if !current.same(&value) {
                doc.set_property(dom, key, &value);
            }
        }
    }

    /// Drops `key` and everything below it from the arena.
    ///
    /// Component instances run their pending effect cleanups and disposers, and
    /// `ref` boxes are cleared. Host nodes are not detached here; callers remove
    /// the top-most host node.
    pub(crate) fn dispose(&self, key: NodeKey) {
        let removed = self.0.tree.borrow_mut().remove(key);
        match removed {
            None | Some(Mounted::Text { .. }) => {}
            Some(Mounted::Element {
                source, children, ..
            }) => {
                if let Some(PropValue::Ref(node_ref)) = source.props.get("ref") {
                    node_ref.set(None);
                }
                for child in children {
                    self.dispose(child);
                }
            }
            Some(Mounted::Component(inst)) => {
                let inst = *inst;
                let child = inst.child;
                inst.teardown();
                if let Some(child) = child {
                    self.dispose(child);
                }
            }
        }
    }
}
