//! # In-memory host document
//!
//! [`Document`] is a small DOM: element and text nodes in a slotmap arena, with
//! parent links, properties and event listeners. It implements
//! [`HostDocument`] so a Rekindle tree can be mounted into it, and offers the
//! inspection helpers a test or a headless host needs (text content, lookup by
//! tag and text, event dispatch, HTML serialization).
//!
//! ```rust,ignore
//! let doc = Document::new();
//! let root = mount(doc.clone(), doc.body(), h!(Component::new(Counter), None))?;
//!
//! let plus = doc.find_element(doc.body(), "button", "+").unwrap();
//! doc.click(plus);
//! assert_eq!(doc.serialize(root.host_node().unwrap()), "<div><p>Count: 1</p>...</div>");
//! ```
//!
//! Events bubble from the target to the root of its tree. Handlers are invoked
//! with no interior borrow held, so they may freely re-render into the document.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::rc::Rc;

use rekindle_core::{Event, EventHandler, HostDocument, HostNode, PropValue};
use slotmap::{Key, KeyData, SlotMap, new_key_type};
use smallvec::SmallVec;

pub mod tests;

new_key_type! {
    struct DomKey;
}

enum Kind {
    Element {
        tag: Rc<str>,
        props: BTreeMap<String, PropValue>,
        listeners: SmallVec<[(Rc<str>, EventHandler); 2]>,
    },
    Text(String),
}

struct DomNode {
    kind: Kind,
    parent: Option<DomKey>,
    children: SmallVec<[DomKey; 4]>,
}

/// Single-threaded document tree.
///
/// Removing a node only detaches it; a detached node is freed together with its
/// subtree once it is released.
pub struct Document {
    nodes: RefCell<SlotMap<DomKey, DomNode>>,
    body: HostNode,
}

fn to_host(key: DomKey) -> HostNode {
    HostNode(key.data().as_ffi())
}

fn to_key(node: HostNode) -> DomKey {
    KeyData::from_ffi(node.0).into()
}

impl Document {
    /// A document containing an empty `body` element.
    pub fn new() -> Rc<Self> {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(DomNode {
            kind: Kind::Element {
                tag: "body".into(),
                props: BTreeMap::new(),
                listeners: SmallVec::new(),
            },
            parent: None,
            children: SmallVec::new(),
        });
        Rc::new(Self {
            nodes: RefCell::new(nodes),
            body: to_host(body),
        })
    }

    pub fn body(&self) -> HostNode {
        self.body
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    fn insert(&self, kind: Kind) -> HostNode {
        let key = self.nodes.borrow_mut().insert(DomNode {
            kind,
            parent: None,
            children: SmallVec::new(),
        });
        to_host(key)
    }

    fn detach(&self, child: DomKey) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
    }

    fn contains(&self, node: HostNode) -> bool {
        let found = self.nodes.borrow().contains_key(to_key(node));
        if !found {
            log::warn!("unknown host node {node:?}");
        }
        found
    }

    /// Tag name of an element node.
    pub fn tag(&self, node: HostNode) -> Option<Rc<str>> {
        match &self.nodes.borrow().get(to_key(node))?.kind {
            Kind::Element { tag, .. } => Some(tag.clone()),
            Kind::Text(_) => None,
        }
    }

    pub fn is_text(&self, node: HostNode) -> bool {
        matches!(
            self.nodes.borrow().get(to_key(node)).map(|n| &n.kind),
            Some(Kind::Text(_))
        )
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.nodes
            .borrow()
            .get(to_key(node))
            .map(|n| n.children.iter().copied().map(to_host).collect())
            .unwrap_or_default()
    }

    /// Whether `node` hangs below the document body.
    pub fn is_attached(&self, node: HostNode) -> bool {
        let nodes = self.nodes.borrow();
        let body = to_key(self.body);
        let mut key = to_key(node);
        loop {
            if key == body {
                return true;
            }
            match nodes.get(key).and_then(|n| n.parent) {
                Some(parent) => key = parent,
                None => return false,
            }
        }
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: HostNode) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        Self::collect_text(&nodes, to_key(node), &mut out);
        out
    }

    fn collect_text(nodes: &SlotMap<DomKey, DomNode>, key: DomKey, out: &mut String) {
        let Some(n) = nodes.get(key) else {
            return;
        };
        match &n.kind {
            Kind::Text(t) => out.push_str(t),
            Kind::Element { .. } => {
                for child in &n.children {
                    Self::collect_text(nodes, *child, out);
                }
            }
        }
    }

    /// Elements below `root` (inclusive) with the given tag, in document order.
    pub fn query_all(&self, root: HostNode, tag: &str) -> Vec<HostNode> {
        let nodes = self.nodes.borrow();
        let mut found = Vec::new();
        let mut stack = vec![to_key(root)];
        while let Some(key) = stack.pop() {
            let Some(n) = nodes.get(key) else {
                continue;
            };
            if let Kind::Element { tag: t, .. } = &n.kind
                && &**t == tag
            {
                found.push(to_host(key));
            }
            stack.extend(n.children.iter().rev().copied());
        }
        found
    }

    /// First element with `tag` whose text content equals `text`.
    pub fn find_element(&self, root: HostNode, tag: &str, text: &str) -> Option<HostNode> {
        self.query_all(root, tag)
            .into_iter()
            .find(|node| self.text_content(*node) == text)
    }

    pub fn listener_count(&self, node: HostNode) -> usize {
        match self.nodes.borrow().get(to_key(node)).map(|n| &n.kind) {
            Some(Kind::Element { listeners, .. }) => listeners.len(),
            _ => 0,
        }
    }

    /// Delivers `kind` to `target` and then to each ancestor. Returns how many handlers ran.
    pub fn dispatch(&self, target: HostNode, kind: &str) -> usize {
        let mut path = Vec::new();
        {
            let nodes = self.nodes.borrow();
            let mut key = Some(to_key(target));
            while let Some(k) = key {
                let Some(n) = nodes.get(k) else {
                    break;
                };
                path.push(k);
                key = n.parent;
            }
        }

        let event = Event {
            kind: kind.into(),
            target,
        };
        let mut ran = 0;
        for key in path {
            let handlers: SmallVec<[EventHandler; 2]> = match self.nodes.borrow().get(key) {
                Some(DomNode {
                    kind: Kind::Element { listeners, .. },
                    ..
                }) => listeners
                    .iter()
                    .filter(|(name, _)| &**name == kind)
                    .map(|(_, h)| h.clone())
                    .collect(),
                _ => continue,
            };
            for handler in handlers {
                handler.emit(event.clone());
                ran += 1;
            }
        }
        log::trace!("dispatched `{kind}` to {target:?}: {ran} handlers");
        ran
    }

    pub fn click(&self, target: HostNode) -> usize {
        self.dispatch(target, "click")
    }

    /// HTML-like rendering of `node`. Scalar properties become attributes.
    pub fn serialize(&self, node: HostNode) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        Self::write_node(&nodes, to_key(node), &mut out);
        out
    }

    fn write_node(nodes: &SlotMap<DomKey, DomNode>, key: DomKey, out: &mut String) {
        let Some(n) = nodes.get(key) else {
            return;
        };
        match &n.kind {
            Kind::Text(t) => escape(t, out),
            Kind::Element { tag, props, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in props {
                    let text = match value {
                        PropValue::Null => continue,
                        PropValue::Bool(false) => continue,
                        PropValue::Bool(true) => {
                            let _ = write!(out, " {name}");
                            continue;
                        }
                        other => match other.to_text() {
                            Some(text) => text,
                            None => continue,
                        },
                    };
                    let _ = write!(out, " {name}=\"");
                    escape(&text, out);
                    out.push('"');
                }
                out.push('>');
                for child in &n.children {
                    Self::write_node(nodes, *child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

impl HostDocument for Document {
    fn create_element(&self, tag: &str) -> HostNode {
        self.insert(Kind::Element {
            tag: tag.into(),
            props: BTreeMap::new(),
            listeners: SmallVec::new(),
        })
    }

    fn create_text(&self, text: &str) -> HostNode {
        self.insert(Kind::Text(text.to_string()))
    }

    fn append_child(&self, parent: HostNode, child: HostNode) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        let (parent, child) = (to_key(parent), to_key(child));
        self.detach(child);
        let mut nodes = self.nodes.borrow_mut();
        if let Some(p) = nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn replace_child(&self, parent: HostNode, new_child: HostNode, old_child: HostNode) {
        if !self.contains(parent) || !self.contains(new_child) {
            return;
        }
        let (parent, new_child, old_child) = (to_key(parent), to_key(new_child), to_key(old_child));
        self.detach(new_child);
        let mut nodes = self.nodes.borrow_mut();
        let Some(slot) = nodes
            .get_mut(parent)
            .and_then(|p| p.children.iter_mut().find(|c| **c == old_child))
        else {
            log::warn!("replace_child: {old_child:?} is not a child of {parent:?}");
            return;
        };
        *slot = new_child;
        if let Some(old) = nodes.get_mut(old_child) {
            old.parent = None;
        }
        if let Some(new) = nodes.get_mut(new_child) {
            new.parent = Some(parent);
        }
    }

    fn remove_child(&self, parent: HostNode, child: HostNode) {
        if self.parent(child) == Some(parent) {
            self.detach(to_key(child));
        } else {
            log::warn!("remove_child: {child:?} is not a child of {parent:?}");
        }
    }

    fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.nodes.borrow().get(to_key(node))?.parent.map(to_host)
    }

    fn add_listener(&self, node: HostNode, event: &str, handler: &EventHandler) {
        if let Some(DomNode {
            kind: Kind::Element { listeners, .. },
            ..
        }) = self.nodes.borrow_mut().get_mut(to_key(node))
        {
            listeners.push((event.into(), handler.clone()));
        }
    }

    fn remove_listener(&self, node: HostNode, event: &str, handler: &EventHandler) {
        if let Some(DomNode {
            kind: Kind::Element { listeners, .. },
            ..
        }) = self.nodes.borrow_mut().get_mut(to_key(node))
        {
            listeners.retain(|(name, h)| !(&**name == event && h.ptr_eq(handler)));
        }
    }

    fn property(&self, node: HostNode, key: &str) -> Option<PropValue> {
        match &self.nodes.borrow().get(to_key(node))?.kind {
            Kind::Element { props, .. } => props.get(key).cloned(),
            Kind::Text(_) => None,
        }
    }

    fn release(&self, node: HostNode) {
        let key = to_key(node);
        if node == self.body {
            log::warn!("release of the document body ignored");
            return;
        }
        self.detach(key);

        let mut nodes = self.nodes.borrow_mut();
        let mut stack = vec![key];
        let mut freed = 0;
        while let Some(key) = stack.pop() {
            if let Some(n) = nodes.remove(key) {
                stack.extend(n.children);
                freed += 1;
            }
        }
        log::trace!("released {node:?}: {freed} nodes freed");
    }

    fn set_property(&self, node: HostNode, key: &str, value: &PropValue) {
        if let Some(DomNode {
            kind: Kind::Element { props, .. },
            ..
        }) = self.nodes.borrow_mut().get_mut(to_key(node))
        {
            match value {
                PropValue::Null => {
                    props.remove(key);
                }
                value => {
                    props.insert(key.to_string(), value.clone());
                }
            }
        }
    }
}
