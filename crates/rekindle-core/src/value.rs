use std::any::Any;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::element::Node;
use crate::host::HostNode;

/// Shared function handle compared by identity.
pub struct Callback<IN, OUT = ()>(Rc<dyn Fn(IN) -> OUT>);

impl<IN, OUT> Callback<IN, OUT> {
    pub fn new(f: impl Fn(IN) -> OUT + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn emit(&self, input: IN) -> OUT {
        (self.0)(input)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<IN, OUT> Clone for Callback<IN, OUT> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<IN, OUT> PartialEq for Callback<IN, OUT> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<IN, OUT> std::fmt::Debug for Callback<IN, OUT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

impl<IN, OUT, F: Fn(IN) -> OUT + 'static> From<F> for Callback<IN, OUT> {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Event delivered to a listener by the host document.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Lower-cased event name, e.g. `click`.
    pub kind: Rc<str>,
    pub target: HostNode,
}

pub type EventHandler = Callback<Event>;

/// Box that receives the host node of the element it is attached to via the `ref` prop.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<Cell<Option<HostNode>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<HostNode> {
        self.0.get()
    }

    pub(crate) fn set(&self, node: Option<HostNode>) {
        self.0.set(node);
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeRef").field(&self.0.get()).finish()
    }
}

/// A single property value.
#[derive(Clone, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Handler(EventHandler),
    Ref(NodeRef),
    Children(Rc<[Node]>),
    Any(Rc<dyn Any>),
}

impl PropValue {
    pub fn any<T: 'static>(value: T) -> Self {
        PropValue::Any(Rc::new(value))
    }

    /// Identity comparison: scalars by value, shared values by pointer.
    pub fn same(&self, other: &PropValue) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a.ptr_eq(b),
            (PropValue::Ref(a), PropValue::Ref(b)) => a == b,
            (PropValue::Children(a), PropValue::Children(b)) => Rc::ptr_eq(a, b),
            (PropValue::Any(a), PropValue::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            PropValue::Any(v) => v.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Text form of scalar values; `None` for handlers, refs, children and opaque values.
    pub fn to_text(&self) -> Option<String> {
        match self {
            PropValue::Null => Some(String::new()),
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Int(v) => Some(v.to_string()),
            PropValue::Float(v) => Some(v.to_string()),
            PropValue::Str(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::Null => write!(f, "Null"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(s) => write!(f, "{s:?}"),
            PropValue::Handler(h) => write!(f, "{h:?}"),
            PropValue::Ref(r) => write!(f, "{r:?}"),
            PropValue::Children(c) => f.debug_list().entries(c.iter()).finish(),
            PropValue::Any(_) => write!(f, "<any>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.into())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s.into())
    }
}

impl From<Rc<str>> for PropValue {
    fn from(s: Rc<str>) -> Self {
        PropValue::Str(s)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(v.into())
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<EventHandler> for PropValue {
    fn from(h: EventHandler) -> Self {
        PropValue::Handler(h)
    }
}

impl From<NodeRef> for PropValue {
    fn from(r: NodeRef) -> Self {
        PropValue::Ref(r)
    }
}

impl From<Vec<Node>> for PropValue {
    fn from(children: Vec<Node>) -> Self {
        PropValue::Children(children.into())
    }
}

/// Key under which component children are passed.
pub const CHILDREN: &str = "children";

/// Returns the lower-cased event name when `key` follows the `onEvent` convention.
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_lowercase())
}

/// Ordered property map of a descriptor.
#[derive(Clone, Debug, Default)]
pub struct Props {
    entries: BTreeMap<Rc<str>, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a listener under the `onEvent` key for `event`.
    pub fn on(self, event: &str, f: impl Fn(Event) + 'static) -> Self {
        self.listen(event, Callback::new(f))
    }

    /// Like [`Props::on`] for an existing handler, keeping its identity.
    pub fn listen(mut self, event: &str, handler: EventHandler) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
            None => "on".to_string(),
        };
        self.insert(&key, PropValue::Handler(handler));
        self
    }

    pub fn reference(self, node_ref: &NodeRef) -> Self {
        self.with("ref", node_ref.clone())
    }

    pub fn key(self, key: impl Into<PropValue>) -> Self {
        self.with("key", key)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<PropValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PropValue::as_int)
    }

    pub fn handler(&self, key: &str) -> Option<&EventHandler> {
        self.get(key).and_then(PropValue::as_handler)
    }

    /// Children passed to a component; empty for intrinsic props.
    pub fn children(&self) -> &[Node] {
        match self.get(CHILDREN) {
            Some(PropValue::Children(children)) => children,
            _ => &[],
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| &**k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
