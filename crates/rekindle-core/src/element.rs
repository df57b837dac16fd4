//! Descriptors: the immutable description of a UI tree produced on every render.

use std::any::TypeId;
use std::cell::Cell;
use std::rc::Rc;

use crate::value::{CHILDREN, PropValue, Props};

thread_local! {
    static NEXT_COMPONENT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Identity used to decide whether an instance can be reused at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentId {
    /// The concrete function (or closure) type.
    Type(TypeId),
    /// Allocated at runtime for manufactured components.
    Unique(u64),
}

/// A rendering function bound to an identity.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    name: &'static str,
    render: Rc<dyn Fn(&Props) -> Node>,
}

impl Component {
    /// Identity is the type of `f`: every `Component::new(Counter)` is the same component.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Props) -> Node + 'static,
    {
        let full = std::any::type_name::<F>();
        let name = full.rsplit("::").find(|s| !s.starts_with('{')).unwrap_or(full);
        Self {
            id: ComponentId::Type(TypeId::of::<F>()),
            name,
            render: Rc::new(f),
        }
    }

    /// A component with a fresh identity that never matches any other.
    pub fn unique(name: &'static str, f: impl Fn(&Props) -> Node + 'static) -> Self {
        let id = NEXT_COMPONENT_ID.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        Self {
            id: ComponentId::Unique(id),
            name,
            render: Rc::new(f),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, props: &Props) -> Node {
        (self.render)(props)
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

/// Request for one host node.
#[derive(Debug)]
pub struct Element {
    pub tag: Rc<str>,
    pub props: Props,
    pub children: Vec<Node>,
}

/// Request for a stateful rendering unit. `props` carries `children`.
#[derive(Debug)]
pub struct ComponentElement {
    pub component: Component,
    pub props: Props,
}

/// Descriptor tree node.
#[derive(Clone)]
pub enum Node {
    Element(Rc<Element>),
    Component(Rc<ComponentElement>),
    Text(Rc<str>),
}

impl Node {
    pub fn text(s: impl Into<Rc<str>>) -> Self {
        Node::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Element(e) => f
                .debug_struct("Element")
                .field("tag", &e.tag)
                .field("children", &e.children)
                .finish(),
            Node::Component(c) => f
                .debug_struct("Component")
                .field("name", &c.component.name)
                .finish(),
            Node::Text(t) => write!(f, "{t:?}"),
        }
    }
}

macro_rules! text_node_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Node {
                fn from(v: $t) -> Self {
                    Node::Text(v.to_string().into())
                }
            }
        )*
    };
}

text_node_from!(&str, String, i32, i64, u32, u64, usize, f64, bool);

impl From<Rc<str>> for Node {
    fn from(s: Rc<str>) -> Self {
        Node::Text(s)
    }
}

/// Factory input for one child position.
#[derive(Clone, Debug)]
pub enum Child {
    Node(Node),
    /// Flattened into the parent's children.
    List(Vec<Node>),
    /// Normalized to the empty text node.
    Empty,
}

impl From<Node> for Child {
    fn from(n: Node) -> Self {
        Child::Node(n)
    }
}

impl From<Vec<Node>> for Child {
    fn from(list: Vec<Node>) -> Self {
        Child::List(list)
    }
}

impl From<Option<Node>> for Child {
    fn from(n: Option<Node>) -> Self {
        n.map_or(Child::Empty, Child::Node)
    }
}

macro_rules! child_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Child {
                fn from(v: $t) -> Self {
                    Child::Node(v.into())
                }
            }

            impl From<Option<$t>> for Child {
                fn from(v: Option<$t>) -> Self {
                    v.map_or(Child::Empty, |v| Child::Node(v.into()))
                }
            }
        )*
    };
}

child_from!(&str, String, Rc<str>, i32, i64, u32, u64, usize, f64, bool);

/// Either an intrinsic tag name or a component.
#[derive(Clone, Debug)]
pub enum Tag {
    Intrinsic(Rc<str>),
    Component(Component),
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::Intrinsic(s.into())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag::Intrinsic(s.into())
    }
}

impl From<Component> for Tag {
    fn from(c: Component) -> Self {
        Tag::Component(c)
    }
}

impl From<&Component> for Tag {
    fn from(c: &Component) -> Self {
        Tag::Component(c.clone())
    }
}

/// Builds a descriptor. Children are flattened one level and absent entries become `""`.
pub fn create_element(
    tag: impl Into<Tag>,
    props: Option<Props>,
    children: impl IntoIterator<Item = Child>,
) -> Node {
    let mut props = props.unwrap_or_default();
    let mut flat = Vec::new();
    for child in children {
        match child {
            Child::Node(n) => flat.push(n),
            Child::List(list) => flat.extend(list),
            Child::Empty => flat.push(Node::Text("".into())),
        }
    }

    match tag.into() {
        Tag::Intrinsic(tag) => Node::Element(Rc::new(Element {
            tag,
            props,
            children: flat,
        })),
        Tag::Component(component) => {
            props.insert(CHILDREN, PropValue::Children(flat.into()));
            Node::Component(Rc::new(ComponentElement { component, props }))
        }
    }
}

/// Variadic form of [`create_element`]: `h!(tag, props, child...)`.
///
/// ```rust,ignore
/// let view = h!("div", None, h!("p", None, "Count: 0"), h!(Component::new(Button), Some(props)));
/// ```
#[macro_export]
macro_rules! h {
    ($tag:expr) => {
        $crate::create_element($tag, None, <::std::vec::Vec<$crate::Child>>::new())
    };
    ($tag:expr, $props:expr $(, $child:expr)* $(,)?) => {
        $crate::create_element(
            $tag,
            $props,
            <::std::vec::Vec<$crate::Child>>::from([$($crate::Child::from($child)),*]),
        )
    };
}
