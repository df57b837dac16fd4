//! Context: a shared value pushed to distant consumers without prop passing.
//!
//! ```rust,ignore
//! thread_local! {
//!     static THEME: Context<&'static str> = create_context("dark");
//! }
//!
//! fn Label(_: &Props) -> Node {
//!     let theme = THEME.with(|t| t.use_context());
//!     h!("span", None, theme)
//! }
//!
//! fn App(_: &Props) -> Node {
//!     THEME.with(|t| t.provide("light", [h!(Component::new(Label), None)]))
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::element::{Child, Component, Node, create_element};
use crate::error::RenderError;
use crate::hooks::{Setter, on_unmount, state_slot};
use crate::runtime::fail_current;
use crate::value::{PropValue, Props};

struct Subscriber<T> {
    id: u64,
    setter: Setter<T>,
}

struct ContextCell<T> {
    value: RefCell<T>,
    subscribers: RefCell<SmallVec<[Subscriber<T>; 4]>>,
    next_id: Cell<u64>,
}

impl<T: Clone + PartialEq + 'static> ContextCell<T> {
    /// Stores `value` and pushes it to every subscriber through its state setter.
    fn publish(&self, value: T) {
        *self.value.borrow_mut() = value.clone();
        let setters: Vec<Setter<T>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|s| s.setter.clone())
            .collect();
        for setter in setters {
            setter.set(value.clone());
        }
    }

    fn subscribe(&self, setter: Setter<T>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push(Subscriber { id, setter });
        id
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers.borrow_mut().retain(|s| s.id != id);
    }
}

/// A context definition: one shared cell plus its provider component.
pub struct Context<T: 'static> {
    cell: Rc<ContextCell<T>>,
    provider: Component,
}

impl<T: 'static> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            provider: self.provider.clone(),
        }
    }
}

/// Creates a context cell holding `default` until a provider publishes a value.
pub fn create_context<T: Clone + PartialEq + 'static>(default: T) -> Context<T> {
    let cell = Rc::new(ContextCell {
        value: RefCell::new(default),
        subscribers: RefCell::new(SmallVec::new()),
        next_id: Cell::new(0),
    });

    let provider = {
        let cell = cell.clone();
        Component::unique("Provider", move |props: &Props| {
            if let Some(value) = props.get("value").and_then(PropValue::downcast::<T>) {
                cell.publish((*value).clone());
            }
            match props.children() {
                [] => Node::text(""),
                [only] => only.clone(),
                many => {
                    fail_current(RenderError::UnsupportedChild {
                        component: "Provider",
                        count: many.len(),
                    });
                    Node::text("")
                }
            }
        })
    };

    Context { cell, provider }
}

impl<T: Clone + PartialEq + 'static> Context<T> {
    /// The provider component. Its `value` prop must be a [`PropValue::any`] of `T`.
    pub fn provider(&self) -> &Component {
        &self.provider
    }

    /// Provider descriptor publishing `value` to consumers and rendering `children`.
    pub fn provide(&self, value: T, children: impl IntoIterator<Item = impl Into<Child>>) -> Node {
        create_element(
            &self.provider,
            Some(Props::new().with("value", PropValue::any(value))),
            children.into_iter().map(Into::into),
        )
    }

    /// The cell's value, read directly.
    pub fn current(&self) -> T {
        self.cell.value.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.subscribers.borrow().len()
    }

    /// Hook: the context value as seen by the rendering instance.
    ///
    /// The first call per instance copies the cell into a local state slot and
    /// subscribes that slot's setter; later providers push new values through it.
    /// The subscription ends when the instance is unmounted.
    pub fn use_context(&self) -> T {
        let initial = self.current();
        let (value, setter, fresh) = state_slot("use_context", move || initial);
        if fresh {
            let id = self.cell.subscribe(setter);
            let cell = Rc::downgrade(&self.cell);
            on_unmount("use_context", move || {
                if let Some(cell) = cell.upgrade() {
                    cell.unsubscribe(id);
                }
            });
        }
        value
    }
}
