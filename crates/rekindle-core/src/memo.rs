use std::rc::Rc;

use crate::element::{Component, ComponentElement, Node};
use crate::runtime::with_current;
use crate::value::Props;

/// Wraps `inner` so that renders with the same `key` prop reuse one descriptor.
///
/// While the cached descriptor is handed back, the inner instance skips
/// re-rendering and keeps the props it was first given under that key. Without a
/// `key` nothing is cached and `inner` renders normally every time.
pub fn memo(inner: Component) -> Component {
    let name = inner.name();
    Component::unique(name, move |props: &Props| {
        let Some(key) = props.get("key").cloned() else {
            return Node::Component(Rc::new(ComponentElement {
                component: inner.clone(),
                props: props.clone(),
            }));
        };

        with_current("memo", |rt, current| {
            let cached = rt
                .with_instance(current, |inst| {
                    inst.memo_cache
                        .iter()
                        .find(|(cached, _)| cached.same(&key))
                        .map(|(_, element)| element.clone())
                })
                .flatten();
            let element = cached.unwrap_or_else(|| {
                let element = Rc::new(ComponentElement {
                    component: inner.clone(),
                    props: props.clone(),
                });
                rt.with_instance_mut(current, |inst| {
                    inst.memo_cache.push((key, element.clone()));
                });
                element
            });
            Node::Component(element)
        })
    })
}
