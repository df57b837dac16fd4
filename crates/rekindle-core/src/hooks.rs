//! Positional hooks.
//!
//! Every hook claims the next slot of its family on the currently rendering
//! instance. The Nth `use_state` call of a render always reads state slot N, so a
//! component must call its hooks in the same order and number on every render.
//! A slot read back with a different type, or a render that calls a different
//! number of hooks than the previous one, aborts that render with
//! [`RenderError::HookContext`](crate::RenderError::HookContext).
//!
//! Calling any hook outside a component render panics.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::effects::{Dispose, EffectRecord};
use crate::error::{HookKind, HookViolation};
use crate::instance::CachedSlot;
use crate::reconcile::NodeKey;
use crate::runtime::{WeakRuntime, with_current};
use crate::value::Callback;

/// Updates one state slot and re-renders its owner.
pub struct Setter<T> {
    runtime: WeakRuntime,
    key: NodeKey,
    index: usize,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            key: self.key,
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Setter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.index == other.index && self.runtime.ptr_eq(&other.runtime)
    }
}

impl<T> std::fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setter")
            .field("key", &self.key)
            .field("index", &self.index)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Stores `f(previous)`; a value equal to the stored one is ignored.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let Some(rt) = self.runtime.upgrade() else {
            return;
        };
        let current = rt
            .with_instance(self.key, |inst| {
                inst.states
                    .get(self.index)
                    .and_then(|slot| slot.downcast_ref::<T>())
                    .cloned()
            })
            .flatten();
        let Some(current) = current else {
            log::trace!("setter for disposed state slot {} ignored", self.index);
            return;
        };

        let next = f(&current);
        if next == current {
            return;
        }
        rt.with_instance_mut(self.key, |inst| {
            if let Some(slot) = inst.states.get_mut(self.index)
                && let Some(value) = slot.downcast_mut::<T>()
            {
                *value = next;
            }
        });
        rt.refresh(self.key);
    }
}

enum Claim<T> {
    Existing(T),
    Fresh(usize),
    Broken,
}

/// Claims the next state slot, initializing it with `init` on first use.
///
/// Returns the value, a setter for the slot and whether the slot was created now.
pub(crate) fn state_slot<T: Clone + 'static>(
    hook: &'static str,
    init: impl FnOnce() -> T,
) -> (T, Setter<T>, bool) {
    with_current(hook, |rt, key| {
        let mut index = 0;
        let claim = rt
            .with_instance_mut(key, |inst| {
                index = inst.claim(HookKind::State);
                let existing = inst
                    .states
                    .get(index)
                    .map(|slot| slot.downcast_ref::<T>().cloned());
                match existing {
                    None => Claim::Fresh(index),
                    Some(Some(value)) => Claim::Existing(value),
                    Some(None) => {
                        inst.violation(HookViolation::SlotType {
                            hook: HookKind::State,
                            index,
                        });
                        Claim::Broken
                    }
                }
            })
            .unwrap_or(Claim::Broken);

        let setter = Setter {
            runtime: rt.downgrade(),
            key,
            index,
            _marker: PhantomData,
        };
        match claim {
            Claim::Existing(value) => (value, setter, false),
            Claim::Fresh(index) => {
                let value = init();
                rt.with_instance_mut(key, |inst| {
                    if inst.states.len() == index {
                        inst.states.push(Box::new(value.clone()));
                    }
                });
                (value, setter, true)
            }
            Claim::Broken => (init(), setter, false),
        }
    })
}

/// Local state: the current value and a setter that re-renders on change.
///
/// `init` runs on the first render only.
pub fn use_state<T: Clone + PartialEq + 'static>(init: impl FnOnce() -> T) -> (T, Setter<T>) {
    let (value, setter, _) = state_slot("use_state", init);
    (value, setter)
}

/// A stable mutable box. Writing through it never re-renders.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    let (cell, _, _) = state_slot("use_ref", || Rc::new(RefCell::new(init())));
    cell
}

fn effect_slot<D: PartialEq + 'static>(
    hook: &'static str,
    deps: Option<D>,
    effect: Box<dyn FnOnce() -> Option<Dispose>>,
) {
    with_current(hook, |rt, key| {
        rt.with_instance_mut(key, |inst| {
            let index = inst.claim(HookKind::Effect);
            let Some(record) = inst.effects.get_mut(index) else {
                let deps = deps.map(|d| Box::new(d) as Box<dyn std::any::Any>);
                inst.effects.push(EffectRecord::new(effect, deps));
                return;
            };

            if record.has_deps != deps.is_some() {
                inst.violation(HookViolation::SlotType {
                    hook: HookKind::Effect,
                    index,
                });
                return;
            }
            let dirty = match (&deps, &record.deps) {
                (Some(next), Some(prev)) => match prev.downcast_ref::<D>() {
                    Some(prev) => prev != next,
                    None => {
                        inst.violation(HookViolation::SlotType {
                            hook: HookKind::Effect,
                            index,
                        });
                        return;
                    }
                },
                _ => true,
            };
            if dirty {
                let deps = deps.map(|d| Box::new(d) as Box<dyn std::any::Any>);
                record.stage(effect, deps);
            }
        });
    })
}

/// Runs `f` after every render of the component.
pub fn use_effect<F>(f: F)
where
    F: FnOnce() -> Option<Dispose> + 'static,
{
    effect_slot::<()>("use_effect", None, Box::new(f));
}

/// Runs `f` after a render whose `deps` differ from the previous render's.
///
/// The first render always runs it. The cleanup returned by the previous run is
/// invoked right before the next run, and when the component is unmounted.
pub fn use_effect_with<D, F>(deps: D, f: F)
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Dispose> + 'static,
{
    effect_slot("use_effect_with", Some(deps), Box::new(f));
}

enum Cached<V> {
    Hit(V),
    Miss(usize),
    Broken,
}

fn cached_slot<V: Clone + 'static, D: PartialEq + 'static>(
    hook: &'static str,
    kind: HookKind,
    deps: D,
    make: impl FnOnce() -> V,
) -> V {
    with_current(hook, |rt, key| {
        let lookup = rt
            .with_instance_mut(key, |inst| {
                let index = inst.claim(kind);
                let slots = match kind {
                    HookKind::Callback => &inst.callbacks,
                    _ => &inst.memos,
                };
                let Some(slot) = slots.get(index) else {
                    return Cached::Miss(index);
                };
                match (slot.deps.downcast_ref::<D>(), slot.value.downcast_ref::<V>()) {
                    (Some(prev), Some(value)) if *prev == deps => Cached::Hit(value.clone()),
                    (Some(_), Some(_)) => Cached::Miss(index),
                    _ => {
                        inst.violation(HookViolation::SlotType { hook: kind, index });
                        Cached::Broken
                    }
                }
            })
            .unwrap_or(Cached::Broken);

        match lookup {
            Cached::Hit(value) => value,
            Cached::Broken => make(),
            Cached::Miss(index) => {
                let value = make();
                let slot = CachedSlot {
                    value: Box::new(value.clone()),
                    deps: Box::new(deps),
                };
                rt.with_instance_mut(key, |inst| {
                    let slots = match kind {
                        HookKind::Callback => &mut inst.callbacks,
                        _ => &mut inst.memos,
                    };
                    if index < slots.len() {
                        slots[index] = slot;
                    } else if index == slots.len() {
                        slots.push(slot);
                    }
                });
                value
            }
        }
    })
}

/// Computes `f()` once per distinct `deps` and returns the cached value otherwise.
pub fn use_memo<T: 'static, D: PartialEq + 'static>(deps: D, f: impl FnOnce() -> T) -> Rc<T> {
    cached_slot("use_memo", HookKind::Memo, deps, || Rc::new(f()))
}

/// Returns the same callback while `deps` stay equal, so listeners keep their identity.
pub fn use_callback<IN, OUT, D, F>(deps: D, f: F) -> Callback<IN, OUT>
where
    IN: 'static,
    OUT: 'static,
    D: PartialEq + 'static,
    F: Fn(IN) -> OUT + 'static,
{
    cached_slot("use_callback", HookKind::Callback, deps, move || {
        Callback::new(f)
    })
}

/// Registers `f` to run when the current instance is unmounted.
pub(crate) fn on_unmount(hook: &'static str, f: impl FnOnce() + 'static) {
    with_current(hook, |rt, key| {
        let mut f = Some(f);
        rt.with_instance_mut(key, |inst| {
            if let Some(f) = f.take() {
                inst.add_disposer(f);
            }
        });
        if let Some(f) = f {
            f();
        }
    })
}
