use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::hooks::{Setter, state_slot, use_state};
use crate::runtime::{WeakRuntime, with_current};

type Reducer<S, A> = Rc<dyn Fn(&mut S, A)>;

struct Shared<S, A> {
    state: RefCell<S>,
    reducer: RefCell<Reducer<S, A>>,
}

impl<S, A> Shared<S, A> {
    fn reduce(&self, action: A) {
        let reducer = self.reducer.borrow().clone();
        reducer(&mut *self.state.borrow_mut(), action);
    }
}

/// Mutable state object driven by a reducer that edits it in place.
///
/// `dispatch` and `refresh_async` run on the runtime's task queue, after the
/// current event handler or render has returned.
pub struct Store<S: 'static, A: 'static> {
    shared: Rc<Shared<S, A>>,
    toggle: Setter<bool>,
    runtime: WeakRuntime,
}

impl<S: 'static, A: 'static> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            toggle: self.toggle.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: 'static, A: 'static> Store<S, A> {
    pub fn state(&self) -> Ref<'_, S> {
        self.shared.state.borrow()
    }

    /// Edits the state without re-rendering.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        f(&mut *self.shared.state.borrow_mut());
    }

    /// Re-renders the owning component now.
    pub fn refresh(&self) {
        self.toggle.update(|flag| !flag);
    }

    /// Re-renders the owning component on the next task-queue turn.
    pub fn refresh_async(&self) {
        let toggle = self.toggle.clone();
        self.schedule(move || toggle.update(|flag| !flag));
    }

    /// Applies `action` on the next task-queue turn, then re-renders.
    pub fn dispatch(&self, action: A) {
        let shared = self.shared.clone();
        let toggle = self.toggle.clone();
        self.schedule(move || {
            shared.reduce(action);
            toggle.update(|flag| !flag);
        });
    }

    /// Applies `action` on the next task-queue turn without re-rendering.
    pub fn dispatch_silent(&self, action: A) {
        let shared = self.shared.clone();
        self.schedule(move || shared.reduce(action));
    }

    fn schedule(&self, task: impl FnOnce() + 'static) {
        match self.runtime.upgrade() {
            Some(rt) => rt.schedule(task),
            None => log::trace!("store outlived its runtime; task dropped"),
        }
    }
}

/// Reducer-style state. The latest `reducer` passed in is the one dispatch uses.
pub fn use_reducer<S, A>(reducer: impl Fn(&mut S, A) + 'static, init: impl FnOnce() -> S) -> Store<S, A>
where
    S: 'static,
    A: 'static,
{
    let reducer: Reducer<S, A> = Rc::new(reducer);
    let (shared, _, _) = state_slot("use_reducer", {
        let reducer = reducer.clone();
        move || {
            Rc::new(Shared {
                state: RefCell::new(init()),
                reducer: RefCell::new(reducer),
            })
        }
    });
    *shared.reducer.borrow_mut() = reducer;

    let (_, toggle) = use_state(|| false);
    let runtime = with_current("use_reducer", |rt, _| rt.downgrade());
    Store {
        shared,
        toggle,
        runtime,
    }
}
