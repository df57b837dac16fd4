use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Cleanup returned by an effect.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }
}

/// Helper for effect bodies: `Some(Dispose)` around `f`.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> Option<Dispose> {
    Some(Dispose::new(f))
}

pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Dispose>>;

/// One effect slot of a component instance.
pub(crate) struct EffectRecord {
    /// Body to run at the end of the current render, present while dirty.
    effect: Option<EffectFn>,
    /// Dependencies of the last run; compared against on the next render.
    pub deps: Option<Box<dyn Any>>,
    staged_deps: Option<Box<dyn Any>>,
    /// `false` for effects without a dependency list, which are always dirty.
    pub has_deps: bool,
    pub cleanup: Option<Dispose>,
    pub dirty: bool,
}

impl EffectRecord {
    pub fn new(effect: EffectFn, deps: Option<Box<dyn Any>>) -> Self {
        Self {
            effect: Some(effect),
            has_deps: deps.is_some(),
            deps: None,
            staged_deps: deps,
            cleanup: None,
            dirty: true,
        }
    }

    /// Marks the slot to run `effect` after this render; the prior cleanup is kept until then.
    pub fn stage(&mut self, effect: EffectFn, deps: Option<Box<dyn Any>>) {
        self.effect = Some(effect);
        self.staged_deps = deps;
        self.dirty = true;
    }

    /// Takes the pending cleanup and body of a dirty slot, committing its dependencies.
    pub fn take_job(&mut self) -> Option<(Option<Dispose>, EffectFn)> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        self.deps = self.staged_deps.take();
        let effect = self.effect.take()?;
        Some((self.cleanup.take(), effect))
    }

    /// Drops whatever an aborted render staged.
    pub fn abandon(&mut self) {
        self.dirty = false;
        self.effect = None;
        self.staged_deps = None;
    }
}
