//! Component instances and their render cycle.

use std::any::Any;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::effects::EffectRecord;
use crate::element::{Component, ComponentElement};
use crate::error::{HookKind, HookViolation, RenderError};
use crate::reconcile::NodeKey;
use crate::runtime::{DepthGuard, RenderGuard, Runtime};
use crate::value::PropValue;

/// Per-family hook positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Cursors {
    pub state: usize,
    pub effect: usize,
    pub memo: usize,
    pub callback: usize,
}

impl Cursors {
    fn get_mut(&mut self, kind: HookKind) -> &mut usize {
        match kind {
            HookKind::State => &mut self.state,
            HookKind::Effect => &mut self.effect,
            HookKind::Memo => &mut self.memo,
            HookKind::Callback => &mut self.callback,
        }
    }

    fn mismatch(&self, expected: &Cursors) -> Option<HookViolation> {
        [
            (HookKind::State, expected.state, self.state),
            (HookKind::Effect, expected.effect, self.effect),
            (HookKind::Memo, expected.memo, self.memo),
            (HookKind::Callback, expected.callback, self.callback),
        ]
        .into_iter()
        .find(|(_, expected, found)| expected != found)
        .map(|(hook, expected, found)| HookViolation::SlotCount {
            hook,
            expected,
            found,
        })
    }
}

/// Cached value of a memo or callback slot with the dependencies it was computed from.
pub(crate) struct CachedSlot {
    pub value: Box<dyn Any>,
    pub deps: Box<dyn Any>,
}

/// A stateful rendering unit bound to one position of the tree.
pub(crate) struct Instance {
    pub component: Component,
    /// Last descriptor rendered; its props are what the component sees.
    pub descriptor: Rc<ComponentElement>,
    pub states: Vec<Box<dyn Any>>,
    pub effects: Vec<EffectRecord>,
    pub memos: Vec<CachedSlot>,
    pub callbacks: Vec<CachedSlot>,
    /// Descriptors handed out by `memo` wrappers, by `key` prop.
    pub memo_cache: SmallVec<[(PropValue, Rc<ComponentElement>); 2]>,
    pub child: Option<NodeKey>,
    disposers: Vec<Box<dyn FnOnce()>>,
    cursors: Cursors,
    baseline: Cursors,
    pub rendered: bool,
    pub rendering: bool,
    pub refresh_pending: bool,
    failure: Option<RenderError>,
}

impl Instance {
    pub fn new(descriptor: Rc<ComponentElement>) -> Self {
        Self {
            component: descriptor.component.clone(),
            descriptor,
            states: Vec::new(),
            effects: Vec::new(),
            memos: Vec::new(),
            callbacks: Vec::new(),
            memo_cache: SmallVec::new(),
            child: None,
            disposers: Vec::new(),
            cursors: Cursors::default(),
            baseline: Cursors::default(),
            rendered: false,
            rendering: false,
            refresh_pending: false,
            failure: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.component.name()
    }

    /// Claims the next slot index of `kind` for the running render.
    pub fn claim(&mut self, kind: HookKind) -> usize {
        let cursor = self.cursors.get_mut(kind);
        let index = *cursor;
        *cursor += 1;
        index
    }

    /// Records the first failure of the running render.
    pub fn fail(&mut self, err: RenderError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    pub fn violation(&mut self, violation: HookViolation) {
        log::error!("`{}`: {violation}", self.name());
        self.fail(RenderError::HookContext {
            component: self.name(),
            violation,
        });
    }

    pub fn add_disposer(&mut self, f: impl FnOnce() + 'static) {
        self.disposers.push(Box::new(f));
    }

    fn counts(&self) -> Cursors {
        Cursors {
            state: self.states.len(),
            effect: self.effects.len(),
            memo: self.memos.len(),
            callback: self.callbacks.len(),
        }
    }

    fn begin_render(&mut self) {
        self.baseline = self.counts();
        self.cursors = Cursors::default();
        self.rendering = true;
        self.failure = None;
    }

    /// Validates hook usage after the component function returned.
    fn finish_hooks(&mut self) -> Result<Option<NodeKey>, RenderError> {
        if self.failure.is_none()
            && self.rendered
            && let Some(violation) = self.cursors.mismatch(&self.baseline)
        {
            self.violation(violation);
        }
        match self.failure.take() {
            Some(err) => {
                self.rollback();
                self.rendering = false;
                Err(err)
            }
            None => Ok(self.child),
        }
    }

    fn rollback(&mut self) {
        let base = self.baseline;
        self.states.truncate(base.state);
        self.effects.truncate(base.effect);
        self.memos.truncate(base.memo);
        self.callbacks.truncate(base.callback);
        self.abandon_effects();
    }

    /// Drops the effects staged by a render that will not be committed.
    fn abandon_effects(&mut self) {
        for record in &mut self.effects {
            record.abandon();
        }
    }

    /// Unmount: pending effect cleanups in slot order, then disposers.
    pub fn teardown(self) {
        for record in self.effects {
            if let Some(cleanup) = record.cleanup {
                cleanup.run();
            }
        }
        for disposer in self.disposers {
            disposer();
        }
    }
}

impl Runtime {
    /// Runs the component function at `key` and reconciles its output against the previous child.
    ///
    /// Hook cursors restart at zero, the instance becomes the current render target for
    /// the duration of the call, and dirty effects run once the child tree is in place.
    pub(crate) fn render_instance(&self, key: NodeKey) -> Result<(), RenderError> {
        let _depth = DepthGuard::enter(self)?;
        let Some((component, descriptor)) = self.with_instance_mut(key, |inst| {
            inst.begin_render();
            (inst.component.clone(), inst.descriptor.clone())
        }) else {
            return Ok(());
        };

        let output = {
            let _frame = RenderGuard::enter(self, key);
            component.call(&descriptor.props)
        };

        let previous = match self.with_instance_mut(key, Instance::finish_hooks) {
            None => return Ok(()),
            Some(result) => result?,
        };

        let result = match previous {
            Some(old) => self.reconcile(old, output),
            None => self.materialize(output),
        };
        let child = match result {
            Ok(child) => child,
            Err(e) => {
                self.with_instance_mut(key, |inst| {
                    inst.abandon_effects();
                    inst.rendering = false;
                });
                return Err(e);
            }
        };

        let committed = self.with_instance_mut(key, |inst| {
            inst.child = Some(child);
            inst.rendered = true;
        });
        if committed.is_none() {
            // Disposed while its subtree was rendering.
            self.dispose(child);
            return Ok(());
        }

        self.run_effects(key);
        self.with_instance_mut(key, |inst| inst.rendering = false);
        Ok(())
    }

    fn run_effects(&self, key: NodeKey) {
        let count = self.with_instance(key, |inst| inst.effects.len()).unwrap_or(0);
        for index in 0..count {
            let job = self
                .with_instance_mut(key, |inst| {
                    inst.effects.get_mut(index).and_then(EffectRecord::take_job)
                })
                .flatten();
            let Some((cleanup, effect)) = job else {
                continue;
            };

            if let Some(cleanup) = cleanup {
                cleanup.run();
            }
            let mut next = effect();
            self.with_instance_mut(key, |inst| {
                if let Some(record) = inst.effects.get_mut(index) {
                    record.cleanup = next.take();
                }
            });
            if let Some(orphan) = next {
                // The instance went away while the effect ran.
                orphan.run();
            }
        }
    }
}
