use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use crate::error::{HookViolation, RenderError};
use crate::host::{HostDocument, HostNode};
use crate::instance::Instance;
use crate::reconcile::{Mounted, NodeKey};

thread_local! {
    static RENDER_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Limits applied by a runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of component renders nested inside each other.
    pub max_render_depth: usize,
    /// Maximum number of tasks one [`Runtime::run_until_idle`] call executes.
    pub max_flush_tasks: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_render_depth: 256,
            max_flush_tasks: 10_000,
        }
    }
}

impl RuntimeConfig {
    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = depth;
        self
    }

    pub fn with_max_flush_tasks(mut self, tasks: usize) -> Self {
        self.max_flush_tasks = tasks;
        self
    }
}

type Task = Box<dyn FnOnce()>;

pub(crate) struct RuntimeInner {
    pub(crate) document: Rc<dyn HostDocument>,
    pub(crate) tree: RefCell<SlotMap<NodeKey, Mounted>>,
    tasks: RefCell<VecDeque<Task>>,
    depth: Cell<usize>,
    pub(crate) config: RuntimeConfig,
}

/// Owner of one rendered tree: the node arena, the host document and the task queue.
#[derive(Clone)]
pub struct Runtime(pub(crate) Rc<RuntimeInner>);

#[derive(Clone)]
pub(crate) struct WeakRuntime(Weak<RuntimeInner>);

impl WeakRuntime {
    pub(crate) fn upgrade(&self) -> Option<Runtime> {
        self.0.upgrade().map(Runtime)
    }

    pub(crate) fn ptr_eq(&self, other: &WeakRuntime) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

enum RefreshPlan {
    Now,
    Defer,
    AlreadyQueued,
}

impl Runtime {
    pub(crate) fn new(document: Rc<dyn HostDocument>, config: RuntimeConfig) -> Self {
        Self(Rc::new(RuntimeInner {
            document,
            tree: RefCell::new(SlotMap::with_key()),
            tasks: RefCell::new(VecDeque::new()),
            depth: Cell::new(0),
            config,
        }))
    }

    pub fn document(&self) -> &Rc<dyn HostDocument> {
        &self.0.document
    }

    pub fn config(&self) -> RuntimeConfig {
        self.0.config
    }

    pub(crate) fn downgrade(&self) -> WeakRuntime {
        WeakRuntime(Rc::downgrade(&self.0))
    }

    /// Queues `task` for the next [`Runtime::run_until_idle`].
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.0.tasks.borrow_mut().push_back(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.0.tasks.borrow().len()
    }

    /// Runs queued tasks, including ones queued while draining. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let limit = self.0.config.max_flush_tasks;
        let mut ran = 0;
        while ran < limit {
            let task = self.0.tasks.borrow_mut().pop_front();
            let Some(task) = task else {
                return ran;
            };
            task();
            ran += 1;
        }
        if self.pending_tasks() > 0 {
            log::warn!(
                "task queue not idle after {limit} tasks; {} still pending",
                self.pending_tasks()
            );
        }
        ran
    }

    /// Number of live entries in the rendered-tree arena.
    pub fn node_count(&self) -> usize {
        self.0.tree.borrow().len()
    }

    pub(crate) fn with_instance<R>(&self, key: NodeKey, f: impl FnOnce(&Instance) -> R) -> Option<R> {
        match self.0.tree.borrow().get(key) {
            Some(Mounted::Component(inst)) => Some(f(inst)),
            _ => None,
        }
    }

    pub(crate) fn with_instance_mut<R>(
        &self,
        key: NodeKey,
        f: impl FnOnce(&mut Instance) -> R,
    ) -> Option<R> {
        match self.0.tree.borrow_mut().get_mut(key) {
            Some(Mounted::Component(inst)) => Some(f(inst)),
            _ => None,
        }
    }

    /// Re-renders the instance at `key` if it is still mounted and attached to a parent.
    ///
    /// A refresh requested while the instance is itself rendering (for example from
    /// one of its effects) is deferred to the task queue instead of recursing.
    pub fn refresh(&self, key: NodeKey) {
        let plan = self.with_instance_mut(key, |inst| {
            if !inst.rendering {
                RefreshPlan::Now
            } else if inst.refresh_pending {
                RefreshPlan::AlreadyQueued
            } else {
                inst.refresh_pending = true;
                RefreshPlan::Defer
            }
        });

        match plan {
            None => log::trace!("refresh of disposed instance {key:?} ignored"),
            Some(RefreshPlan::AlreadyQueued) => {}
            Some(RefreshPlan::Defer) => {
                log::debug!("instance {key:?} refreshed during its own render; deferring");
                let weak = self.downgrade();
                self.schedule(move || {
                    if let Some(rt) = weak.upgrade() {
                        rt.with_instance_mut(key, |inst| inst.refresh_pending = false);
                        rt.refresh(key);
                    }
                });
            }
            Some(RefreshPlan::Now) => {
                let attached = self
                    .host_node(key)
                    .and_then(|node| self.0.document.parent(node))
                    .is_some();
                if !attached {
                    log::trace!("instance {key:?} is detached; refresh ignored");
                    return;
                }
                log::trace!("refreshing instance {key:?}");
                if let Err(e) = self.render_instance(key) {
                    log::error!("re-render failed: {e}");
                }
            }
        }
    }
}

struct Frame {
    runtime: WeakRuntime,
    key: NodeKey,
}

/// Counts one level of nested rendering until dropped.
pub(crate) struct DepthGuard {
    runtime: Runtime,
}

impl DepthGuard {
    pub(crate) fn enter(runtime: &Runtime) -> Result<Self, RenderError> {
        let depth = runtime.0.depth.get();
        if depth >= runtime.0.config.max_render_depth {
            return Err(RenderError::RecursionLimit { depth });
        }
        runtime.0.depth.set(depth + 1);
        Ok(Self {
            runtime: runtime.clone(),
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let depth = self.runtime.0.depth.get();
        self.runtime.0.depth.set(depth.saturating_sub(1));
    }
}

/// Marks `key` as the currently rendering instance until dropped.
pub(crate) struct RenderGuard;

impl RenderGuard {
    pub(crate) fn enter(runtime: &Runtime, key: NodeKey) -> Self {
        RENDER_STACK.with(|st| {
            st.borrow_mut().push(Frame {
                runtime: runtime.downgrade(),
                key,
            })
        });
        Self
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        RENDER_STACK.with(|st| {
            st.borrow_mut().pop();
        });
    }
}

/// The instance whose component function is executing, if any.
pub(crate) fn current() -> Option<(Runtime, NodeKey)> {
    RENDER_STACK.with(|st| {
        let st = st.borrow();
        let frame = st.last()?;
        Some((frame.runtime.upgrade()?, frame.key))
    })
}

/// Runs `f` against the currently rendering instance.
///
/// # Panics
///
/// Panics when no component is rendering: hooks only make sense inside a render.
pub(crate) fn with_current<R>(hook: &'static str, f: impl FnOnce(&Runtime, NodeKey) -> R) -> R {
    match current() {
        Some((rt, key)) => f(&rt, key),
        None => panic!("{}", HookViolation::OutsideRender { hook }),
    }
}

/// Aborts the current render with `err` once the component function returns.
pub(crate) fn fail_current(err: RenderError) {
    if let Some((rt, key)) = current() {
        rt.with_instance_mut(key, |inst| inst.fail(err));
    }
}
