use thiserror::Error;

/// Which hook family a slot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
    Memo,
    Callback,
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookKind::State => "state",
            HookKind::Effect => "effect",
            HookKind::Memo => "memo",
            HookKind::Callback => "callback",
        };
        f.write_str(name)
    }
}

/// Misuse of the positional hook protocol.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HookViolation {
    #[error("`{hook}` called while no component is rendering")]
    OutsideRender { hook: &'static str },

    #[error("{hook} slot {index} was read with a different type than it was created with")]
    SlotType { hook: HookKind, index: usize },

    #[error("{hook} hooks called {found} times, previous render called them {expected} times")]
    SlotCount {
        hook: HookKind,
        expected: usize,
        found: usize,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("hook misuse in `{component}`: {violation}")]
    HookContext {
        component: &'static str,
        violation: HookViolation,
    },

    /// A component produced something other than exactly one node.
    #[error("`{component}` rendered {count} children; a component renders a single node")]
    UnsupportedChild { component: &'static str, count: usize },

    #[error("render nesting exceeded {depth} levels")]
    RecursionLimit { depth: usize },
}
