pub use crate::context::{Context, create_context};
pub use crate::effects::{Dispose, on_cleanup};
pub use crate::element::{Child, Component, Node, create_element};
pub use crate::error::{HookViolation, RenderError};
pub use crate::h;
pub use crate::hooks::{
    Setter, use_callback, use_effect, use_effect_with, use_memo, use_ref, use_state,
};
pub use crate::host::{HostDocument, HostNode};
pub use crate::memo::memo;
pub use crate::mount::{Root, mount, mount_with};
pub use crate::reducer::{Store, use_reducer};
pub use crate::runtime::RuntimeConfig;
pub use crate::value::{Callback, Event, EventHandler, NodeRef, PropValue, Props};
