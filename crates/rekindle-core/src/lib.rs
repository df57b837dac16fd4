//! # Descriptors, Instances and Hooks
//!
//! Rekindle renders a tree of immutable descriptors into a host document and
//! keeps it up to date by diffing each new descriptor tree against the previous
//! one. There are four main pieces:
//!
//! - [`Node`]: a descriptor: an intrinsic element, a component, or text.
//! - Component instances: long-lived, positional holders of hook state.
//! - Hooks (`use_state`, `use_effect_with`, `use_memo`, ...): slot storage read
//!   by the rendering instance.
//! - [`HostDocument`]: the narrow interface through which host nodes are built.
//!
//! ## Components
//!
//! A component is a function of its props returning one node:
//!
//! ```rust,ignore
//! use rekindle_core::*;
//!
//! fn Counter(_: &Props) -> Node {
//!     let (count, set_count) = use_state(|| 0);
//!
//!     h!("div", None,
//!         h!("p", None, format!("Count: {count}")),
//!         h!("button", Some(Props::new().on("click", {
//!             let set_count = set_count.clone();
//!             move |_| set_count.update(|c| c + 1)
//!         })), "+"),
//!     )
//! }
//!
//! let root = mount(document, container, h!(Component::new(Counter), None))?;
//! ```
//!
//! - Hooks are order-based: the Nth `use_state` call of a render always refers to
//!   the Nth stored value. Call them unconditionally.
//! - A setter re-renders its component synchronously; nothing is batched.
//! - A component keeps its instance (and state) while the descriptor at its
//!   position has the same component identity.
//!
//! ## Effects and cleanup
//!
//! ```rust,ignore
//! use_effect_with(user_id, move || {
//!     log::info!("watching {user_id}");
//!     on_cleanup(move || log::info!("stop watching {user_id}"))
//! });
//! ```
//!
//! Effects run after the render that scheduled them, in slot order. A cleanup
//! runs before the next run of the same slot and when the component unmounts.
//!
//! ## Deferred work
//!
//! `Store::dispatch`, `Store::refresh_async`, and refreshes requested by a
//! component while it is rendering itself go to the runtime's task queue. Drain
//! it with [`Root::run_until_idle`] from the host's event loop.

pub mod context;
pub mod effects;
pub mod element;
pub mod error;
pub mod hooks;
pub mod host;
mod instance;
pub mod memo;
pub mod mount;
pub mod prelude;
pub mod reconcile;
pub mod reducer;
pub mod runtime;
pub mod value;

pub use context::*;
pub use effects::*;
pub use element::*;
pub use error::*;
pub use hooks::*;
pub use host::*;
pub use memo::*;
pub use mount::*;
pub use reconcile::NodeKey;
pub use reducer::*;
pub use runtime::{Runtime, RuntimeConfig};
pub use value::*;
