//! Event system for membership actions.
//!
//! Events are fired from every mutating action. If no listeners are
//! registered, they are silently ignored.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use orgauth::register_event_listeners;
//! use orgauth::events::listeners::LoggingListener;
//!
//! fn main() {
//!     register_event_listeners(|registry| {
//!         registry.listen(LoggingListener::new());
//!     });
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::MembershipEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
