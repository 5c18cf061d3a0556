mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventPublisher, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventPublishers};
