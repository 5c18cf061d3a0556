//! Wiring between the engine's lifecycle hooks and the notification
//! collaborator.
//!
//! E-mail delivery itself lives outside this system. The engine emits
//! `{order_code, client_name, client_email, event}` payloads; this module
//! subscribes to them and hands them off. The default handler logs the
//! payload so operators can verify emission end-to-end. Delivery failures
//! can never block or roll back a transition — by the time a hook fires, the
//! status change has already committed.
use log::*;
use voltio_engine::events::EventHooks;

pub fn notification_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_submitted(|ev| {
        Box::pin(async move {
            let n = &ev.notification;
            info!(
                "📧️ notify[{}]: order {} for {} <{}>",
                n.event,
                n.order_code,
                n.client_name,
                n.client_email.as_deref().unwrap_or("-")
            );
        })
    });
    hooks.on_order_status_changed(|ev| {
        Box::pin(async move {
            let n = &ev.notification;
            info!(
                "📧️ notify[{}]: order {} ({} -> {}) for {} <{}>",
                n.event,
                n.order_code,
                ev.previous,
                ev.order.status,
                n.client_name,
                n.client_email.as_deref().unwrap_or("-")
            );
        })
    });
    hooks
}
