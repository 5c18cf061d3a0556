use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler, EventPublisher, Handler, OrderStatusChangedEvent, OrderSubmittedEvent,
};

#[derive(Default, Clone)]
pub struct EventPublishers {
    pub order_submitted: Vec<EventPublisher<OrderSubmittedEvent>>,
    pub order_status_changed: Vec<EventPublisher<OrderStatusChangedEvent>>,
}

pub struct EventHandlers {
    pub on_order_submitted: Option<EventHandler<OrderSubmittedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_submitted = hooks.on_order_submitted.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed =
            hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_submitted, on_order_status_changed }
    }

    pub fn publishers(&self) -> EventPublishers {
        let mut result = EventPublishers::default();
        if let Some(handler) = &self.on_order_submitted {
            result.order_submitted.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_submitted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_submitted: Option<Handler<OrderSubmittedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_order_submitted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSubmittedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static
    {
        self.on_order_submitted = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static
    {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }
}
