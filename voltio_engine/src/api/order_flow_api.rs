use std::fmt::Debug;

use log::*;

use crate::{
    api::{
        errors::OrderFlowError,
        order_objects::{OrderQueryFilter, OrderResult},
    },
    db_types::{
        Order, OrderId, OrderStatus, OrderWithItems, QuoteContact, QuoteLine, Role, UserId, UserInfo,
    },
    events::{
        EventPublishers, NotificationEvent, NotificationPayload, OrderStatusChangedEvent,
        OrderSubmittedEvent,
    },
    lifecycle::{authorize, next_status, Denial, LifecycleAction},
    traits::StorefrontDatabase,
};

/// `OrderFlowApi` is the one gateway for every order status change in the
/// system. Handlers never write status fields themselves; they ask this API
/// to apply a [`LifecycleAction`], which
///
/// 1. reads the order,
/// 2. checks the actor against the authorization rules,
/// 3. looks the transition up in the state table, and
/// 4. performs a single compare-and-swap write of the new status.
///
/// Two concurrent transitions on the same order therefore cannot both
/// succeed: the loser's CAS finds an unexpected status and gets a
/// [`OrderFlowError::Conflict`]. Re-issuing an already-applied action is a
/// no-op-with-error, never a duplicate side effect.
pub struct OrderFlowApi<B> {
    db: B,
    publishers: EventPublishers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, publishers: EventPublishers) -> Self {
        Self { db, publishers }
    }
}

impl<B> OrderFlowApi<B>
where B: StorefrontDatabase
{
    /// Submits the client's draft order (`DRAFT → SUBMITTED`).
    ///
    /// Runs the whole submission pipeline atomically in the backend: totals
    /// are computed from the item snapshots and frozen onto the order, the
    /// sequential order code is allocated, and product stock is decremented.
    /// Afterwards the submitted-order hook fires so the notification
    /// collaborator can tell the client and the sales staff.
    pub async fn submit_order(&self, actor: &UserInfo) -> Result<OrderWithItems, OrderFlowError> {
        if actor.role != Role::Client {
            return Err(OrderFlowError::Unauthorized(Denial::ClientsOnly));
        }
        let submitted = self.db.submit_draft(actor).await?;
        debug!("🔄️📦️ Order {} submitted by client #{}", submitted.order.id, actor.id);
        let notification = NotificationPayload {
            order_code: order_code(&submitted.order),
            client_name: actor.name.clone(),
            client_email: Some(actor.email.clone()),
            event: NotificationEvent::Submitted,
        };
        self.publish_submitted(&submitted.order, notification).await;
        Ok(submitted)
    }

    /// Stores a guest quote request: a `QUOTE` order that enters the pipeline
    /// directly in `SUBMITTED` status, with contact details instead of a
    /// client account and no prices on its items.
    pub async fn submit_quote(
        &self,
        contact: &QuoteContact,
        lines: &[QuoteLine],
    ) -> Result<OrderWithItems, OrderFlowError> {
        if lines.is_empty() {
            return Err(OrderFlowError::Validation("a quote request needs at least one item".into()));
        }
        if contact.email.trim().is_empty() {
            return Err(OrderFlowError::Validation("a contact e-mail address is required".into()));
        }
        let quote = self.db.insert_quote(contact, lines).await?;
        debug!("🔄️📦️ Quote {} received from {}", order_code(&quote.order), contact.email);
        let notification = NotificationPayload {
            order_code: order_code(&quote.order),
            client_name: contact.name.clone(),
            client_email: Some(contact.email.clone()),
            event: NotificationEvent::Submitted,
        };
        self.publish_submitted(&quote.order, notification).await;
        Ok(quote)
    }

    pub async fn confirm_order(&self, actor: &UserInfo, id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply_transition(actor, id, LifecycleAction::Confirm).await
    }

    pub async fn reject_order(&self, actor: &UserInfo, id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply_transition(actor, id, LifecycleAction::Reject).await
    }

    pub async fn cancel_order(&self, actor: &UserInfo, id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply_transition(actor, id, LifecycleAction::Cancel).await
    }

    pub async fn fulfill_order(&self, actor: &UserInfo, id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply_transition(actor, id, LifecycleAction::Fulfill).await
    }

    pub async fn ship_order(&self, actor: &UserInfo, id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply_transition(actor, id, LifecycleAction::Ship).await
    }

    pub async fn deliver_order(&self, actor: &UserInfo, id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply_transition(actor, id, LifecycleAction::Deliver).await
    }

    /// Assigns a seller to an approved order (`APPROVED → ASSIGNED`).
    pub async fn assign_order(
        &self,
        actor: &UserInfo,
        id: OrderId,
        seller_id: UserId,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        authorize(actor, &order, LifecycleAction::Assign).map_err(OrderFlowError::Unauthorized)?;
        next_status(order.status, LifecycleAction::Assign).ok_or(
            OrderFlowError::TransitionForbidden { action: LifecycleAction::Assign, from: order.status },
        )?;
        let seller = self
            .db
            .fetch_user(seller_id)
            .await?
            .filter(|u| u.role == Role::Seller)
            .ok_or_else(|| OrderFlowError::Validation(format!("user {seller_id} is not a seller")))?;
        let updated = self.db.assign_order(id, order.status, seller.id).await?;
        info!("🔄️📦️ Order {id} assigned to seller #{seller_id} by {} #{}", actor.role, actor.id);
        Ok(updated)
    }

    /// The generic transition path used by confirm/reject/cancel and the
    /// fulfilment chain.
    async fn apply_transition(
        &self,
        actor: &UserInfo,
        id: OrderId,
        action: LifecycleAction,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        authorize(actor, &order, action).map_err(OrderFlowError::Unauthorized)?;
        let to = next_status(order.status, action)
            .ok_or(OrderFlowError::TransitionForbidden { action, from: order.status })?;
        let previous = order.status;
        let updated = self.db.transition_order(id, previous, to).await?;
        info!("🔄️📦️ Order {id}: {previous} -> {to} ({action} by {} #{})", actor.role, actor.id);
        if let Some(event) = notification_event(action) {
            self.publish_status_change(&updated, previous, event).await;
        }
        Ok(updated)
    }

    /// Fetches one order with items, applying the visibility rules: admins
    /// see everything, sellers their assigned orders, clients their own.
    pub async fn order_for(
        &self,
        actor: &UserInfo,
        id: OrderId,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let result =
            self.db.fetch_order_with_items(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        let visible = match actor.role {
            Role::Admin => true,
            Role::Seller => result.order.seller_id == Some(actor.id),
            Role::Client => result.order.client_id == Some(actor.id),
        };
        if visible {
            Ok(result)
        } else {
            Err(OrderFlowError::Unauthorized(match actor.role {
                Role::Seller => Denial::NotAssignedSeller,
                _ => Denial::NotOrderOwner,
            }))
        }
    }

    /// Searches orders, narrowing the filter to what the actor may see.
    pub async fn search(
        &self,
        actor: &UserInfo,
        mut filter: OrderQueryFilter,
    ) -> Result<OrderResult, OrderFlowError> {
        match actor.role {
            Role::Admin => {},
            Role::Seller => filter.seller_id = Some(actor.id),
            Role::Client => filter.client_id = Some(actor.id),
        }
        let orders = self.db.search_orders(filter).await?;
        Ok(OrderResult { total_orders: orders.len(), orders })
    }

    async fn publish_submitted(&self, order: &Order, notification: NotificationPayload) {
        for publisher in &self.publishers.order_submitted {
            trace!("🔄️📦️ Notifying order-submitted hook subscribers");
            let event =
                OrderSubmittedEvent { order: order.clone(), notification: notification.clone() };
            publisher.publish_event(event).await;
        }
    }

    async fn publish_status_change(
        &self,
        order: &Order,
        previous: OrderStatus,
        event: NotificationEvent,
    ) {
        let (client_name, client_email) = self.client_contact(order).await;
        let notification = NotificationPayload {
            order_code: order_code(order),
            client_name,
            client_email,
            event,
        };
        for publisher in &self.publishers.order_status_changed {
            trace!("🔄️📦️ Notifying status-change hook subscribers");
            let event = OrderStatusChangedEvent {
                order: order.clone(),
                previous,
                notification: notification.clone(),
            };
            publisher.publish_event(event).await;
        }
    }

    /// Resolves who to address the notification to: the client account when
    /// there is one, the guest contact details otherwise.
    async fn client_contact(&self, order: &Order) -> (String, Option<String>) {
        if let Some(client_id) = order.client_id {
            match self.db.fetch_user(client_id).await {
                Ok(Some(user)) => return (user.name, Some(user.email)),
                Ok(None) => warn!("🔄️📦️ Order {} references missing client #{client_id}", order.id),
                Err(e) => warn!("🔄️📦️ Could not resolve client for order {}: {e}", order.id),
            }
        }
        (order.contact_name.clone().unwrap_or_else(|| "Cliente".to_string()), order.contact_email.clone())
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

fn order_code(order: &Order) -> String {
    order.code.as_ref().map(|c| c.to_string()).unwrap_or_else(|| order.id.to_string())
}

/// Which actions the notification collaborator hears about. Fulfilment steps
/// are internal and stay quiet.
fn notification_event(action: LifecycleAction) -> Option<NotificationEvent> {
    match action {
        LifecycleAction::Confirm => Some(NotificationEvent::Approved),
        LifecycleAction::Reject => Some(NotificationEvent::Rejected),
        LifecycleAction::Cancel => Some(NotificationEvent::Canceled),
        _ => None,
    }
}
