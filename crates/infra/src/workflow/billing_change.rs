//! Billing-change handler: the reactive trigger behind the order's
//! customer/payment-term selection.
//!
//! Every selection change flows through here so the order-level delivery
//! hold is always re-derived; nothing else writes that flag.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use creditline_billing::{PaymentMethodId, PaymentTermId};
use creditline_core::TenantId;
use creditline_customers::CustomerId;
use creditline_events::{EventBus, EventEnvelope};
use creditline_orders::{
    SalesOrder, SalesOrderCommand, SalesOrderId, SetBillingProfile,
    resolve_delivery_hold_from_records,
};

use crate::command_dispatcher::CommandDispatcher;
use crate::event_store::EventStore;
use crate::workflow::{PaymentTermSource, WorkflowError, load_customer};

/// The selection coming from the order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingSelection {
    pub customer_id: CustomerId,
    pub payment_term_id: Option<PaymentTermId>,
    pub payment_method_id: Option<PaymentMethodId>,
}

/// Handler dispatching the derived billing profile onto the order.
pub struct BillingChangeHandler<S, B> {
    dispatcher: CommandDispatcher<S, B>,
    terms: Arc<dyn PaymentTermSource>,
}

impl<S, B> BillingChangeHandler<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: CommandDispatcher<S, B>, terms: Arc<dyn PaymentTermSource>) -> Self {
        Self { dispatcher, terms }
    }

    /// Apply a customer/payment-term/method change to an order, re-deriving
    /// the delivery hold. Returns the derived hold value.
    pub fn apply_billing_change(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        selection: BillingSelection,
    ) -> Result<bool, WorkflowError> {
        let direct = load_customer(self.dispatcher.store(), tenant_id, selection.customer_id)?;
        let commercial_id = direct.commercial_entity_id();
        let commercial = if commercial_id == selection.customer_id {
            direct.clone()
        } else {
            load_customer(self.dispatcher.store(), tenant_id, commercial_id)?
        };

        let term = selection
            .payment_term_id
            .and_then(|id| self.terms.term(tenant_id, id));

        let delivery_hold = resolve_delivery_hold_from_records(term.as_ref(), &direct, &commercial);

        tracing::debug!(%order_id, delivery_hold, "billing change re-derived delivery hold");

        self.dispatcher.dispatch::<SalesOrder>(
            tenant_id,
            order_id.0,
            "orders.order",
            SalesOrderCommand::SetBillingProfile(SetBillingProfile {
                tenant_id,
                order_id,
                customer_id: selection.customer_id,
                commercial_customer_id: commercial_id,
                payment_term_id: selection.payment_term_id,
                payment_method_id: selection.payment_method_id,
                delivery_hold,
                occurred_at: Utc::now(),
            }),
            |_, id| SalesOrder::empty(SalesOrderId::new(id)),
        )?;

        Ok(delivery_hold)
    }
}
