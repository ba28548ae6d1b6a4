//! Payment visibility: the order's open-payments count and the pre-filtered
//! payments list action.

use std::sync::Arc;

use creditline_core::TenantId;
use creditline_orders::SalesOrderId;
use creditline_policy::{OpenPaymentsRequest, ViewAction, open_payments_action};

use crate::event_store::EventStore;
use crate::workflow::{OpenPaymentsSource, WorkflowError, load_order};

/// Read-only payment visibility service.
pub struct PaymentVisibilityService<S> {
    store: S,
    payments: Arc<dyn OpenPaymentsSource>,
}

impl<S> PaymentVisibilityService<S>
where
    S: EventStore,
{
    pub fn new(store: S, payments: Arc<dyn OpenPaymentsSource>) -> Self {
        Self { store, payments }
    }

    /// Count of open payments under the order's commercial entity.
    ///
    /// A derived display value, recomputed on demand.
    pub fn payments_count(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
    ) -> Result<usize, WorkflowError> {
        let order = load_order(&self.store, tenant_id, order_id)?;
        let commercial = order
            .commercial_customer_id()
            .or_else(|| order.customer_id())
            .ok_or_else(|| WorkflowError::unknown("customer", "order has no customer"))?;
        Ok(self.payments.count_open(tenant_id, &commercial))
    }

    /// Build the pre-filtered, pre-populated payments list action.
    pub fn open_payments(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
    ) -> Result<ViewAction, WorkflowError> {
        let order = load_order(&self.store, tenant_id, order_id)?;
        let customer_id = order
            .customer_id()
            .ok_or_else(|| WorkflowError::unknown("customer", "order has no customer"))?;
        let commercial = order.commercial_customer_id().unwrap_or(customer_id);

        Ok(open_payments_action(&OpenPaymentsRequest {
            customer_id,
            commercial_customer_id: commercial,
            journal_id: order.payment_method_id(),
            amount_total: order.amount_total(),
            order_ids: vec![order_id],
        }))
    }
}
