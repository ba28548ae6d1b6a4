//! Paid-in-full check over the order's invoice directory and the mirrored
//! payment records.

use std::sync::Arc;

use creditline_billing::{Payment, PaymentId};
use creditline_core::TenantId;
use creditline_invoicing::{PaymentLookup, is_order_fully_paid};
use creditline_orders::SalesOrderId;

use crate::event_store::EventStore;
use crate::workflow::{OrderInvoicesSource, WorkflowError, load_order};

/// Resolves counterpart payments for settlement, independent of storage shape.
pub trait PaymentRecordSource: Send + Sync {
    fn payment(&self, tenant_id: TenantId, id: &PaymentId) -> Option<Payment>;
}

/// Paid-in-full service consulted before releasing held deliveries.
pub struct SettlementService<S> {
    store: S,
    invoices: Arc<dyn OrderInvoicesSource>,
    payments: Arc<dyn PaymentRecordSource>,
}

impl<S> SettlementService<S>
where
    S: EventStore,
{
    pub fn new(
        store: S,
        invoices: Arc<dyn OrderInvoicesSource>,
        payments: Arc<dyn PaymentRecordSource>,
    ) -> Self {
        Self {
            store,
            invoices,
            payments,
        }
    }

    /// Whether the order's invoices are effectively paid: regular-invoice
    /// payments cover the total, or down-payment invoices cover the untaxed
    /// total.
    pub fn is_order_fully_paid(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
    ) -> Result<bool, WorkflowError> {
        let order = load_order(&self.store, tenant_id, order_id)?;
        let records = self.invoices.invoices_for_order(tenant_id, order_id);

        let lookup = TenantScopedLookup {
            tenant_id,
            source: self.payments.as_ref(),
        };

        Ok(is_order_fully_paid(
            order.amount_total(),
            order.amount_untaxed(),
            &records,
            &lookup,
        ))
    }
}

struct TenantScopedLookup<'a> {
    tenant_id: TenantId,
    source: &'a dyn PaymentRecordSource,
}

impl PaymentLookup for TenantScopedLookup<'_> {
    fn payment(&self, id: &PaymentId) -> Option<Payment> {
        self.source.payment(self.tenant_id, id)
    }
}
