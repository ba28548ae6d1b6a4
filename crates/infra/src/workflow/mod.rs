//! Order credit/delivery workflows.
//!
//! These services compose the command dispatcher with read models to
//! implement the behavior the host UI triggers: order confirmation with
//! credit enforcement, the change-triggered pre-check, billing-change hold
//! derivation, payment visibility, and the paid-in-full check.
//!
//! Cross-record reads go through the narrow source traits below; read models
//! and projections implement them. This keeps the services decoupled from
//! storage shape (and testable against fixtures).

pub mod billing_change;
pub mod confirmation;
pub mod payments;
pub mod settlement;

use thiserror::Error;

use creditline_billing::{Payment, PaymentMethod, PaymentMethodId, PaymentTerm, PaymentTermId};
use creditline_core::TenantId;
use creditline_customers::CustomerId;
use creditline_orders::SalesOrderId;

use crate::command_dispatcher::DispatchError;
use crate::event_store::EventStoreError;
use crate::projections::InvoiceRecord;

pub use billing_change::{BillingChangeHandler, BillingSelection};
pub use confirmation::{ConfirmationOutcome, ConfirmationService};
pub use payments::PaymentVisibilityService;
pub use settlement::{PaymentRecordSource, SettlementService};

/// Workflow-level failure.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("dispatch failed: {0:?}")]
    Dispatch(DispatchError),

    #[error("event store error: {0}")]
    Store(#[from] EventStoreError),

    #[error("unknown {kind}: {id}")]
    UnknownRecord { kind: &'static str, id: String },
}

impl From<DispatchError> for WorkflowError {
    fn from(value: DispatchError) -> Self {
        WorkflowError::Dispatch(value)
    }
}

impl WorkflowError {
    pub(crate) fn unknown(kind: &'static str, id: impl ToString) -> Self {
        WorkflowError::UnknownRecord {
            kind,
            id: id.to_string(),
        }
    }
}

/// Supplies `total_credit_used` for a commercial customer.
pub trait CreditUsageSource: Send + Sync {
    fn total_credit_used(&self, tenant_id: TenantId, customer_id: &CustomerId) -> u64;
}

/// Resolves payment terms selected on orders.
pub trait PaymentTermSource: Send + Sync {
    fn term(&self, tenant_id: TenantId, id: PaymentTermId) -> Option<PaymentTerm>;
}

/// Resolves payment methods selected on orders.
pub trait PaymentMethodSource: Send + Sync {
    fn method(&self, tenant_id: TenantId, id: PaymentMethodId) -> Option<PaymentMethod>;
}

/// Serves the open payments of a commercial entity.
pub trait OpenPaymentsSource: Send + Sync {
    fn count_open(&self, tenant_id: TenantId, commercial_customer_id: &CustomerId) -> usize;
    fn list_open(&self, tenant_id: TenantId, commercial_customer_id: &CustomerId) -> Vec<Payment>;
}

/// Serves the invoices issued from an order.
pub trait OrderInvoicesSource: Send + Sync {
    fn invoices_for_order(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Vec<InvoiceRecord>;
}

pub(crate) fn load_order<S: crate::event_store::EventStore>(
    store: &S,
    tenant_id: TenantId,
    order_id: SalesOrderId,
) -> Result<creditline_orders::SalesOrder, WorkflowError> {
    use creditline_core::AggregateRoot;

    let order = crate::command_dispatcher::load_aggregate(store, tenant_id, order_id.0, |_, id| {
        creditline_orders::SalesOrder::empty(SalesOrderId::new(id))
    })?;
    if order.version() == 0 {
        return Err(WorkflowError::unknown("order", order_id));
    }
    Ok(order)
}

pub(crate) fn load_customer<S: crate::event_store::EventStore>(
    store: &S,
    tenant_id: TenantId,
    customer_id: CustomerId,
) -> Result<creditline_customers::Customer, WorkflowError> {
    use creditline_core::AggregateRoot;

    let customer =
        crate::command_dispatcher::load_aggregate(store, tenant_id, customer_id.0, |_, id| {
            creditline_customers::Customer::empty(CustomerId::new(id))
        })?;
    if customer.version() == 0 {
        return Err(WorkflowError::unknown("customer", customer_id));
    }
    Ok(customer)
}
