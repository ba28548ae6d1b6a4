//! Mirror of the external reconciliation subsystem's payment records.
//!
//! Payments are read-only inputs here: the reconciliation subsystem owns
//! them, we upsert its reported state and serve the order-facing queries
//! (open-payments count/list, counterpart lookup for settlement).

use creditline_billing::{Payment, PaymentId};
use creditline_core::TenantId;
use creditline_customers::CustomerId;

use crate::read_model::TenantStore;
use crate::workflow::{OpenPaymentsSource, PaymentRecordSource};

/// Tenant-isolated payment mirror.
#[derive(Debug)]
pub struct PaymentsLedger<S>
where
    S: TenantStore<PaymentId, Payment>,
{
    store: S,
}

impl<S> PaymentsLedger<S>
where
    S: TenantStore<PaymentId, Payment>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record the latest reported state of a payment.
    pub fn record(&self, tenant_id: TenantId, payment: Payment) {
        self.store.upsert(tenant_id, payment.id, payment);
    }

    pub fn get(&self, tenant_id: TenantId, payment_id: &PaymentId) -> Option<Payment> {
        self.store.get(tenant_id, payment_id)
    }

    /// Open payments under a commercial entity: draft/posted, unreconciled.
    pub fn list_open(&self, tenant_id: TenantId, commercial_customer_id: &CustomerId) -> Vec<Payment> {
        self.store
            .list(tenant_id)
            .into_iter()
            .filter(|p| p.is_open() && p.commercial_customer_id == *commercial_customer_id)
            .collect()
    }

    pub fn count_open(&self, tenant_id: TenantId, commercial_customer_id: &CustomerId) -> usize {
        self.list_open(tenant_id, commercial_customer_id).len()
    }
}

impl<S> OpenPaymentsSource for PaymentsLedger<S>
where
    S: TenantStore<PaymentId, Payment>,
{
    fn count_open(&self, tenant_id: TenantId, commercial_customer_id: &CustomerId) -> usize {
        PaymentsLedger::count_open(self, tenant_id, commercial_customer_id)
    }

    fn list_open(&self, tenant_id: TenantId, commercial_customer_id: &CustomerId) -> Vec<Payment> {
        PaymentsLedger::list_open(self, tenant_id, commercial_customer_id)
    }
}

impl<S> PaymentRecordSource for PaymentsLedger<S>
where
    S: TenantStore<PaymentId, Payment>,
{
    fn payment(&self, tenant_id: TenantId, id: &PaymentId) -> Option<Payment> {
        self.get(tenant_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use creditline_billing::{PaymentMethodCode, PaymentMethodId, PaymentState};
    use creditline_core::AggregateId;
    use std::sync::Arc;

    use crate::read_model::InMemoryTenantStore;

    fn payment(commercial: CustomerId, state: PaymentState, is_reconciled: bool) -> Payment {
        Payment {
            id: PaymentId::new(AggregateId::new()),
            customer_id: CustomerId::new(AggregateId::new()),
            commercial_customer_id: commercial,
            method_id: PaymentMethodId::new(AggregateId::new()),
            method_code: PaymentMethodCode::Manual,
            amount: 5_000,
            currency: "USD".to_string(),
            state,
            is_reconciled,
            is_matched: false,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn counts_only_open_payments_of_the_commercial_entity() {
        let ledger = PaymentsLedger::new(Arc::new(InMemoryTenantStore::new()));
        let tenant_id = TenantId::new();
        let commercial = CustomerId::new(AggregateId::new());
        let other = CustomerId::new(AggregateId::new());

        ledger.record(tenant_id, payment(commercial, PaymentState::Draft, false));
        ledger.record(tenant_id, payment(commercial, PaymentState::Posted, false));
        // Fully reconciled: no longer open.
        ledger.record(tenant_id, payment(commercial, PaymentState::Posted, true));
        // Cancelled: never open.
        ledger.record(tenant_id, payment(commercial, PaymentState::Cancelled, false));
        // Different commercial entity.
        ledger.record(tenant_id, payment(other, PaymentState::Posted, false));

        assert_eq!(ledger.count_open(tenant_id, &commercial), 2);
        assert_eq!(ledger.count_open(tenant_id, &other), 1);
    }

    #[test]
    fn records_are_tenant_isolated() {
        let ledger = PaymentsLedger::new(Arc::new(InMemoryTenantStore::new()));
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let commercial = CustomerId::new(AggregateId::new());

        ledger.record(tenant_a, payment(commercial, PaymentState::Posted, false));

        assert_eq!(ledger.count_open(tenant_a, &commercial), 1);
        assert_eq!(ledger.count_open(tenant_b, &commercial), 0);
    }

    #[test]
    fn upsert_replaces_reported_state() {
        let ledger = PaymentsLedger::new(Arc::new(InMemoryTenantStore::new()));
        let tenant_id = TenantId::new();
        let commercial = CustomerId::new(AggregateId::new());

        let mut p = payment(commercial, PaymentState::Posted, false);
        ledger.record(tenant_id, p.clone());
        assert_eq!(ledger.count_open(tenant_id, &commercial), 1);

        p.is_reconciled = true;
        ledger.record(tenant_id, p);
        assert_eq!(ledger.count_open(tenant_id, &commercial), 0);
    }
}
