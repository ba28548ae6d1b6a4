//! Credit Exposure Projection.
//!
//! Tracks the outstanding receivable balance per commercial customer, derived
//! from invoice events. The `outstanding_balance` of this read model is the
//! `total_credit_used` figure the credit policy evaluator consumes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;
use thiserror::Error;

use creditline_core::{AggregateId, TenantId};
use creditline_customers::CustomerId;
use creditline_events::EventEnvelope;
use creditline_invoicing::{InvoiceEvent, InvoiceStatus};

use crate::projections::cursor_store::{InMemoryCursorStore, ProjectionCursorStore};
use crate::read_model::TenantStore;
use crate::workflow::CreditUsageSource;

/// Read model: per-customer credit exposure for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerCreditExposure {
    pub customer_id: CustomerId,
    pub total_invoiced: u64,
    pub total_paid: u64,
    /// Invoiced minus allocated payments; this is `total_credit_used`.
    pub outstanding_balance: u64,
    pub open_invoice_count: u32,
}

impl CustomerCreditExposure {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            total_invoiced: 0,
            total_paid: 0,
            outstanding_balance: 0,
            open_invoice_count: 0,
        }
    }
}

/// Tenant+aggregate cursor for idempotent projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum CreditExposureProjectionError {
    #[error("failed to deserialize invoice event: {0}")]
    Deserialize(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Per-invoice snapshot needed to allocate payments and reverse voids.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InvoiceSnapshot {
    customer_id: CustomerId,
    total_amount: u64,
    total_paid: u64,
    status: InvoiceStatus,
}

/// Credit exposure projection: aggregates outstanding balances per customer.
///
/// Rebuildable from invoice events. Tenant-isolated.
#[derive(Debug)]
pub struct CreditExposureProjection<S, C = InMemoryCursorStore>
where
    S: TenantStore<CustomerId, CustomerCreditExposure>,
{
    store: S,
    invoice_index: RwLock<HashMap<(TenantId, AggregateId), InvoiceSnapshot>>,
    cursors: RwLock<HashMap<CursorKey, u64>>,
    cursor_store: Option<Arc<C>>,
    projection_name: String,
}

impl<S> CreditExposureProjection<S>
where
    S: TenantStore<CustomerId, CustomerCreditExposure>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            invoice_index: RwLock::new(HashMap::new()),
            cursors: RwLock::new(HashMap::new()),
            cursor_store: None,
            projection_name: "customers.credit_exposure".to_string(),
        }
    }

    pub fn with_persistent_cursors<C: ProjectionCursorStore + 'static>(
        self,
        cursor_store: Arc<C>,
        projection_name: impl Into<String>,
    ) -> CreditExposureProjection<S, C> {
        CreditExposureProjection {
            store: self.store,
            invoice_index: self.invoice_index,
            cursors: RwLock::new(HashMap::new()),
            cursor_store: Some(cursor_store),
            projection_name: projection_name.into(),
        }
    }
}

impl<S, C> CreditExposureProjection<S, C>
where
    S: TenantStore<CustomerId, CustomerCreditExposure>,
    C: ProjectionCursorStore + 'static,
{
    fn get_cursor(&self, tenant_id: TenantId, aggregate_id: AggregateId) -> u64 {
        if let Some(ref cursor_store) = self.cursor_store {
            cursor_store
                .get_cursor(tenant_id, aggregate_id, &self.projection_name)
                .unwrap_or(0)
        } else {
            match self.cursors.read() {
                Ok(cursors) => *cursors
                    .get(&CursorKey { tenant_id, aggregate_id })
                    .unwrap_or(&0),
                Err(_) => 0,
            }
        }
    }

    fn update_cursor(&self, tenant_id: TenantId, aggregate_id: AggregateId, sequence_number: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(CursorKey { tenant_id, aggregate_id }, sequence_number);
        }

        if let Some(ref cursor_store) = self.cursor_store {
            cursor_store.update_cursor(
                tenant_id,
                aggregate_id,
                &self.projection_name,
                sequence_number,
            );
        }
    }

    fn clear_cursors(&self, tenant_id: TenantId) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|k, _| k.tenant_id != tenant_id);
        }

        if let Some(ref cursor_store) = self.cursor_store {
            cursor_store.clear_cursors(tenant_id, &self.projection_name);
        }
    }

    /// Get exposure for a specific customer.
    pub fn get(&self, tenant_id: TenantId, customer_id: &CustomerId) -> Option<CustomerCreditExposure> {
        self.store.get(tenant_id, customer_id)
    }

    /// List all customer exposures for a tenant.
    pub fn list(&self, tenant_id: TenantId) -> Vec<CustomerCreditExposure> {
        self.store.list(tenant_id)
    }

    /// List customers with a non-zero outstanding balance.
    pub fn list_with_outstanding(&self, tenant_id: TenantId) -> Vec<CustomerCreditExposure> {
        self.store
            .list(tenant_id)
            .into_iter()
            .filter(|e| e.outstanding_balance > 0)
            .collect()
    }

    /// The `total_credit_used` figure for a customer (zero when unknown).
    pub fn total_credit_used(&self, tenant_id: TenantId, customer_id: &CustomerId) -> u64 {
        self.get(tenant_id, customer_id)
            .map(|e| e.outstanding_balance)
            .unwrap_or(0)
    }

    /// Apply an envelope into the exposure read model.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), CreditExposureProjectionError> {
        if envelope.aggregate_type() != "invoicing.invoice" {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(tenant_id, aggregate_id);

        if seq == 0 {
            return Err(CreditExposureProjectionError::NonMonotonicSequence { last, found: seq });
        }

        if seq <= last {
            return Ok(());
        }

        if seq != last + 1 && last != 0 {
            return Err(CreditExposureProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: InvoiceEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| CreditExposureProjectionError::Deserialize(e.to_string()))?;

        let event_tenant = match &ev {
            InvoiceEvent::InvoiceIssued(e) => e.tenant_id,
            InvoiceEvent::PaymentReconciled(e) => e.tenant_id,
            InvoiceEvent::InvoiceVoided(e) => e.tenant_id,
        };

        if event_tenant != tenant_id {
            return Err(CreditExposureProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }

        match ev {
            InvoiceEvent::InvoiceIssued(e) => {
                if let Ok(mut index) = self.invoice_index.write() {
                    index.insert(
                        (tenant_id, aggregate_id),
                        InvoiceSnapshot {
                            customer_id: e.customer_id,
                            total_amount: e.total_amount,
                            total_paid: 0,
                            status: InvoiceStatus::Open,
                        },
                    );
                }

                let mut exposure = self
                    .store
                    .get(tenant_id, &e.customer_id)
                    .unwrap_or_else(|| CustomerCreditExposure::new(e.customer_id));
                exposure.total_invoiced += e.total_amount;
                exposure.outstanding_balance += e.total_amount;
                exposure.open_invoice_count += 1;
                self.store.upsert(tenant_id, e.customer_id, exposure);
            }
            InvoiceEvent::PaymentReconciled(e) => {
                let snapshot = {
                    let index = self.invoice_index.read().ok();
                    index.and_then(|m| m.get(&(tenant_id, aggregate_id)).cloned())
                };

                if let Some(snapshot) = snapshot {
                    if let Ok(mut index) = self.invoice_index.write() {
                        if let Some(s) = index.get_mut(&(tenant_id, aggregate_id)) {
                            s.total_paid = e.new_total_paid;
                            if e.new_total_paid >= s.total_amount {
                                s.status = InvoiceStatus::Paid;
                            }
                        }
                    }

                    if let Some(mut exposure) = self.store.get(tenant_id, &snapshot.customer_id) {
                        exposure.total_paid += e.allocated_amount;
                        exposure.outstanding_balance =
                            exposure.outstanding_balance.saturating_sub(e.allocated_amount);
                        if e.new_total_paid >= snapshot.total_amount {
                            exposure.open_invoice_count =
                                exposure.open_invoice_count.saturating_sub(1);
                        }
                        self.store.upsert(tenant_id, snapshot.customer_id, exposure);
                    }
                }
            }
            InvoiceEvent::InvoiceVoided(_) => {
                let snapshot = {
                    let index = self.invoice_index.read().ok();
                    index.and_then(|m| m.get(&(tenant_id, aggregate_id)).cloned())
                };

                if let Some(snapshot) = snapshot {
                    if let Ok(mut index) = self.invoice_index.write() {
                        if let Some(s) = index.get_mut(&(tenant_id, aggregate_id)) {
                            s.status = InvoiceStatus::Void;
                        }
                    }

                    // Reverse the remaining outstanding amount.
                    if let Some(mut exposure) = self.store.get(tenant_id, &snapshot.customer_id) {
                        let outstanding = snapshot.total_amount.saturating_sub(snapshot.total_paid);
                        exposure.outstanding_balance =
                            exposure.outstanding_balance.saturating_sub(outstanding);
                        if snapshot.status != InvoiceStatus::Paid {
                            exposure.open_invoice_count =
                                exposure.open_invoice_count.saturating_sub(1);
                        }
                        self.store.upsert(tenant_id, snapshot.customer_id, exposure);
                    }
                }
            }
        }

        self.update_cursor(tenant_id, aggregate_id, seq);
        Ok(())
    }

    /// Rebuild the read model from scratch.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), CreditExposureProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        {
            let mut tenants = envs.iter().map(|e| e.tenant_id()).collect::<Vec<_>>();
            tenants.sort_by_key(|t| *t.as_uuid().as_bytes());
            tenants.dedup();
            for t in tenants {
                self.store.clear_tenant(t);
                self.clear_cursors(t);
            }
        }

        if let Ok(mut index) = self.invoice_index.write() {
            index.clear();
        }

        envs.sort_by_key(|e| {
            (
                *e.tenant_id().as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}

impl<S, C> CreditUsageSource for CreditExposureProjection<S, C>
where
    S: TenantStore<CustomerId, CustomerCreditExposure>,
    C: ProjectionCursorStore + 'static,
{
    fn total_credit_used(&self, tenant_id: TenantId, customer_id: &CustomerId) -> u64 {
        CreditExposureProjection::total_credit_used(self, tenant_id, customer_id)
    }
}
