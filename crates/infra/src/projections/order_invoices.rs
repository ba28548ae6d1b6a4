//! Order Invoices Projection.
//!
//! Tracks each invoice's kind, totals, reconciliation state and partials,
//! queryable by the originating sales order. Backs the paid-in-full
//! settlement service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;
use thiserror::Error;

use creditline_core::{AggregateId, TenantId};
use creditline_customers::CustomerId;
use creditline_events::EventEnvelope;
use creditline_invoicing::{
    InvoiceEvent, InvoiceId, InvoiceKind, InvoicePaymentState, InvoiceStatus, ReconciledInvoice,
    ReconciledPartial,
};
use creditline_orders::SalesOrderId;

use crate::projections::cursor_store::{InMemoryCursorStore, ProjectionCursorStore};
use crate::read_model::TenantStore;
use crate::workflow::OrderInvoicesSource;

/// Read model: one invoice with its settlement-relevant facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRecord {
    pub invoice_id: InvoiceId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub kind: InvoiceKind,
    pub status: InvoiceStatus,
    pub payment_state: InvoicePaymentState,
    pub total_amount: u64,
    pub total_paid: u64,
    pub partials: Vec<ReconciledPartial>,
}

impl ReconciledInvoice for InvoiceRecord {
    fn kind(&self) -> InvoiceKind {
        self.kind
    }

    fn payment_state(&self) -> InvoicePaymentState {
        self.payment_state
    }

    fn partials(&self) -> &[ReconciledPartial] {
        &self.partials
    }
}

/// Tenant+aggregate cursor for idempotent projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum OrderInvoicesProjectionError {
    #[error("failed to deserialize invoice event: {0}")]
    Deserialize(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Order invoices projection: invoice directory keyed by invoice, queried by order.
///
/// Rebuildable from invoice events. Tenant-isolated.
#[derive(Debug)]
pub struct OrderInvoicesProjection<S, C = InMemoryCursorStore>
where
    S: TenantStore<InvoiceId, InvoiceRecord>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
    cursor_store: Option<Arc<C>>,
    projection_name: String,
}

impl<S> OrderInvoicesProjection<S>
where
    S: TenantStore<InvoiceId, InvoiceRecord>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
            cursor_store: None,
            projection_name: "invoicing.order_invoices".to_string(),
        }
    }

    pub fn with_persistent_cursors<C: ProjectionCursorStore + 'static>(
        self,
        cursor_store: Arc<C>,
        projection_name: impl Into<String>,
    ) -> OrderInvoicesProjection<S, C> {
        OrderInvoicesProjection {
            store: self.store,
            cursors: RwLock::new(HashMap::new()),
            cursor_store: Some(cursor_store),
            projection_name: projection_name.into(),
        }
    }
}

impl<S, C> OrderInvoicesProjection<S, C>
where
    S: TenantStore<InvoiceId, InvoiceRecord>,
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

    pub fn get(&self, tenant_id: TenantId, invoice_id: &InvoiceId) -> Option<InvoiceRecord> {
        self.store.get(tenant_id, invoice_id)
    }

    /// All non-void invoices issued from an order.
    pub fn list_for_order(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Vec<InvoiceRecord> {
        self.store
            .list(tenant_id)
            .into_iter()
            .filter(|r| r.order_id == order_id && r.status != InvoiceStatus::Void)
            .collect()
    }

    /// Apply an envelope into the invoice directory.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), OrderInvoicesProjectionError> {
        if envelope.aggregate_type() != "invoicing.invoice" {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(tenant_id, aggregate_id);

        if seq == 0 {
            return Err(OrderInvoicesProjectionError::NonMonotonicSequence { last, found: seq });
        }

        if seq <= last {
            return Ok(());
        }

        if seq != last + 1 && last != 0 {
            return Err(OrderInvoicesProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: InvoiceEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| OrderInvoicesProjectionError::Deserialize(e.to_string()))?;

        let event_tenant = match &ev {
            InvoiceEvent::InvoiceIssued(e) => e.tenant_id,
            InvoiceEvent::PaymentReconciled(e) => e.tenant_id,
            InvoiceEvent::InvoiceVoided(e) => e.tenant_id,
        };

        if event_tenant != tenant_id {
            return Err(OrderInvoicesProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }

        match ev {
            InvoiceEvent::InvoiceIssued(e) => {
                self.store.upsert(
                    tenant_id,
                    e.invoice_id,
                    InvoiceRecord {
                        invoice_id: e.invoice_id,
                        order_id: e.order_id,
                        customer_id: e.customer_id,
                        kind: e.kind,
                        status: InvoiceStatus::Open,
                        payment_state: InvoicePaymentState::NotPaid,
                        total_amount: e.total_amount,
                        total_paid: 0,
                        partials: Vec::new(),
                    },
                );
            }
            InvoiceEvent::PaymentReconciled(e) => {
                if let Some(mut record) = self.store.get(tenant_id, &e.invoice_id) {
                    record.partials.push(ReconciledPartial {
                        payment_id: e.payment_id,
                        allocated_amount: e.allocated_amount,
                    });
                    record.total_paid = e.new_total_paid;
                    if record.total_paid >= record.total_amount {
                        record.status = InvoiceStatus::Paid;
                        record.payment_state = InvoicePaymentState::Paid;
                    } else if record.total_paid > 0 {
                        record.payment_state = InvoicePaymentState::InPayment;
                    }
                    self.store.upsert(tenant_id, e.invoice_id, record);
                }
            }
            InvoiceEvent::InvoiceVoided(e) => {
                if let Some(mut record) = self.store.get(tenant_id, &e.invoice_id) {
                    record.status = InvoiceStatus::Void;
                    self.store.upsert(tenant_id, e.invoice_id, record);
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
    ) -> Result<(), OrderInvoicesProjectionError> {
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

impl<S, C> OrderInvoicesSource for OrderInvoicesProjection<S, C>
where
    S: TenantStore<InvoiceId, InvoiceRecord>,
    C: ProjectionCursorStore + 'static,
{
    fn invoices_for_order(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Vec<InvoiceRecord> {
        self.list_for_order(tenant_id, order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_model::InMemoryTenantStore;
    use chrono::Utc;
    use creditline_billing::PaymentId;
    use creditline_core::AggregateId;
    use creditline_invoicing::{InvoiceIssued, InvoiceLine, PaymentReconciled};

    fn make_envelope(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        seq: u64,
        event: InvoiceEvent,
    ) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            uuid::Uuid::now_v7(),
            tenant_id,
            aggregate_id,
            "invoicing.invoice".to_string(),
            seq,
            serde_json::to_value(&event).unwrap(),
        )
    }

    fn issued(
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        order_id: SalesOrderId,
        kind: InvoiceKind,
        total: u64,
    ) -> InvoiceEvent {
        InvoiceEvent::InvoiceIssued(InvoiceIssued {
            tenant_id,
            invoice_id,
            order_id,
            customer_id: CustomerId::new(AggregateId::new()),
            kind,
            lines: vec![InvoiceLine {
                line_no: 1,
                order_line_no: 1,
                description: "Widget".to_string(),
                quantity: 1,
                unit_price: total,
            }],
            due_date: Utc::now(),
            total_amount: total,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn lists_invoices_by_order_and_tracks_partials() {
        let store = Arc::new(InMemoryTenantStore::<InvoiceId, InvoiceRecord>::new());
        let proj = OrderInvoicesProjection::new(store);

        let tenant_id = TenantId::new();
        let order_id = SalesOrderId::new(AggregateId::new());
        let invoice_id = InvoiceId::new(AggregateId::new());
        let other_invoice = InvoiceId::new(AggregateId::new());

        proj.apply_envelope(&make_envelope(
            tenant_id,
            invoice_id.0,
            1,
            issued(tenant_id, invoice_id, order_id, InvoiceKind::Regular, 10_000),
        ))
        .unwrap();
        proj.apply_envelope(&make_envelope(
            tenant_id,
            other_invoice.0,
            1,
            issued(
                tenant_id,
                other_invoice,
                SalesOrderId::new(AggregateId::new()),
                InvoiceKind::Regular,
                500,
            ),
        ))
        .unwrap();

        let payment_id = PaymentId::new(AggregateId::new());
        proj.apply_envelope(&make_envelope(
            tenant_id,
            invoice_id.0,
            2,
            InvoiceEvent::PaymentReconciled(PaymentReconciled {
                tenant_id,
                invoice_id,
                payment_id,
                allocated_amount: 4_000,
                new_total_paid: 4_000,
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();

        let records = proj.list_for_order(tenant_id, order_id);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.payment_state, InvoicePaymentState::InPayment);
        assert_eq!(record.partials.len(), 1);
        assert_eq!(record.partials[0].payment_id, payment_id);
    }

    #[test]
    fn void_invoices_drop_out_of_order_listing() {
        let store = Arc::new(InMemoryTenantStore::<InvoiceId, InvoiceRecord>::new());
        let proj = OrderInvoicesProjection::new(store);

        let tenant_id = TenantId::new();
        let order_id = SalesOrderId::new(AggregateId::new());
        let invoice_id = InvoiceId::new(AggregateId::new());

        proj.apply_envelope(&make_envelope(
            tenant_id,
            invoice_id.0,
            1,
            issued(tenant_id, invoice_id, order_id, InvoiceKind::Regular, 10_000),
        ))
        .unwrap();

        proj.apply_envelope(&make_envelope(
            tenant_id,
            invoice_id.0,
            2,
            InvoiceEvent::InvoiceVoided(creditline_invoicing::InvoiceVoided {
                tenant_id,
                invoice_id,
                reason: None,
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();

        assert!(proj.list_for_order(tenant_id, order_id).is_empty());
        assert_eq!(
            proj.get(tenant_id, &invoice_id).unwrap().status,
            InvoiceStatus::Void
        );
    }
}
