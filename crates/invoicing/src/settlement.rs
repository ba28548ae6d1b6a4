//! Paid-in-full settlement checks.
//!
//! These are pure functions over reconciled invoices and the payments they
//! were reconciled against. They answer one question for the delivery-hold
//! workflow: has the customer effectively paid for the order?

use std::collections::HashMap;

use creditline_billing::{Payment, PaymentId};

use crate::invoice::{Invoice, InvoiceKind, InvoicePaymentState, ReconciledPartial};

/// Resolves the counterpart payment of a reconciliation partial.
///
/// Returns an owned record so lock-guarded read models can implement it.
pub trait PaymentLookup {
    fn payment(&self, id: &PaymentId) -> Option<Payment>;
}

impl PaymentLookup for HashMap<PaymentId, Payment> {
    fn payment(&self, id: &PaymentId) -> Option<Payment> {
        self.get(id).cloned()
    }
}

/// The invoice facts settlement needs; implemented by the `Invoice` aggregate
/// and by read-model records.
pub trait ReconciledInvoice {
    fn kind(&self) -> InvoiceKind;
    fn payment_state(&self) -> InvoicePaymentState;
    fn partials(&self) -> &[ReconciledPartial];
}

impl ReconciledInvoice for Invoice {
    fn kind(&self) -> InvoiceKind {
        Invoice::kind(self)
    }

    fn payment_state(&self) -> InvoicePaymentState {
        Invoice::payment_state(self)
    }

    fn partials(&self) -> &[ReconciledPartial] {
        Invoice::partials(self)
    }
}

fn counts_towards_settlement(state: InvoicePaymentState) -> bool {
    matches!(
        state,
        InvoicePaymentState::InPayment | InvoicePaymentState::Paid
    )
}

/// Sum the reconciled payment amounts over a set of invoices.
///
/// Each partial contributes the counterpart payment's **full amount**, not the
/// allocated amount; batch payments additionally require the bank-match flag.
/// A matched batch payment reconciled against several partials therefore
/// contributes its full amount once per partial — upstream reconciliation
/// contract, preserved as-is.
pub fn sum_reconciled_payments<'a, T, P>(
    invoices: impl IntoIterator<Item = &'a T>,
    payments: &P,
) -> u64
where
    T: ReconciledInvoice + 'a,
    P: PaymentLookup + ?Sized,
{
    let mut total: u64 = 0;
    for invoice in invoices {
        let counts = counts_towards_settlement(invoice.payment_state());
        for partial in invoice.partials() {
            let Some(payment) = payments.payment(&partial.payment_id) else {
                continue;
            };
            if payment.is_batch_method() {
                if counts && payment.is_matched {
                    total = total.saturating_add(payment.amount);
                }
            } else if counts {
                total = total.saturating_add(payment.amount);
            }
        }
    }
    total
}

/// Whether the order's invoices cover its total.
///
/// The order's invoices are partitioned by kind: true iff the regular-invoice
/// paid total reaches the order total, or the down-payment paid total reaches
/// the order's untaxed total.
pub fn is_order_fully_paid<T, P>(
    amount_total: u64,
    amount_untaxed: u64,
    invoices: &[T],
    payments: &P,
) -> bool
where
    T: ReconciledInvoice,
    P: PaymentLookup + ?Sized,
{
    let regular_paid = sum_reconciled_payments(
        invoices.iter().filter(|i| i.kind() == InvoiceKind::Regular),
        payments,
    );
    if regular_paid >= amount_total {
        return true;
    }

    let downpayment_paid = sum_reconciled_payments(
        invoices
            .iter()
            .filter(|i| i.kind() == InvoiceKind::DownPayment),
        payments,
    );
    downpayment_paid >= amount_untaxed
}
