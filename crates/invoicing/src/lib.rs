//! Invoicing domain module (event-sourced).
//!
//! This crate contains business rules for customer invoices, their payment
//! reconciliation state, and the paid-in-full settlement checks, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod invoice;
pub mod settlement;

pub use invoice::{
    Invoice, InvoiceCommand, InvoiceEvent, InvoiceId, InvoiceIssued, InvoiceKind, InvoiceLine,
    InvoicePaymentState, InvoiceStatus, InvoiceVoided, IssueInvoice, PaymentReconciled,
    ReconcilePayment, ReconciledPartial, VoidInvoice,
};
pub use settlement::{PaymentLookup, ReconciledInvoice, is_order_fully_paid, sum_reconciled_payments};
