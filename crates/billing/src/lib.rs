//! Billing reference data: payment terms, payment methods, and the payment
//! records mirrored read-only from the external reconciliation subsystem.
//!
//! Nothing here is event-sourced; these are plain entities consumed by the
//! order and invoicing modules.

pub mod method;
pub mod payment;
pub mod term;

pub use method::{PaymentMethod, PaymentMethodCode, PaymentMethodId};
pub use payment::{Payment, PaymentId, PaymentState};
pub use term::{PaymentTerm, PaymentTermId};
