//! Sales orders domain module (event-sourced).
//!
//! This crate contains business rules for sales orders and their credit and
//! delivery-hold flags, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod hold;
pub mod order;

pub use hold::{HoldSources, resolve_delivery_hold, resolve_delivery_hold_from_records};
pub use order::{
    AddLine, BillingProfileSet, CancelOrder, ClearOverCredit, ConfirmOrder, CreateOrder,
    CreditLimitOverridden, FlagOverCredit, LineAdded, MarkCreditOverridden, OrderCancelled,
    OrderConfirmed, OrderCreated, OrderLine, OverCreditCleared, OverCreditFlagged,
    SalesOrder, SalesOrderCommand, SalesOrderEvent, SalesOrderId, SalesOrderStatus,
    SetBillingProfile,
};
