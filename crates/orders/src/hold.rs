//! Delivery-hold derivation.
//!
//! The order-level `hold_delivery_till_payment` flag is never set directly by
//! a user; it is re-derived from the current payment-term and customer
//! selection every time either changes. Precedence, first true wins:
//!
//! 1. the selected payment term's hold flag
//! 2. the customer's own hold flag
//! 3. the customer's commercial (top-level) entity's hold flag

use creditline_billing::PaymentTerm;
use creditline_customers::Customer;

/// The three flag sources feeding the derivation, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSources {
    /// Hold flag of the selected payment term, if a term is selected.
    pub payment_term: Option<bool>,
    /// The order's customer's own hold flag.
    pub customer: bool,
    /// The hold flag of the customer's commercial entity.
    pub commercial_entity: bool,
}

/// Pure derivation of the order-level delivery hold.
pub fn resolve_delivery_hold(sources: HoldSources) -> bool {
    if sources.payment_term.unwrap_or(false) {
        return true;
    }
    if sources.customer {
        return true;
    }
    sources.commercial_entity
}

/// Convenience wrapper over the domain records.
///
/// `commercial` is the customer's top-level entity; pass the customer itself
/// when it has no commercial parent.
pub fn resolve_delivery_hold_from_records(
    term: Option<&PaymentTerm>,
    customer: &Customer,
    commercial: &Customer,
) -> bool {
    resolve_delivery_hold(HoldSources {
        payment_term: term.map(|t| t.hold_delivery_till_payment),
        customer: customer.hold_delivery_till_payment(),
        commercial_entity: commercial.hold_delivery_till_payment(),
    })
}
