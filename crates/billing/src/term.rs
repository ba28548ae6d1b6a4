use serde::{Deserialize, Serialize};

use creditline_core::{AggregateId, Entity};

/// Payment term identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentTermId(pub AggregateId);

impl PaymentTermId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentTermId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Payment term selectable on an order.
///
/// The term-level delivery-hold flag takes precedence over both customer-level
/// flags when the order's hold is re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerm {
    pub id: PaymentTermId,
    pub name: String,
    pub hold_delivery_till_payment: bool,
}

impl PaymentTerm {
    pub fn new(id: PaymentTermId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hold_delivery_till_payment: false,
        }
    }

    pub fn with_delivery_hold(mut self, hold: bool) -> Self {
        self.hold_delivery_till_payment = hold;
        self
    }
}

impl Entity for PaymentTerm {
    type Id = PaymentTermId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
