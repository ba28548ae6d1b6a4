use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creditline_core::{AggregateId, Entity};
use creditline_customers::CustomerId;

use crate::method::{PaymentMethodCode, PaymentMethodId};

/// Payment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub AggregateId);

impl PaymentId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Payment lifecycle state, as reported by the reconciliation subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Draft,
    Posted,
    Cancelled,
}

/// A payment mirrored read-only from the external reconciliation subsystem.
///
/// `is_reconciled` is true once the full amount has been allocated against
/// invoices; a draft/posted payment that is not reconciled is an "open"
/// payment for display purposes. `is_matched` is the bank-statement match
/// flag consulted by the batch-payment settlement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    pub commercial_customer_id: CustomerId,
    pub method_id: PaymentMethodId,
    /// Denormalized method code, as reported alongside the relation.
    pub method_code: PaymentMethodCode,
    /// Amount in smallest currency unit.
    pub amount: u64,
    pub currency: String,
    pub state: PaymentState,
    pub is_reconciled: bool,
    pub is_matched: bool,
    /// When this mirror record was captured.
    pub recorded_at: DateTime<Utc>,
}

impl Payment {
    /// Open payments are shown in the order's payment list: draft or posted,
    /// and not yet fully allocated to invoices.
    pub fn is_open(&self) -> bool {
        matches!(self.state, PaymentState::Draft | PaymentState::Posted) && !self.is_reconciled
    }

    pub fn is_batch_method(&self) -> bool {
        self.method_code == PaymentMethodCode::BatchPayment
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(state: PaymentState, is_reconciled: bool) -> Payment {
        Payment {
            id: PaymentId::new(AggregateId::new()),
            customer_id: CustomerId::new(AggregateId::new()),
            commercial_customer_id: CustomerId::new(AggregateId::new()),
            method_id: PaymentMethodId::new(AggregateId::new()),
            method_code: PaymentMethodCode::Manual,
            amount: 10_000,
            currency: "USD".to_string(),
            state,
            is_reconciled,
            is_matched: false,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn open_requires_unreconciled_draft_or_posted() {
        assert!(payment(PaymentState::Draft, false).is_open());
        assert!(payment(PaymentState::Posted, false).is_open());
        assert!(!payment(PaymentState::Posted, true).is_open());
        assert!(!payment(PaymentState::Cancelled, false).is_open());
    }
}
