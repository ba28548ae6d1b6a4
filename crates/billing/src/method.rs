use serde::{Deserialize, Serialize};

use creditline_core::{AggregateId, Entity};

/// Payment method identifier (doubles as the journal reference for
/// inbound-payment defaults).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodId(pub AggregateId);

impl PaymentMethodId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentMethodId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Stable method code used by the settlement rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodCode {
    BatchPayment,
    Manual,
    Electronic,
}

/// Payment method selectable on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub code: PaymentMethodCode,
    /// When false, orders paying via this method are exempt from the
    /// prepayment/credit-limit test.
    pub prepayment_test: bool,
}

impl PaymentMethod {
    pub fn new(id: PaymentMethodId, name: impl Into<String>, code: PaymentMethodCode) -> Self {
        Self {
            id,
            name: name.into(),
            code,
            prepayment_test: true,
        }
    }

    pub fn with_prepayment_test(mut self, enabled: bool) -> Self {
        self.prepayment_test = enabled;
        self
    }

    pub fn is_batch(&self) -> bool {
        self.code == PaymentMethodCode::BatchPayment
    }
}

impl Entity for PaymentMethod {
    type Id = PaymentMethodId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
