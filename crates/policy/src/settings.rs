use serde::{Deserialize, Serialize};

/// Global credit-management flags, administered outside this module (config
/// file, environment layer) and injected into the workflow services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditSettings {
    /// When enabled, customers without a positive credit limit are also
    /// subject to the credit check (prepayment enforcement).
    pub prepayment_test: bool,
    /// When enabled, customers with invoices overdue beyond the configured
    /// aging threshold fail the check. Accepts the host's historical key.
    #[serde(alias = "no_of_days_overdue_test")]
    pub overdue_test: bool,
}

impl CreditSettings {
    pub fn new(prepayment_test: bool, overdue_test: bool) -> Self {
        Self {
            prepayment_test,
            overdue_test,
        }
    }
}
