//! Credit policy module: the pure credit-check evaluator, the global credit
//! settings it consults, and the view-action descriptors the confirmation
//! workflow hands back to the host UI.

pub mod actions;
pub mod evaluator;
pub mod settings;

pub use actions::{
    CREDIT_LIMIT_WARNING_MODEL, OpenPaymentsRequest, PAYMENTS_MODEL, ViewAction, WarningBanner,
    credit_limit_warning, credit_warning_banner, open_payments_action,
};
pub use evaluator::{
    CheckContext, CheckOutcome, CreditCheckFailure, CreditPolicy, CreditProfile, OrderCreditView,
};
pub use settings::CreditSettings;
