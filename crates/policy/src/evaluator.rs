//! The credit policy evaluator.
//!
//! A pure function of the commercial customer's credit standing, the order
//! under check, and the global credit settings. It never mutates anything;
//! the confirmation workflow decides what to do with a failure (override,
//! block with a warning dialog, or banner-only in the pre-check path).

use thiserror::Error;

use creditline_billing::PaymentMethod;
use creditline_core::Money;
use creditline_customers::Customer;
use creditline_orders::SalesOrder;

use crate::settings::CreditSettings;

/// The channel a check is invoked from. Automated storefront transactions
/// carry their own payment capture and are exempt from the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckContext {
    Interactive,
    Storefront,
}

impl CheckContext {
    pub fn is_exempt(self) -> bool {
        matches!(self, CheckContext::Storefront)
    }
}

/// How a passing check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// All applicable steps ran and passed.
    Passed,
    /// The check did not apply (exempt channel, exempt payment method, or
    /// no limit configured with prepayment testing off).
    Skipped,
}

/// Typed credit-check failure; `Display` carries the user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreditCheckFailure {
    #[error("Credit Hold!\nThis Account is on hold")]
    CreditHold,

    #[error(
        "Over Credit Limit!\nCredit Limit: {credit_limit}\nTotal Credit Balance: {total_credit_used}\nTotal this order: {order_total}"
    )]
    CreditExceeded {
        credit_limit: Money,
        total_credit_used: Money,
        order_total: Money,
    },

    #[error("Overdue Invoices! {customer_name} has overdue invoices.")]
    OverdueInvoices { customer_name: String },
}

/// Credit standing of the order's customer, assembled by the caller.
///
/// Credit amounts and the hold flag come from the **commercial** (top-level)
/// entity; the overdue flag and display name come from the direct customer.
/// `total_credit_used` is supplied by the credit-exposure read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditProfile {
    pub customer_name: String,
    pub credit_limit: u64,
    pub total_credit_used: u64,
    pub credit_hold: bool,
    pub override_credit_threshold_limit: u64,
    pub has_overdue_by_x_days: bool,
}

impl CreditProfile {
    pub fn assemble(direct: &Customer, commercial: &Customer, total_credit_used: u64) -> Self {
        Self {
            customer_name: direct.name().to_string(),
            credit_limit: commercial.credit_limit(),
            total_credit_used,
            credit_hold: commercial.credit_hold(),
            override_credit_threshold_limit: commercial.override_credit_threshold_limit(),
            has_overdue_by_x_days: direct.has_overdue_by_x_days(),
        }
    }
}

/// The order facts the evaluator consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreditView {
    pub amount_total: u64,
    pub currency: String,
    pub is_confirmed: bool,
    pub override_credit_limit: bool,
    pub payment_method: Option<PaymentMethod>,
}

impl OrderCreditView {
    pub fn from_order(order: &SalesOrder, payment_method: Option<PaymentMethod>) -> Self {
        Self {
            amount_total: order.amount_total(),
            currency: order.currency().to_string(),
            is_confirmed: order.is_confirmed(),
            override_credit_limit: order.override_credit_limit(),
            payment_method,
        }
    }
}

/// The evaluator itself; holds the global settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditPolicy {
    settings: CreditSettings,
}

impl CreditPolicy {
    pub fn new(settings: CreditSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> CreditSettings {
        self.settings
    }

    /// Run the credit check for one order.
    ///
    /// Step order mirrors the confirmation contract:
    ///
    /// 1. exempt channels skip everything;
    /// 2. a credit hold fails immediately, regardless of amounts;
    /// 3. with a positive limit (or prepayment testing on) and no override,
    ///    usage is tested against the limit — unless the order's payment
    ///    method is exempt, or there is neither usage nor limit to test;
    ///    a method/no-data skip ends the whole check for this order;
    /// 4. the overdue test runs last, again bypassed by an override.
    pub fn check(
        &self,
        ctx: CheckContext,
        profile: &CreditProfile,
        order: &OrderCreditView,
    ) -> Result<CheckOutcome, CreditCheckFailure> {
        if ctx.is_exempt() {
            return Ok(CheckOutcome::Skipped);
        }

        if profile.credit_hold {
            return Err(CreditCheckFailure::CreditHold);
        }

        if (profile.credit_limit > 0 || self.settings.prepayment_test)
            && !order.override_credit_limit
        {
            if let Some(method) = &order.payment_method {
                if !method.prepayment_test {
                    return Ok(CheckOutcome::Skipped);
                }
            }

            if profile.total_credit_used == 0
                && profile.credit_limit == 0
                && !self.settings.prepayment_test
            {
                return Ok(CheckOutcome::Skipped);
            }

            if profile.total_credit_used >= profile.credit_limit {
                return Err(self.exceeded(profile, order));
            }

            let projected = profile.total_credit_used as u128 + order.amount_total as u128;
            if !order.is_confirmed && projected > profile.credit_limit as u128 {
                return Err(self.exceeded(profile, order));
            }
        }

        if self.settings.overdue_test
            && profile.has_overdue_by_x_days
            && !order.override_credit_limit
        {
            return Err(CreditCheckFailure::OverdueInvoices {
                customer_name: profile.customer_name.clone(),
            });
        }

        Ok(CheckOutcome::Passed)
    }

    fn exceeded(&self, profile: &CreditProfile, order: &OrderCreditView) -> CreditCheckFailure {
        CreditCheckFailure::CreditExceeded {
            credit_limit: Money::new(profile.credit_limit, order.currency.clone()),
            total_credit_used: Money::new(profile.total_credit_used, order.currency.clone()),
            order_total: Money::new(order.amount_total, order.currency.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditline_billing::{PaymentMethodCode, PaymentMethodId};
    use creditline_core::AggregateId;
    use proptest::prelude::*;

    fn profile(limit: u64, used: u64) -> CreditProfile {
        CreditProfile {
            customer_name: "Acme Industrial".to_string(),
            credit_limit: limit,
            total_credit_used: used,
            credit_hold: false,
            override_credit_threshold_limit: 0,
            has_overdue_by_x_days: false,
        }
    }

    fn order(total: u64) -> OrderCreditView {
        OrderCreditView {
            amount_total: total,
            currency: "USD".to_string(),
            is_confirmed: false,
            override_credit_limit: false,
            payment_method: None,
        }
    }

    fn policy() -> CreditPolicy {
        CreditPolicy::new(CreditSettings::default())
    }

    #[test]
    fn credit_hold_fails_regardless_of_amounts() {
        let mut p = profile(1_000_000, 0);
        p.credit_hold = true;

        let err = policy()
            .check(CheckContext::Interactive, &p, &order(1))
            .unwrap_err();
        assert_eq!(err, CreditCheckFailure::CreditHold);
    }

    #[test]
    fn storefront_channel_is_exempt() {
        let mut p = profile(100, 1_000_000);
        p.credit_hold = true;

        let outcome = policy()
            .check(CheckContext::Storefront, &p, &order(1))
            .unwrap();
        assert_eq!(outcome, CheckOutcome::Skipped);
    }

    #[test]
    fn usage_at_or_above_limit_fails() {
        // limit 1000.00, used 1200.00, order 1300.00
        let err = policy()
            .check(CheckContext::Interactive, &profile(100_000, 120_000), &order(130_000))
            .unwrap_err();
        match err {
            CreditCheckFailure::CreditExceeded {
                credit_limit,
                total_credit_used,
                order_total,
            } => {
                assert_eq!(credit_limit.to_string(), "USD 1000.00");
                assert_eq!(total_credit_used.to_string(), "USD 1200.00");
                assert_eq!(order_total.to_string(), "USD 1300.00");
            }
            other => panic!("Expected CreditExceeded, got {other:?}"),
        }
    }

    #[test]
    fn projected_usage_fails_only_while_unconfirmed() {
        let p = profile(100_000, 50_000);

        let err = policy()
            .check(CheckContext::Interactive, &p, &order(60_000))
            .unwrap_err();
        assert!(matches!(err, CreditCheckFailure::CreditExceeded { .. }));

        // Already-confirmed orders are not re-projected against the limit.
        let mut confirmed = order(60_000);
        confirmed.is_confirmed = true;
        let outcome = policy()
            .check(CheckContext::Interactive, &p, &confirmed)
            .unwrap();
        assert_eq!(outcome, CheckOutcome::Passed);
    }

    #[test]
    fn zero_limit_and_usage_skip_without_prepayment_test() {
        let outcome = policy()
            .check(CheckContext::Interactive, &profile(0, 0), &order(u64::MAX))
            .unwrap();
        assert_eq!(outcome, CheckOutcome::Skipped);
    }

    #[test]
    fn prepayment_test_fails_zero_limit_customers() {
        let policy = CreditPolicy::new(CreditSettings::new(true, false));

        let err = policy
            .check(CheckContext::Interactive, &profile(0, 0), &order(100))
            .unwrap_err();
        assert!(matches!(err, CreditCheckFailure::CreditExceeded { .. }));
    }

    #[test]
    fn exempt_payment_method_skips_remaining_steps() {
        // Overdue test is on and the customer is overdue, but the exempt
        // method ends the whole check for this order.
        let policy = CreditPolicy::new(CreditSettings::new(false, true));
        let mut p = profile(100_000, 120_000);
        p.has_overdue_by_x_days = true;

        let mut o = order(130_000);
        o.payment_method = Some(
            PaymentMethod::new(
                PaymentMethodId::new(AggregateId::new()),
                "Wire prepaid",
                PaymentMethodCode::Electronic,
            )
            .with_prepayment_test(false),
        );

        let outcome = policy.check(CheckContext::Interactive, &p, &o).unwrap();
        assert_eq!(outcome, CheckOutcome::Skipped);
    }

    #[test]
    fn override_flag_bypasses_limit_and_overdue() {
        let policy = CreditPolicy::new(CreditSettings::new(false, true));
        let mut p = profile(100_000, 120_000);
        p.has_overdue_by_x_days = true;

        let mut o = order(130_000);
        o.override_credit_limit = true;

        let outcome = policy.check(CheckContext::Interactive, &p, &o).unwrap();
        assert_eq!(outcome, CheckOutcome::Passed);
    }

    #[test]
    fn overdue_test_fails_after_limit_passes() {
        let policy = CreditPolicy::new(CreditSettings::new(false, true));
        let mut p = profile(1_000_000, 0);
        p.has_overdue_by_x_days = true;

        let err = policy
            .check(CheckContext::Interactive, &p, &order(100))
            .unwrap_err();
        match err {
            CreditCheckFailure::OverdueInvoices { customer_name } => {
                assert_eq!(customer_name, "Acme Industrial");
            }
            other => panic!("Expected OverdueInvoices, got {other:?}"),
        }
    }

    #[test]
    fn overdue_test_off_ignores_overdue_flag() {
        let mut p = profile(1_000_000, 0);
        p.has_overdue_by_x_days = true;

        let outcome = policy()
            .check(CheckContext::Interactive, &p, &order(100))
            .unwrap();
        assert_eq!(outcome, CheckOutcome::Passed);
    }

    proptest! {
        // With a positive limit, no override and no exempt method, usage at
        // or above the limit never passes.
        #[test]
        fn saturated_limit_never_passes(
            limit in 1u64..1_000_000,
            over in 0u64..1_000_000,
            total in 0u64..1_000_000,
        ) {
            let p = profile(limit, limit + over);
            let result = policy().check(CheckContext::Interactive, &p, &order(total));
            prop_assert!(matches!(result, Err(CreditCheckFailure::CreditExceeded { .. })), "expected CreditExceeded");
        }

        // Headroom covering the order total always passes with defaults.
        #[test]
        fn sufficient_headroom_always_passes(
            used in 0u64..1_000_000,
            total in 0u64..1_000_000,
            headroom in 1u64..1_000_000,
        ) {
            let limit = used + total + headroom;
            let p = profile(limit, used);
            let result = policy().check(CheckContext::Interactive, &p, &order(total));
            prop_assert_eq!(result, Ok(CheckOutcome::Passed));
        }
    }
}
