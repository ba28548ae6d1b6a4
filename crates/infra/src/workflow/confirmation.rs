//! Order confirmation with credit enforcement.
//!
//! Per order: a delivery hold bypasses the credit check entirely; otherwise
//! `over_credit` is reset and the evaluator runs against the commercial
//! customer's standing. A failure within the override threshold is
//! force-confirmed and marked; anything else flags the order and returns the
//! blocking warning dialog instead of confirming.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use creditline_core::TenantId;
use creditline_customers::Customer;
use creditline_events::{EventBus, EventEnvelope};
use creditline_orders::{
    CancelOrder, ClearOverCredit, ConfirmOrder, FlagOverCredit, MarkCreditOverridden, SalesOrder,
    SalesOrderCommand, SalesOrderId,
};
use creditline_policy::{
    CheckContext, CreditPolicy, CreditProfile, CreditSettings, OrderCreditView, ViewAction,
    WarningBanner, credit_limit_warning, credit_warning_banner,
};

use crate::command_dispatcher::CommandDispatcher;
use crate::event_store::EventStore;
use crate::workflow::{CreditUsageSource, PaymentMethodSource, WorkflowError, load_customer, load_order};

/// Per-order confirmation result.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
    /// Credit check passed (or was skipped); order confirmed normally.
    Confirmed,
    /// Credit check failed within the override threshold; order confirmed
    /// with `override_credit_limit` set.
    ConfirmedWithOverride,
    /// Credit check failed; order left unconfirmed with `over_credit` set
    /// (unless hard-held) and the warning dialog returned.
    Blocked(ViewAction),
}

/// Confirmation workflow service.
pub struct ConfirmationService<S, B> {
    dispatcher: CommandDispatcher<S, B>,
    usage: Arc<dyn CreditUsageSource>,
    methods: Arc<dyn PaymentMethodSource>,
    policy: CreditPolicy,
}

impl<S, B> ConfirmationService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(
        dispatcher: CommandDispatcher<S, B>,
        usage: Arc<dyn CreditUsageSource>,
        methods: Arc<dyn PaymentMethodSource>,
        settings: CreditSettings,
    ) -> Self {
        Self {
            dispatcher,
            usage,
            methods,
            policy: CreditPolicy::new(settings),
        }
    }

    /// Confirm a batch of orders; a blocked order does not stop the rest.
    pub fn confirm_orders(
        &self,
        tenant_id: TenantId,
        order_ids: &[SalesOrderId],
        ctx: CheckContext,
    ) -> Result<Vec<(SalesOrderId, ConfirmationOutcome)>, WorkflowError> {
        let mut outcomes = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            let outcome = self.confirm_order(tenant_id, order_id, ctx)?;
            outcomes.push((order_id, outcome));
        }
        Ok(outcomes)
    }

    /// Confirm a single order, enforcing the credit policy.
    pub fn confirm_order(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        ctx: CheckContext,
    ) -> Result<ConfirmationOutcome, WorkflowError> {
        let order = load_order(self.dispatcher.store(), tenant_id, order_id)?;

        if order.hold_delivery_till_payment() {
            // Delivery is gated on payment instead; no credit check.
            tracing::info!(%order_id, "delivery hold set, confirming without credit check");
            self.dispatch(tenant_id, order_id, self.confirm_cmd(tenant_id, order_id))?;
            return Ok(ConfirmationOutcome::Confirmed);
        }

        self.dispatch(
            tenant_id,
            order_id,
            SalesOrderCommand::ClearOverCredit(ClearOverCredit {
                tenant_id,
                order_id,
                occurred_at: Utc::now(),
            }),
        )?;

        let (direct, commercial) = self.load_customer_pair(tenant_id, &order)?;
        let used = self
            .usage
            .total_credit_used(tenant_id, &commercial.id_typed());
        let profile = CreditProfile::assemble(&direct, &commercial, used);
        let method = order
            .payment_method_id()
            .and_then(|id| self.methods.method(tenant_id, id));
        let view = OrderCreditView::from_order(&order, method);

        match self.policy.check(ctx, &profile, &view) {
            Ok(_) => {
                self.dispatch(tenant_id, order_id, self.confirm_cmd(tenant_id, order_id))?;
                Ok(ConfirmationOutcome::Confirmed)
            }
            Err(failure) => {
                let within_override = !commercial.credit_hold()
                    && commercial.override_credit_threshold_limit() >= order.amount_total();

                if within_override {
                    self.dispatch(tenant_id, order_id, self.confirm_cmd(tenant_id, order_id))?;
                    self.dispatch(
                        tenant_id,
                        order_id,
                        SalesOrderCommand::MarkCreditOverridden(MarkCreditOverridden {
                            tenant_id,
                            order_id,
                            occurred_at: Utc::now(),
                        }),
                    )?;
                    tracing::info!(%order_id, %failure, "credit check failed within override threshold, force-confirmed");
                    Ok(ConfirmationOutcome::ConfirmedWithOverride)
                } else {
                    if !commercial.credit_hold() {
                        self.dispatch(
                            tenant_id,
                            order_id,
                            SalesOrderCommand::FlagOverCredit(FlagOverCredit {
                                tenant_id,
                                order_id,
                                occurred_at: Utc::now(),
                            }),
                        )?;
                    }
                    tracing::warn!(%order_id, %failure, "credit check blocked confirmation");
                    Ok(ConfirmationOutcome::Blocked(credit_limit_warning(
                        failure.to_string(),
                    )))
                }
            }
        }
    }

    /// Non-fatal pre-check run when the order's customer changes, before save.
    ///
    /// Returns `None` when the check passes or the customer is within the
    /// override threshold; otherwise the banner payload for the UI.
    pub fn precheck_customer_change(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        ctx: CheckContext,
    ) -> Result<Option<WarningBanner>, WorkflowError> {
        let order = load_order(self.dispatcher.store(), tenant_id, order_id)?;
        let (direct, commercial) = self.load_customer_pair(tenant_id, &order)?;
        let used = self
            .usage
            .total_credit_used(tenant_id, &commercial.id_typed());
        let profile = CreditProfile::assemble(&direct, &commercial, used);
        let method = order
            .payment_method_id()
            .and_then(|id| self.methods.method(tenant_id, id));
        let view = OrderCreditView::from_order(&order, method);

        match self.policy.check(ctx, &profile, &view) {
            Ok(_) => Ok(None),
            Err(failure) => {
                let within_override = !commercial.credit_hold()
                    && commercial.override_credit_threshold_limit() >= order.amount_total();
                if within_override {
                    return Ok(None);
                }
                Ok(Some(credit_warning_banner(failure.to_string())))
            }
        }
    }

    /// Cancel an order; the aggregate resets both credit flags.
    pub fn cancel_order(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
    ) -> Result<(), WorkflowError> {
        self.dispatch(
            tenant_id,
            order_id,
            SalesOrderCommand::CancelOrder(CancelOrder {
                tenant_id,
                order_id,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(())
    }

    fn confirm_cmd(&self, tenant_id: TenantId, order_id: SalesOrderId) -> SalesOrderCommand {
        SalesOrderCommand::ConfirmOrder(ConfirmOrder {
            tenant_id,
            order_id,
            occurred_at: Utc::now(),
        })
    }

    fn dispatch(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        command: SalesOrderCommand,
    ) -> Result<(), WorkflowError> {
        self.dispatcher.dispatch::<SalesOrder>(
            tenant_id,
            order_id.0,
            "orders.order",
            command,
            |_, id| SalesOrder::empty(SalesOrderId::new(id)),
        )?;
        Ok(())
    }

    fn load_customer_pair(
        &self,
        tenant_id: TenantId,
        order: &SalesOrder,
    ) -> Result<(Customer, Customer), WorkflowError> {
        let customer_id = order
            .customer_id()
            .ok_or_else(|| WorkflowError::unknown("customer", "order has no customer"))?;
        let direct = load_customer(self.dispatcher.store(), tenant_id, customer_id)?;

        let commercial_id = order
            .commercial_customer_id()
            .unwrap_or_else(|| direct.commercial_entity_id());
        let commercial = if commercial_id == customer_id {
            direct.clone()
        } else {
            load_customer(self.dispatcher.store(), tenant_id, commercial_id)?
        };

        Ok((direct, commercial))
    }
}
