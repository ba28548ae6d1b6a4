use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creditline_billing::{PaymentMethodId, PaymentTermId};
use creditline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use creditline_customers::CustomerId;
use creditline_events::Event;

/// Sales order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
    Cancelled,
}

/// Order line: description, quantity, unit price, line tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub description: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    /// Total tax for the line in smallest currency unit.
    pub tax: u64,
    /// Down-payment lines drive the down-payment invoice classification.
    pub is_downpayment: bool,
}

/// Aggregate root: SalesOrder.
///
/// Besides the usual lifecycle, the order carries three policy flags:
///
/// - `override_credit_limit`: set when the confirmation workflow force-confirms
///   a failed credit check within the customer's override threshold
/// - `over_credit`: set when a failed check blocks confirmation
/// - `hold_delivery_till_payment`: derived from payment-term/customer flags;
///   only writable through `SetBillingProfile`
///
/// Cancellation resets both credit flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    tenant_id: Option<TenantId>,
    customer_id: Option<CustomerId>,
    commercial_customer_id: Option<CustomerId>,
    currency: String,
    status: SalesOrderStatus,
    lines: Vec<OrderLine>,
    payment_term_id: Option<PaymentTermId>,
    payment_method_id: Option<PaymentMethodId>,
    amount_untaxed: u64,
    amount_total: u64,
    override_credit_limit: bool,
    over_credit: bool,
    hold_delivery_till_payment: bool,
    version: u64,
    created: bool,
}

impl SalesOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SalesOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            customer_id: None,
            commercial_customer_id: None,
            currency: String::new(),
            status: SalesOrderStatus::Draft,
            lines: Vec::new(),
            payment_term_id: None,
            payment_method_id: None,
            amount_untaxed: 0,
            amount_total: 0,
            override_credit_limit: false,
            over_credit: false,
            hold_delivery_till_payment: false,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn commercial_customer_id(&self) -> Option<CustomerId> {
        self.commercial_customer_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn payment_term_id(&self) -> Option<PaymentTermId> {
        self.payment_term_id
    }

    pub fn payment_method_id(&self) -> Option<PaymentMethodId> {
        self.payment_method_id
    }

    /// Sum of quantity × unit price over all lines.
    pub fn amount_untaxed(&self) -> u64 {
        self.amount_untaxed
    }

    /// Untaxed amount plus line taxes.
    pub fn amount_total(&self) -> u64 {
        self.amount_total
    }

    pub fn override_credit_limit(&self) -> bool {
        self.override_credit_limit
    }

    pub fn over_credit(&self) -> bool {
        self.over_credit
    }

    pub fn hold_delivery_till_payment(&self) -> bool {
        self.hold_delivery_till_payment
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Draft)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Confirmed)
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    /// Top-level commercial entity of the customer.
    pub commercial_customer_id: CustomerId,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub tax: u64,
    pub is_downpayment: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetBillingProfile.
///
/// The only writer of the order's customer, payment-term and payment-method
/// selection. `delivery_hold` carries the value re-derived by the billing
/// change handler; callers must not pass anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBillingProfile {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub commercial_customer_id: CustomerId,
    pub payment_term_id: Option<PaymentTermId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub delivery_hold: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FlagOverCredit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOverCredit {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearOverCredit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearOverCredit {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkCreditOverridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkCreditOverridden {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderCommand {
    CreateOrder(CreateOrder),
    AddLine(AddLine),
    SetBillingProfile(SetBillingProfile),
    FlagOverCredit(FlagOverCredit),
    ClearOverCredit(ClearOverCredit),
    MarkCreditOverridden(MarkCreditOverridden),
    ConfirmOrder(ConfirmOrder),
    CancelOrder(CancelOrder),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub commercial_customer_id: CustomerId,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub description: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub tax: u64,
    pub is_downpayment: bool,
    pub new_amount_untaxed: u64,
    pub new_amount_total: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BillingProfileSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingProfileSet {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub commercial_customer_id: CustomerId,
    pub payment_term_id: Option<PaymentTermId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub delivery_hold: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OverCreditFlagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverCreditFlagged {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OverCreditCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverCreditCleared {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CreditLimitOverridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLimitOverridden {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    OrderCreated(OrderCreated),
    LineAdded(LineAdded),
    BillingProfileSet(BillingProfileSet),
    OverCreditFlagged(OverCreditFlagged),
    OverCreditCleared(OverCreditCleared),
    CreditLimitOverridden(CreditLimitOverridden),
    OrderConfirmed(OrderConfirmed),
    OrderCancelled(OrderCancelled),
}

impl Event for SalesOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::OrderCreated(_) => "orders.order.created",
            SalesOrderEvent::LineAdded(_) => "orders.order.line_added",
            SalesOrderEvent::BillingProfileSet(_) => "orders.order.billing_profile_set",
            SalesOrderEvent::OverCreditFlagged(_) => "orders.order.over_credit_flagged",
            SalesOrderEvent::OverCreditCleared(_) => "orders.order.over_credit_cleared",
            SalesOrderEvent::CreditLimitOverridden(_) => "orders.order.credit_limit_overridden",
            SalesOrderEvent::OrderConfirmed(_) => "orders.order.confirmed",
            SalesOrderEvent::OrderCancelled(_) => "orders.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::OrderCreated(e) => e.occurred_at,
            SalesOrderEvent::LineAdded(e) => e.occurred_at,
            SalesOrderEvent::BillingProfileSet(e) => e.occurred_at,
            SalesOrderEvent::OverCreditFlagged(e) => e.occurred_at,
            SalesOrderEvent::OverCreditCleared(e) => e.occurred_at,
            SalesOrderEvent::CreditLimitOverridden(e) => e.occurred_at,
            SalesOrderEvent::OrderConfirmed(e) => e.occurred_at,
            SalesOrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SalesOrder {
    type Command = SalesOrderCommand;
    type Event = SalesOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SalesOrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.customer_id = Some(e.customer_id);
                self.commercial_customer_id = Some(e.commercial_customer_id);
                self.currency = e.currency.clone();
                self.status = SalesOrderStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            SalesOrderEvent::LineAdded(e) => {
                self.lines.push(OrderLine {
                    line_no: e.line_no,
                    description: e.description.clone(),
                    quantity: e.quantity,
                    unit_price: e.unit_price,
                    tax: e.tax,
                    is_downpayment: e.is_downpayment,
                });
                self.amount_untaxed = e.new_amount_untaxed;
                self.amount_total = e.new_amount_total;
            }
            SalesOrderEvent::BillingProfileSet(e) => {
                self.customer_id = Some(e.customer_id);
                self.commercial_customer_id = Some(e.commercial_customer_id);
                self.payment_term_id = e.payment_term_id;
                self.payment_method_id = e.payment_method_id;
                self.hold_delivery_till_payment = e.delivery_hold;
            }
            SalesOrderEvent::OverCreditFlagged(_) => {
                self.over_credit = true;
            }
            SalesOrderEvent::OverCreditCleared(_) => {
                self.over_credit = false;
            }
            SalesOrderEvent::CreditLimitOverridden(_) => {
                self.override_credit_limit = true;
            }
            SalesOrderEvent::OrderConfirmed(_) => {
                self.status = SalesOrderStatus::Confirmed;
            }
            SalesOrderEvent::OrderCancelled(_) => {
                self.status = SalesOrderStatus::Cancelled;
                // Cancelling always clears the credit flags.
                self.over_credit = false;
                self.override_credit_limit = false;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SalesOrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            SalesOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            SalesOrderCommand::SetBillingProfile(cmd) => self.handle_set_billing_profile(cmd),
            SalesOrderCommand::FlagOverCredit(cmd) => self.handle_flag_over_credit(cmd),
            SalesOrderCommand::ClearOverCredit(cmd) => self.handle_clear_over_credit(cmd),
            SalesOrderCommand::MarkCreditOverridden(cmd) => self.handle_mark_overridden(cmd),
            SalesOrderCommand::ConfirmOrder(cmd) => self.handle_confirm(cmd),
            SalesOrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl SalesOrder {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: SalesOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_created(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_order_id(order_id)
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("sales order already exists"));
        }

        if cmd.currency.trim().is_empty() {
            return Err(DomainError::validation("currency cannot be empty"));
        }

        Ok(vec![SalesOrderEvent::OrderCreated(OrderCreated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            commercial_customer_id: cmd.commercial_customer_id,
            currency: cmd.currency.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify order once it is confirmed or cancelled",
            ));
        }

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        if cmd.unit_price == 0 {
            return Err(DomainError::validation("unit_price must be positive"));
        }

        let line_untaxed = (cmd.quantity as i128)
            .checked_mul(cmd.unit_price as i128)
            .filter(|v| *v > 0 && *v <= u64::MAX as i128)
            .ok_or_else(|| DomainError::invariant("order line amount overflow"))?
            as u64;

        let new_amount_untaxed = self
            .amount_untaxed
            .checked_add(line_untaxed)
            .ok_or_else(|| DomainError::invariant("order untaxed total overflow"))?;

        let new_amount_total = self
            .amount_total
            .checked_add(line_untaxed)
            .and_then(|v| v.checked_add(cmd.tax))
            .ok_or_else(|| DomainError::invariant("order total overflow"))?;

        let next_line_no = (self.lines.len() as u32) + 1;

        Ok(vec![SalesOrderEvent::LineAdded(LineAdded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line_no: next_line_no,
            description: cmd.description.clone(),
            quantity: cmd.quantity,
            unit_price: cmd.unit_price,
            tax: cmd.tax,
            is_downpayment: cmd.is_downpayment,
            new_amount_untaxed,
            new_amount_total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_billing_profile(
        &self,
        cmd: &SetBillingProfile,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot change billing profile once order is confirmed or cancelled",
            ));
        }

        Ok(vec![SalesOrderEvent::BillingProfileSet(BillingProfileSet {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            commercial_customer_id: cmd.commercial_customer_id,
            payment_term_id: cmd.payment_term_id,
            payment_method_id: cmd.payment_method_id,
            delivery_hold: cmd.delivery_hold,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_flag_over_credit(
        &self,
        cmd: &FlagOverCredit,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        // Idempotent: already flagged emits nothing.
        if self.over_credit {
            return Ok(vec![]);
        }

        Ok(vec![SalesOrderEvent::OverCreditFlagged(OverCreditFlagged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear_over_credit(
        &self,
        cmd: &ClearOverCredit,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        if !self.over_credit {
            return Ok(vec![]);
        }

        Ok(vec![SalesOrderEvent::OverCreditCleared(OverCreditCleared {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_overridden(
        &self,
        cmd: &MarkCreditOverridden,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        if self.status == SalesOrderStatus::Cancelled {
            return Err(DomainError::invariant(
                "cannot override credit on a cancelled order",
            ));
        }

        if self.override_credit_limit {
            return Ok(vec![]);
        }

        Ok(vec![SalesOrderEvent::CreditLimitOverridden(
            CreditLimitOverridden {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_confirm(&self, cmd: &ConfirmOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        if self.status != SalesOrderStatus::Draft {
            return Err(DomainError::invariant("only draft orders can be confirmed"));
        }

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm order without lines"));
        }

        Ok(vec![SalesOrderEvent::OrderConfirmed(OrderConfirmed {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.order_id)?;

        if self.status == SalesOrderStatus::Cancelled {
            return Err(DomainError::conflict("order is already cancelled"));
        }

        Ok(vec![SalesOrderEvent::OrderCancelled(OrderCancelled {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditline_core::AggregateId;
    use creditline_events::execute;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_order_id() -> SalesOrderId {
        SalesOrderId::new(AggregateId::new())
    }

    fn test_customer_id() -> CustomerId {
        CustomerId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn draft_order(tenant_id: TenantId, order_id: SalesOrderId) -> SalesOrder {
        let mut order = SalesOrder::empty(order_id);
        let customer_id = test_customer_id();
        let cmd = SalesOrderCommand::CreateOrder(CreateOrder {
            tenant_id,
            order_id,
            customer_id,
            commercial_customer_id: customer_id,
            currency: "USD".to_string(),
            occurred_at: test_time(),
        });
        execute(&mut order, &cmd).unwrap();
        order
    }

    fn add_line(order: &mut SalesOrder, tenant_id: TenantId, unit_price: u64, tax: u64) {
        let cmd = SalesOrderCommand::AddLine(AddLine {
            tenant_id,
            order_id: order.id_typed(),
            description: "Widget".to_string(),
            quantity: 1,
            unit_price,
            tax,
            is_downpayment: false,
            occurred_at: test_time(),
        });
        execute(order, &cmd).unwrap();
    }

    #[test]
    fn create_order_emits_order_created_event() {
        let order = SalesOrder::empty(test_order_id());
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let customer_id = test_customer_id();
        let cmd = CreateOrder {
            tenant_id,
            order_id,
            customer_id,
            commercial_customer_id: customer_id,
            currency: "USD".to_string(),
            occurred_at: test_time(),
        };

        let events = order
            .handle(&SalesOrderCommand::CreateOrder(cmd))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            SalesOrderEvent::OrderCreated(e) => {
                assert_eq!(e.tenant_id, tenant_id);
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.customer_id, customer_id);
            }
            _ => panic!("Expected OrderCreated event"),
        }
    }

    #[test]
    fn line_amounts_accumulate_untaxed_and_total() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());

        add_line(&mut order, tenant_id, 9_000, 1_000);
        assert_eq!(order.amount_untaxed(), 9_000);
        assert_eq!(order.amount_total(), 10_000);

        add_line(&mut order, tenant_id, 500, 0);
        assert_eq!(order.amount_untaxed(), 9_500);
        assert_eq!(order.amount_total(), 10_500);
    }

    #[test]
    fn billing_profile_carries_derived_delivery_hold() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        let customer_id = test_customer_id();

        let cmd = SalesOrderCommand::SetBillingProfile(SetBillingProfile {
            tenant_id,
            order_id: order.id_typed(),
            customer_id,
            commercial_customer_id: customer_id,
            payment_term_id: None,
            payment_method_id: None,
            delivery_hold: true,
            occurred_at: test_time(),
        });
        execute(&mut order, &cmd).unwrap();

        assert!(order.hold_delivery_till_payment());
        assert_eq!(order.customer_id(), Some(customer_id));
    }

    #[test]
    fn billing_profile_rejected_after_confirmation() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        add_line(&mut order, tenant_id, 100, 0);

        let confirm = SalesOrderCommand::ConfirmOrder(ConfirmOrder {
            tenant_id,
            order_id: order.id_typed(),
            occurred_at: test_time(),
        });
        execute(&mut order, &confirm).unwrap();

        let customer_id = test_customer_id();
        let cmd = SalesOrderCommand::SetBillingProfile(SetBillingProfile {
            tenant_id,
            order_id: order.id_typed(),
            customer_id,
            commercial_customer_id: customer_id,
            payment_term_id: None,
            payment_method_id: None,
            delivery_hold: false,
            occurred_at: test_time(),
        });
        let err = order.handle(&cmd).unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for billing change after confirm"),
        }
    }

    #[test]
    fn over_credit_flag_and_clear_are_idempotent() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        let order_id = order.id_typed();

        let clear = SalesOrderCommand::ClearOverCredit(ClearOverCredit {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        // Not flagged yet: nothing to clear.
        assert!(order.handle(&clear).unwrap().is_empty());

        let flag = SalesOrderCommand::FlagOverCredit(FlagOverCredit {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        let events = execute(&mut order, &flag).unwrap();
        assert_eq!(events.len(), 1);
        assert!(order.over_credit());

        // Flagging again emits nothing.
        assert!(order.handle(&flag).unwrap().is_empty());

        let events = execute(&mut order, &clear).unwrap();
        assert_eq!(events.len(), 1);
        assert!(!order.over_credit());
    }

    #[test]
    fn cannot_confirm_without_lines() {
        let tenant_id = test_tenant_id();
        let order = draft_order(tenant_id, test_order_id());

        let confirm = SalesOrderCommand::ConfirmOrder(ConfirmOrder {
            tenant_id,
            order_id: order.id_typed(),
            occurred_at: test_time(),
        });
        let err = order.handle(&confirm).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("without lines") => {}
            _ => panic!("Expected Validation error for empty order"),
        }
    }

    #[test]
    fn cannot_confirm_twice() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        add_line(&mut order, tenant_id, 100, 0);

        let confirm = SalesOrderCommand::ConfirmOrder(ConfirmOrder {
            tenant_id,
            order_id: order.id_typed(),
            occurred_at: test_time(),
        });
        execute(&mut order, &confirm).unwrap();
        assert!(order.is_confirmed());

        let err = order.handle(&confirm).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("only draft orders") => {}
            _ => panic!("Expected InvariantViolation for double confirm"),
        }
    }

    #[test]
    fn cancellation_resets_credit_flags() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        let order_id = order.id_typed();
        add_line(&mut order, tenant_id, 100, 0);

        let flag = SalesOrderCommand::FlagOverCredit(FlagOverCredit {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        execute(&mut order, &flag).unwrap();

        let confirm = SalesOrderCommand::ConfirmOrder(ConfirmOrder {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        execute(&mut order, &confirm).unwrap();

        let mark = SalesOrderCommand::MarkCreditOverridden(MarkCreditOverridden {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        execute(&mut order, &mark).unwrap();
        assert!(order.over_credit());
        assert!(order.override_credit_limit());

        let cancel = SalesOrderCommand::CancelOrder(CancelOrder {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        execute(&mut order, &cancel).unwrap();

        assert_eq!(order.status(), SalesOrderStatus::Cancelled);
        assert!(!order.over_credit());
        assert!(!order.override_credit_limit());
    }

    #[test]
    fn cannot_cancel_twice() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        let order_id = order.id_typed();

        let cancel = SalesOrderCommand::CancelOrder(CancelOrder {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        execute(&mut order, &cancel).unwrap();

        let err = order.handle(&cancel).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict for double cancel"),
        }
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let tenant_id = test_tenant_id();
        let mut order = draft_order(tenant_id, test_order_id());
        add_line(&mut order, tenant_id, 100, 0);
        let before = order.clone();

        let confirm = SalesOrderCommand::ConfirmOrder(ConfirmOrder {
            tenant_id,
            order_id: order.id_typed(),
            occurred_at: test_time(),
        });
        let events1 = order.handle(&confirm).unwrap();
        let events2 = order.handle(&confirm).unwrap();

        assert_eq!(order, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn apply_is_deterministic() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let customer_id = test_customer_id();

        let created = SalesOrderEvent::OrderCreated(OrderCreated {
            tenant_id,
            order_id,
            customer_id,
            commercial_customer_id: customer_id,
            currency: "USD".to_string(),
            occurred_at: test_time(),
        });
        let line = SalesOrderEvent::LineAdded(LineAdded {
            tenant_id,
            order_id,
            line_no: 1,
            description: "Widget".to_string(),
            quantity: 2,
            unit_price: 100,
            tax: 20,
            is_downpayment: false,
            new_amount_untaxed: 200,
            new_amount_total: 220,
            occurred_at: test_time(),
        });
        let confirmed = SalesOrderEvent::OrderConfirmed(OrderConfirmed {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });

        let mut order1 = SalesOrder::empty(order_id);
        order1.apply(&created);
        order1.apply(&line);
        order1.apply(&confirmed);

        let mut order2 = SalesOrder::empty(order_id);
        order2.apply(&created);
        order2.apply(&line);
        order2.apply(&confirmed);

        assert_eq!(order1, order2);
        assert_eq!(order1.status(), SalesOrderStatus::Confirmed);
        assert_eq!(order1.amount_total(), 220);
    }
}
