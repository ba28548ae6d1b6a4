use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creditline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use creditline_events::Event;

/// Customer identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub AggregateId);

impl CustomerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Aggregate root: Customer.
///
/// Carries the credit standing consulted by the credit policy evaluator:
/// credit limit, credit hold, override threshold, overdue standing, and the
/// customer-level delivery-hold flag. A customer may belong to a commercial
/// (top-level) entity; credit amounts are tracked against that entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    tenant_id: Option<TenantId>,
    name: String,
    contact: ContactInfo,
    commercial_parent_id: Option<CustomerId>,
    credit_limit: u64,
    override_credit_threshold_limit: u64,
    credit_hold: bool,
    has_overdue_by_x_days: bool,
    hold_delivery_till_payment: bool,
    version: u64,
    created: bool,
}

impl Customer {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: CustomerId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            contact: ContactInfo::default(),
            commercial_parent_id: None,
            credit_limit: 0,
            override_credit_threshold_limit: 0,
            credit_hold: false,
            has_overdue_by_x_days: false,
            hold_delivery_till_payment: false,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn commercial_parent_id(&self) -> Option<CustomerId> {
        self.commercial_parent_id
    }

    /// The commercial (top-level) entity this customer transacts under.
    ///
    /// A customer without a commercial parent is its own commercial entity.
    pub fn commercial_entity_id(&self) -> CustomerId {
        self.commercial_parent_id.unwrap_or(self.id)
    }

    pub fn credit_limit(&self) -> u64 {
        self.credit_limit
    }

    pub fn override_credit_threshold_limit(&self) -> u64 {
        self.override_credit_threshold_limit
    }

    pub fn credit_hold(&self) -> bool {
        self.credit_hold
    }

    pub fn has_overdue_by_x_days(&self) -> bool {
        self.has_overdue_by_x_days
    }

    pub fn hold_delivery_till_payment(&self) -> bool {
        self.hold_delivery_till_payment
    }

    /// Invariant helper: whether orders for this customer may be confirmed
    /// without going through the credit-hold failure path.
    pub fn can_transact(&self) -> bool {
        !self.credit_hold
    }
}

impl AggregateRoot for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub name: String,
    pub contact: Option<ContactInfo>,
    /// Top-level commercial entity, if this customer is a child contact.
    pub commercial_parent_id: Option<CustomerId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetCreditPolicy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCreditPolicy {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    /// Credit limit in smallest currency unit. Zero disables the limit check
    /// unless the global prepayment test is enabled.
    pub credit_limit: u64,
    /// Orders up to this total may be force-confirmed despite a failed check.
    pub override_credit_threshold_limit: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PlaceCreditHold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCreditHold {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    /// Optional human-readable reason for the hold.
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReleaseCreditHold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCreditHold {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDeliveryHold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDeliveryHold {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub hold: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateOverdueStanding.
///
/// The overdue flag is derived by an external invoice-aging process; this
/// command records its latest verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOverdueStanding {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub has_overdue_by_x_days: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerCommand {
    RegisterCustomer(RegisterCustomer),
    SetCreditPolicy(SetCreditPolicy),
    PlaceCreditHold(PlaceCreditHold),
    ReleaseCreditHold(ReleaseCreditHold),
    SetDeliveryHold(SetDeliveryHold),
    UpdateOverdueStanding(UpdateOverdueStanding),
}

/// Event: CustomerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub commercial_parent_id: Option<CustomerId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CreditPolicySet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPolicySet {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub credit_limit: u64,
    pub override_credit_threshold_limit: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CreditHoldPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditHoldPlaced {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CreditHoldReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditHoldReleased {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DeliveryHoldSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryHoldSet {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub hold: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OverdueStandingUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueStandingUpdated {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub has_overdue_by_x_days: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerEvent {
    CustomerRegistered(CustomerRegistered),
    CreditPolicySet(CreditPolicySet),
    CreditHoldPlaced(CreditHoldPlaced),
    CreditHoldReleased(CreditHoldReleased),
    DeliveryHoldSet(DeliveryHoldSet),
    OverdueStandingUpdated(OverdueStandingUpdated),
}

impl Event for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered(_) => "customers.customer.registered",
            CustomerEvent::CreditPolicySet(_) => "customers.customer.credit_policy_set",
            CustomerEvent::CreditHoldPlaced(_) => "customers.customer.credit_hold_placed",
            CustomerEvent::CreditHoldReleased(_) => "customers.customer.credit_hold_released",
            CustomerEvent::DeliveryHoldSet(_) => "customers.customer.delivery_hold_set",
            CustomerEvent::OverdueStandingUpdated(_) => {
                "customers.customer.overdue_standing_updated"
            }
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerRegistered(e) => e.occurred_at,
            CustomerEvent::CreditPolicySet(e) => e.occurred_at,
            CustomerEvent::CreditHoldPlaced(e) => e.occurred_at,
            CustomerEvent::CreditHoldReleased(e) => e.occurred_at,
            CustomerEvent::DeliveryHoldSet(e) => e.occurred_at,
            CustomerEvent::OverdueStandingUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Customer {
    type Command = CustomerCommand;
    type Event = CustomerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CustomerEvent::CustomerRegistered(e) => {
                self.id = e.customer_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.commercial_parent_id = e.commercial_parent_id;
                self.created = true;
            }
            CustomerEvent::CreditPolicySet(e) => {
                self.credit_limit = e.credit_limit;
                self.override_credit_threshold_limit = e.override_credit_threshold_limit;
            }
            CustomerEvent::CreditHoldPlaced(_) => {
                self.credit_hold = true;
            }
            CustomerEvent::CreditHoldReleased(_) => {
                self.credit_hold = false;
            }
            CustomerEvent::DeliveryHoldSet(e) => {
                self.hold_delivery_till_payment = e.hold;
            }
            CustomerEvent::OverdueStandingUpdated(e) => {
                self.has_overdue_by_x_days = e.has_overdue_by_x_days;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CustomerCommand::RegisterCustomer(cmd) => self.handle_register(cmd),
            CustomerCommand::SetCreditPolicy(cmd) => self.handle_set_credit_policy(cmd),
            CustomerCommand::PlaceCreditHold(cmd) => self.handle_place_hold(cmd),
            CustomerCommand::ReleaseCreditHold(cmd) => self.handle_release_hold(cmd),
            CustomerCommand::SetDeliveryHold(cmd) => self.handle_set_delivery_hold(cmd),
            CustomerCommand::UpdateOverdueStanding(cmd) => self.handle_update_overdue(cmd),
        }
    }
}

impl Customer {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_customer_id(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        if self.id != customer_id {
            return Err(DomainError::invariant("customer_id mismatch"));
        }
        Ok(())
    }

    fn ensure_created(&self, tenant_id: TenantId, customer_id: CustomerId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_customer_id(customer_id)
    }

    fn handle_register(&self, cmd: &RegisterCustomer) -> Result<Vec<CustomerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("customer already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if cmd.commercial_parent_id == Some(cmd.customer_id) {
            return Err(DomainError::validation(
                "customer cannot be its own commercial parent",
            ));
        }

        let contact = cmd.contact.clone().unwrap_or_default();

        Ok(vec![CustomerEvent::CustomerRegistered(CustomerRegistered {
            tenant_id: cmd.tenant_id,
            customer_id: cmd.customer_id,
            name: cmd.name.clone(),
            contact,
            commercial_parent_id: cmd.commercial_parent_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_credit_policy(
        &self,
        cmd: &SetCreditPolicy,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.customer_id)?;

        Ok(vec![CustomerEvent::CreditPolicySet(CreditPolicySet {
            tenant_id: cmd.tenant_id,
            customer_id: cmd.customer_id,
            credit_limit: cmd.credit_limit,
            override_credit_threshold_limit: cmd.override_credit_threshold_limit,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_place_hold(&self, cmd: &PlaceCreditHold) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.customer_id)?;

        if self.credit_hold {
            return Err(DomainError::conflict("customer is already on credit hold"));
        }

        Ok(vec![CustomerEvent::CreditHoldPlaced(CreditHoldPlaced {
            tenant_id: cmd.tenant_id,
            customer_id: cmd.customer_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_release_hold(
        &self,
        cmd: &ReleaseCreditHold,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.customer_id)?;

        if !self.credit_hold {
            return Err(DomainError::conflict("customer is not on credit hold"));
        }

        Ok(vec![CustomerEvent::CreditHoldReleased(CreditHoldReleased {
            tenant_id: cmd.tenant_id,
            customer_id: cmd.customer_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_delivery_hold(
        &self,
        cmd: &SetDeliveryHold,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.customer_id)?;

        // Idempotent: setting the flag to its current value emits nothing.
        if self.hold_delivery_till_payment == cmd.hold {
            return Ok(vec![]);
        }

        Ok(vec![CustomerEvent::DeliveryHoldSet(DeliveryHoldSet {
            tenant_id: cmd.tenant_id,
            customer_id: cmd.customer_id,
            hold: cmd.hold,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_overdue(
        &self,
        cmd: &UpdateOverdueStanding,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.customer_id)?;

        if self.has_overdue_by_x_days == cmd.has_overdue_by_x_days {
            return Ok(vec![]);
        }

        Ok(vec![CustomerEvent::OverdueStandingUpdated(
            OverdueStandingUpdated {
                tenant_id: cmd.tenant_id,
                customer_id: cmd.customer_id,
                has_overdue_by_x_days: cmd.has_overdue_by_x_days,
                occurred_at: cmd.occurred_at,
            },
        )])
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

    fn test_customer_id() -> CustomerId {
        CustomerId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn registered_customer(tenant_id: TenantId, customer_id: CustomerId) -> Customer {
        let mut customer = Customer::empty(customer_id);
        let cmd = CustomerCommand::RegisterCustomer(RegisterCustomer {
            tenant_id,
            customer_id,
            name: "Test Customer".to_string(),
            contact: None,
            commercial_parent_id: None,
            occurred_at: test_time(),
        });
        execute(&mut customer, &cmd).unwrap();
        customer
    }

    #[test]
    fn register_customer_emits_registered_event() {
        let customer = Customer::empty(test_customer_id());
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let parent_id = test_customer_id();
        let cmd = RegisterCustomer {
            tenant_id,
            customer_id,
            name: "Child Contact".to_string(),
            contact: Some(ContactInfo {
                email: Some("ap@example.com".to_string()),
                phone: None,
                address: None,
            }),
            commercial_parent_id: Some(parent_id),
            occurred_at: test_time(),
        };

        let events = customer
            .handle(&CustomerCommand::RegisterCustomer(cmd))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            CustomerEvent::CustomerRegistered(e) => {
                assert_eq!(e.tenant_id, tenant_id);
                assert_eq!(e.customer_id, customer_id);
                assert_eq!(e.commercial_parent_id, Some(parent_id));
            }
            _ => panic!("Expected CustomerRegistered event"),
        }
    }

    #[test]
    fn register_customer_rejects_empty_name() {
        let customer = Customer::empty(test_customer_id());
        let cmd = RegisterCustomer {
            tenant_id: test_tenant_id(),
            customer_id: test_customer_id(),
            name: "   ".to_string(),
            contact: None,
            commercial_parent_id: None,
            occurred_at: test_time(),
        };

        let err = customer
            .handle(&CustomerCommand::RegisterCustomer(cmd))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn register_customer_rejects_self_parent() {
        let customer = Customer::empty(test_customer_id());
        let customer_id = test_customer_id();
        let cmd = RegisterCustomer {
            tenant_id: test_tenant_id(),
            customer_id,
            name: "Loop".to_string(),
            contact: None,
            commercial_parent_id: Some(customer_id),
            occurred_at: test_time(),
        };

        let err = customer
            .handle(&CustomerCommand::RegisterCustomer(cmd))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for self parent"),
        }
    }

    #[test]
    fn commercial_entity_falls_back_to_self() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let customer = registered_customer(tenant_id, customer_id);
        assert_eq!(customer.commercial_entity_id(), customer_id);
    }

    #[test]
    fn credit_policy_set_updates_limits() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let mut customer = registered_customer(tenant_id, customer_id);

        let cmd = CustomerCommand::SetCreditPolicy(SetCreditPolicy {
            tenant_id,
            customer_id,
            credit_limit: 100_000,
            override_credit_threshold_limit: 150_000,
            occurred_at: test_time(),
        });
        execute(&mut customer, &cmd).unwrap();

        assert_eq!(customer.credit_limit(), 100_000);
        assert_eq!(customer.override_credit_threshold_limit(), 150_000);
    }

    #[test]
    fn place_and_release_credit_hold() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let mut customer = registered_customer(tenant_id, customer_id);
        assert!(customer.can_transact());

        let place = CustomerCommand::PlaceCreditHold(PlaceCreditHold {
            tenant_id,
            customer_id,
            reason: Some("Aged receivables".to_string()),
            occurred_at: test_time(),
        });
        execute(&mut customer, &place).unwrap();
        assert!(customer.credit_hold());
        assert!(!customer.can_transact());

        // Placing again conflicts.
        let err = customer.handle(&place).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict for double hold"),
        }

        let release = CustomerCommand::ReleaseCreditHold(ReleaseCreditHold {
            tenant_id,
            customer_id,
            occurred_at: test_time(),
        });
        execute(&mut customer, &release).unwrap();
        assert!(!customer.credit_hold());
        assert!(customer.can_transact());
    }

    #[test]
    fn release_without_hold_conflicts() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let customer = registered_customer(tenant_id, customer_id);

        let release = CustomerCommand::ReleaseCreditHold(ReleaseCreditHold {
            tenant_id,
            customer_id,
            occurred_at: test_time(),
        });
        let err = customer.handle(&release).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict for releasing without a hold"),
        }
    }

    #[test]
    fn delivery_hold_set_is_idempotent() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let mut customer = registered_customer(tenant_id, customer_id);

        let set_false = CustomerCommand::SetDeliveryHold(SetDeliveryHold {
            tenant_id,
            customer_id,
            hold: false,
            occurred_at: test_time(),
        });
        // Already false: no event.
        assert!(customer.handle(&set_false).unwrap().is_empty());

        let set_true = CustomerCommand::SetDeliveryHold(SetDeliveryHold {
            tenant_id,
            customer_id,
            hold: true,
            occurred_at: test_time(),
        });
        let events = execute(&mut customer, &set_true).unwrap();
        assert_eq!(events.len(), 1);
        assert!(customer.hold_delivery_till_payment());
    }

    #[test]
    fn overdue_standing_updates_flag() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let mut customer = registered_customer(tenant_id, customer_id);
        assert!(!customer.has_overdue_by_x_days());

        let cmd = CustomerCommand::UpdateOverdueStanding(UpdateOverdueStanding {
            tenant_id,
            customer_id,
            has_overdue_by_x_days: true,
            occurred_at: test_time(),
        });
        execute(&mut customer, &cmd).unwrap();
        assert!(customer.has_overdue_by_x_days());

        // Same value again: no event.
        assert!(customer.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn commands_against_unregistered_customer_fail() {
        let customer = Customer::empty(test_customer_id());
        let cmd = CustomerCommand::PlaceCreditHold(PlaceCreditHold {
            tenant_id: test_tenant_id(),
            customer_id: test_customer_id(),
            reason: None,
            occurred_at: test_time(),
        });

        let err = customer.handle(&cmd).unwrap_err();
        match err {
            DomainError::NotFound => {}
            _ => panic!("Expected NotFound for unregistered customer"),
        }
    }

    #[test]
    fn version_increments_on_apply() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let mut customer = registered_customer(tenant_id, customer_id);
        assert_eq!(customer.version(), 1);

        let cmd = CustomerCommand::SetCreditPolicy(SetCreditPolicy {
            tenant_id,
            customer_id,
            credit_limit: 1,
            override_credit_threshold_limit: 1,
            occurred_at: test_time(),
        });
        execute(&mut customer, &cmd).unwrap();
        assert_eq!(customer.version(), 2);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let tenant_id = test_tenant_id();
        let customer_id = test_customer_id();
        let customer = registered_customer(tenant_id, customer_id);
        let before = customer.clone();

        let cmd = CustomerCommand::PlaceCreditHold(PlaceCreditHold {
            tenant_id,
            customer_id,
            reason: None,
            occurred_at: test_time(),
        });
        let events1 = customer.handle(&cmd).unwrap();
        let events2 = customer.handle(&cmd).unwrap();

        assert_eq!(customer, before);
        assert_eq!(events1, events2);
    }
}
