use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creditline_billing::PaymentId;
use creditline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use creditline_customers::CustomerId;
use creditline_events::Event;
use creditline_orders::SalesOrderId;

/// Invoice identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice classification, derived at issue time from the order lines being
/// invoiced: a down-payment invoice bills only down-payment lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Regular,
    DownPayment,
}

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Open,
    Paid,
    Void,
}

/// Reconciliation state of the invoice, derived from allocated partials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoicePaymentState {
    NotPaid,
    InPayment,
    Paid,
}

/// Invoice line derived from a sales order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub order_line_no: u32,
    pub description: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// A partial allocation of a payment against this invoice, as produced by the
/// external reconciliation subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledPartial {
    pub payment_id: PaymentId,
    pub allocated_amount: u64,
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    tenant_id: Option<TenantId>,
    order_id: Option<SalesOrderId>,
    /// Commercial customer the receivable is booked against.
    customer_id: Option<CustomerId>,
    kind: InvoiceKind,
    status: InvoiceStatus,
    payment_state: InvoicePaymentState,
    lines: Vec<InvoiceLine>,
    partials: Vec<ReconciledPartial>,
    due_date: Option<DateTime<Utc>>,
    total_amount: u64,
    total_paid: u64,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            tenant_id: None,
            order_id: None,
            customer_id: None,
            kind: InvoiceKind::Regular,
            status: InvoiceStatus::Open,
            payment_state: InvoicePaymentState::NotPaid,
            lines: Vec::new(),
            partials: Vec::new(),
            due_date: None,
            total_amount: 0,
            total_paid: 0,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn order_id(&self) -> Option<SalesOrderId> {
        self.order_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn payment_state(&self) -> InvoicePaymentState {
        self.payment_state
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn partials(&self) -> &[ReconciledPartial] {
        &self.partials
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn total_paid(&self) -> u64 {
        self.total_paid
    }

    pub fn outstanding_amount(&self) -> u64 {
        self.total_amount.saturating_sub(self.total_paid)
    }

    /// Invariant: cannot reconcile against a void or fully allocated invoice.
    pub fn can_accept_payment(&self) -> bool {
        self.status != InvoiceStatus::Void && self.outstanding_amount() > 0
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IssueInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInvoice {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub kind: InvoiceKind,
    pub lines: Vec<InvoiceLine>,
    pub due_date: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReconcilePayment.
///
/// Records one partial allocation reported by the reconciliation subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePayment {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub payment_id: PaymentId,
    /// Allocated amount in smallest currency unit.
    pub allocated_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: VoidInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidInvoice {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    IssueInvoice(IssueInvoice),
    ReconcilePayment(ReconcilePayment),
    VoidInvoice(VoidInvoice),
}

/// Event: InvoiceIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceIssued {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub order_id: SalesOrderId,
    pub customer_id: CustomerId,
    pub kind: InvoiceKind,
    pub lines: Vec<InvoiceLine>,
    pub due_date: DateTime<Utc>,
    pub total_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentReconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReconciled {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub payment_id: PaymentId,
    pub allocated_amount: u64,
    pub new_total_paid: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceVoided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceVoided {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceIssued(InvoiceIssued),
    PaymentReconciled(PaymentReconciled),
    InvoiceVoided(InvoiceVoided),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceIssued(_) => "invoicing.invoice.issued",
            InvoiceEvent::PaymentReconciled(_) => "invoicing.invoice.payment_reconciled",
            InvoiceEvent::InvoiceVoided(_) => "invoicing.invoice.voided",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceIssued(e) => e.occurred_at,
            InvoiceEvent::PaymentReconciled(e) => e.occurred_at,
            InvoiceEvent::InvoiceVoided(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceIssued(e) => {
                self.id = e.invoice_id;
                self.tenant_id = Some(e.tenant_id);
                self.order_id = Some(e.order_id);
                self.customer_id = Some(e.customer_id);
                self.kind = e.kind;
                self.lines = e.lines.clone();
                self.due_date = Some(e.due_date);
                self.total_amount = e.total_amount;
                self.total_paid = 0;
                self.status = InvoiceStatus::Open;
                self.payment_state = InvoicePaymentState::NotPaid;
                self.created = true;
            }
            InvoiceEvent::PaymentReconciled(e) => {
                self.partials.push(ReconciledPartial {
                    payment_id: e.payment_id,
                    allocated_amount: e.allocated_amount,
                });
                self.total_paid = e.new_total_paid;
                if self.total_paid >= self.total_amount {
                    self.status = InvoiceStatus::Paid;
                    self.payment_state = InvoicePaymentState::Paid;
                } else if self.total_paid > 0 {
                    self.payment_state = InvoicePaymentState::InPayment;
                }
            }
            InvoiceEvent::InvoiceVoided(_) => {
                self.status = InvoiceStatus::Void;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::IssueInvoice(cmd) => self.handle_issue(cmd),
            InvoiceCommand::ReconcilePayment(cmd) => self.handle_reconcile(cmd),
            InvoiceCommand::VoidInvoice(cmd) => self.handle_void(cmd),
        }
    }
}

impl Invoice {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn handle_issue(&self, cmd: &IssueInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }

        if cmd.lines.is_empty() {
            return Err(DomainError::validation("cannot issue invoice without lines"));
        }

        let mut total: u64 = 0;
        for line in &cmd.lines {
            if line.quantity <= 0 {
                return Err(DomainError::validation(
                    "invoice line quantity must be positive",
                ));
            }
            if line.unit_price == 0 {
                return Err(DomainError::validation(
                    "invoice line unit_price must be positive",
                ));
            }
            let line_total = (line.quantity as i128)
                .checked_mul(line.unit_price as i128)
                .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;
            if line_total <= 0 || line_total > u64::MAX as i128 {
                return Err(DomainError::invariant("invoice line amount overflow"));
            }
            total = total
                .checked_add(line_total as u64)
                .ok_or_else(|| DomainError::invariant("invoice total overflow"))?;
        }

        Ok(vec![InvoiceEvent::InvoiceIssued(InvoiceIssued {
            tenant_id: cmd.tenant_id,
            invoice_id: cmd.invoice_id,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            kind: cmd.kind,
            lines: cmd.lines.clone(),
            due_date: cmd.due_date,
            total_amount: total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reconcile(&self, cmd: &ReconcilePayment) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        if !self.can_accept_payment() {
            return Err(DomainError::invariant(
                "cannot reconcile against a void or fully paid invoice",
            ));
        }

        if cmd.allocated_amount == 0 {
            return Err(DomainError::validation("allocated amount must be positive"));
        }

        let new_total_paid = self
            .total_paid
            .checked_add(cmd.allocated_amount)
            .ok_or_else(|| DomainError::invariant("reconciled total overflow"))?;

        if new_total_paid > self.total_amount {
            return Err(DomainError::invariant(
                "cannot allocate more than the invoice total",
            ));
        }

        Ok(vec![InvoiceEvent::PaymentReconciled(PaymentReconciled {
            tenant_id: cmd.tenant_id,
            invoice_id: cmd.invoice_id,
            payment_id: cmd.payment_id,
            allocated_amount: cmd.allocated_amount,
            new_total_paid,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_void(&self, cmd: &VoidInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_invoice_id(cmd.invoice_id)?;

        if self.status == InvoiceStatus::Void {
            return Err(DomainError::conflict("invoice is already void"));
        }

        Ok(vec![InvoiceEvent::InvoiceVoided(InvoiceVoided {
            tenant_id: cmd.tenant_id,
            invoice_id: cmd.invoice_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
