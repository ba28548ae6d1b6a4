//! View-action descriptors handed back to the host UI layer.
//!
//! Rendering is out of scope; these are plain serializable payloads following
//! the host's action-dictionary contract (camelCase keys).

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use creditline_billing::PaymentMethodId;
use creditline_customers::CustomerId;
use creditline_orders::SalesOrderId;

/// Modal shown when a credit check blocks confirmation.
pub const CREDIT_LIMIT_WARNING_MODEL: &str = "partner.credit.limit.warning";

/// List view backing the order's open-payments smart button.
pub const PAYMENTS_MODEL: &str = "account.payment";

/// Filter term of a view action: `(field, operator, value)`.
pub type DomainTerm = (String, String, JsonValue);

/// A window action descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewAction {
    pub name: String,
    pub res_model: String,
    pub view_mode: String,
    pub target: String,
    #[serde(skip_serializing_if = "JsonValue::is_null", default)]
    pub context: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub domain: Option<Vec<DomainTerm>>,
}

/// Non-blocking banner payload returned by the change-triggered pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningBanner {
    pub title: String,
    pub message: String,
}

/// Build the blocking warning dialog carrying a credit-check failure message.
pub fn credit_limit_warning(message: impl Into<String>) -> ViewAction {
    ViewAction {
        name: "Warning".to_string(),
        res_model: CREDIT_LIMIT_WARNING_MODEL.to_string(),
        view_mode: "form".to_string(),
        target: "new".to_string(),
        context: json!({ "defaultMessage": message.into() }),
        domain: None,
    }
}

/// Build the non-blocking pre-check banner.
pub fn credit_warning_banner(message: impl Into<String>) -> WarningBanner {
    WarningBanner {
        title: "Warning!".to_string(),
        message: message.into(),
    }
}

/// Inputs for the open-payments list action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPaymentsRequest {
    pub customer_id: CustomerId,
    pub commercial_customer_id: CustomerId,
    pub journal_id: Option<PaymentMethodId>,
    pub amount_total: u64,
    pub order_ids: Vec<SalesOrderId>,
}

/// Build the payments list action: filtered to the commercial entity's open
/// payments, pre-populated with inbound-payment defaults for this order.
pub fn open_payments_action(req: &OpenPaymentsRequest) -> ViewAction {
    let domain = vec![
        (
            "partner_id".to_string(),
            "child_of".to_string(),
            json!(req.commercial_customer_id),
        ),
        (
            "state".to_string(),
            "in".to_string(),
            json!(["draft", "posted"]),
        ),
        ("is_reconciled".to_string(), "=".to_string(), json!(false)),
    ];

    ViewAction {
        name: "Payments".to_string(),
        res_model: PAYMENTS_MODEL.to_string(),
        view_mode: "list,form".to_string(),
        target: "current".to_string(),
        context: json!({
            "defaultPaymentType": "inbound",
            "defaultPartnerId": req.customer_id,
            "defaultJournalId": req.journal_id,
            "defaultAmount": req.amount_total,
            "saleIds": req.order_ids,
        }),
        domain: Some(domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditline_core::AggregateId;

    #[test]
    fn warning_action_follows_host_contract() {
        let action = credit_limit_warning("Credit Hold!\nThis Account is on hold");
        let value = serde_json::to_value(&action).unwrap();

        assert_eq!(value["resModel"], "partner.credit.limit.warning");
        assert_eq!(value["viewMode"], "form");
        assert_eq!(value["target"], "new");
        assert_eq!(
            value["context"]["defaultMessage"],
            "Credit Hold!\nThis Account is on hold"
        );
        assert!(value.get("domain").is_none());
    }

    #[test]
    fn banner_carries_title_and_message() {
        let banner = credit_warning_banner("Overdue Invoices! Acme has overdue invoices.");
        assert_eq!(banner.title, "Warning!");
        assert!(banner.message.starts_with("Overdue Invoices!"));
    }

    #[test]
    fn payments_action_filters_open_payments_of_commercial_entity() {
        let commercial = CustomerId::new(AggregateId::new());
        let customer = CustomerId::new(AggregateId::new());
        let order_id = SalesOrderId::new(AggregateId::new());

        let action = open_payments_action(&OpenPaymentsRequest {
            customer_id: customer,
            commercial_customer_id: commercial,
            journal_id: None,
            amount_total: 130_000,
            order_ids: vec![order_id],
        });

        assert_eq!(action.res_model, PAYMENTS_MODEL);
        let domain = action.domain.as_ref().unwrap();
        assert_eq!(domain.len(), 3);
        assert_eq!(domain[0].0, "partner_id");
        assert_eq!(domain[0].1, "child_of");
        assert_eq!(domain[1].1, "in");
        assert_eq!(domain[2], ("is_reconciled".to_string(), "=".to_string(), json!(false)));

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["context"]["defaultPaymentType"], "inbound");
        assert_eq!(value["context"]["defaultAmount"], 130_000);
    }
}
