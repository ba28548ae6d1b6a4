//! Tenant-isolated read model storage abstractions and the non-event-sourced
//! read models (billing reference data, mirrored payments).

pub mod billing_directory;
pub mod payments_ledger;
pub mod tenant_store;

pub use billing_directory::BillingDirectory;
pub use payments_ledger::PaymentsLedger;
pub use tenant_store::{InMemoryTenantStore, TenantStore};
