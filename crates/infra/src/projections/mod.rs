//! Projection implementations (read model builders).
//!
//! Projections consume domain events and build query-optimized read models.
//! All projections are:
//! - **Rebuildable**: Can be reconstructed from the event stream
//! - **Tenant-isolated**: Data is partitioned by tenant
//! - **Idempotent**: Safe for at-least-once delivery

pub mod credit_exposure;
pub mod cursor_store;
pub mod order_invoices;

pub use credit_exposure::{
    CreditExposureProjection, CreditExposureProjectionError, CustomerCreditExposure,
};
pub use cursor_store::{InMemoryCursorStore, PostgresCursorStore, ProjectionCursorStore};
pub use order_invoices::{InvoiceRecord, OrderInvoicesProjection, OrderInvoicesProjectionError};
