//! Directory of billing reference records (payment terms and methods).

use creditline_billing::{PaymentMethod, PaymentMethodId, PaymentTerm, PaymentTermId};
use creditline_core::TenantId;

use crate::read_model::TenantStore;
use crate::workflow::{PaymentMethodSource, PaymentTermSource};

/// Tenant-isolated lookup for payment terms and methods.
#[derive(Debug)]
pub struct BillingDirectory<T, M>
where
    T: TenantStore<PaymentTermId, PaymentTerm>,
    M: TenantStore<PaymentMethodId, PaymentMethod>,
{
    terms: T,
    methods: M,
}

impl<T, M> BillingDirectory<T, M>
where
    T: TenantStore<PaymentTermId, PaymentTerm>,
    M: TenantStore<PaymentMethodId, PaymentMethod>,
{
    pub fn new(terms: T, methods: M) -> Self {
        Self { terms, methods }
    }

    pub fn upsert_term(&self, tenant_id: TenantId, term: PaymentTerm) {
        self.terms.upsert(tenant_id, term.id, term);
    }

    pub fn upsert_method(&self, tenant_id: TenantId, method: PaymentMethod) {
        self.methods.upsert(tenant_id, method.id, method);
    }

    pub fn term(&self, tenant_id: TenantId, id: PaymentTermId) -> Option<PaymentTerm> {
        self.terms.get(tenant_id, &id)
    }

    pub fn method(&self, tenant_id: TenantId, id: PaymentMethodId) -> Option<PaymentMethod> {
        self.methods.get(tenant_id, &id)
    }
}

impl<T, M> PaymentTermSource for BillingDirectory<T, M>
where
    T: TenantStore<PaymentTermId, PaymentTerm>,
    M: TenantStore<PaymentMethodId, PaymentMethod>,
{
    fn term(&self, tenant_id: TenantId, id: PaymentTermId) -> Option<PaymentTerm> {
        BillingDirectory::term(self, tenant_id, id)
    }
}

impl<T, M> PaymentMethodSource for BillingDirectory<T, M>
where
    T: TenantStore<PaymentTermId, PaymentTerm>,
    M: TenantStore<PaymentMethodId, PaymentMethod>,
{
    fn method(&self, tenant_id: TenantId, id: PaymentMethodId) -> Option<PaymentMethod> {
        BillingDirectory::method(self, tenant_id, id)
    }
}
