use creditline_core::AggregateId;

/// A command targets a specific aggregate (command abstraction).
///
/// Commands represent **intent** - a request to perform an action on an aggregate.
/// They are **transient** (not persisted) and are transformed into events (which
/// are persisted). Commands are rejected if invalid; events represent accepted
/// changes.
///
/// Multi-tenancy is enforced at the **event level** (envelopes), not at the
/// command level. The tenant context is provided by the infrastructure layer and
/// attached to events during persistence.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
