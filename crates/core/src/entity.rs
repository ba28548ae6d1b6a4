//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Reference records that are not event-sourced (payment terms, payment
/// methods, payments mirrored from the reconciliation subsystem) implement
/// this directly.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
