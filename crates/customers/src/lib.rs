//! Customers domain module (event-sourced).
//!
//! This crate contains business rules for customers and their credit standing,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod customer;

pub use customer::{
    ContactInfo, CreditHoldPlaced, CreditHoldReleased, CreditPolicySet, Customer,
    CustomerCommand, CustomerEvent, CustomerId, CustomerRegistered, DeliveryHoldSet,
    OverdueStandingUpdated, PlaceCreditHold, RegisterCustomer, ReleaseCreditHold,
    SetCreditPolicy, SetDeliveryHold, UpdateOverdueStanding,
};
