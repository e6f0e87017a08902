#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Core domain models for the payout engine.
///
/// The models in this module are primarily data structures with minimal
/// business logic, keeping domain entities separate from their persistence
/// and processing implementations.
pub mod models;

/// The pure per-line commission calculation.
pub mod calc;

/// Interface traits ("ports") a storage backend implements.
///
/// These traits define the contract between the domain logic and the
/// persistent store without specifying implementation details, so that the
/// backend can be swapped without touching the calculation engine.
pub mod ports;
