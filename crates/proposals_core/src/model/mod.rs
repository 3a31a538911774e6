//! Domain model for events, proposals and their speakers.
//!
//! # Responsibility
//! - Define canonical data structures used by policy and service code.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Proposals are hard-deleted only through an authorized destroy.

pub mod event;
pub mod proposal;
pub mod user;
