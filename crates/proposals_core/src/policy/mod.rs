//! Proposal lifecycle and visibility policy.
//!
//! # Responsibility
//! - Decide legal status transitions before any mutation.
//! - Decide who may edit/delete/confirm/decline a proposal.
//! - Decide what is visible and which fields are exported per viewer.
//!
//! # Invariants
//! - Every check is a pure function of its inputs; no hidden global state.
//! - Event switches arrive as one immutable `EventPolicy` value.

pub mod access;
pub mod fields;
pub mod transition;
pub mod visibility;
