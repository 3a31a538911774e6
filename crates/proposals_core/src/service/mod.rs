//! Proposal use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and policy checks into request-level
//!   operations.
//! - Keep callers decoupled from storage details; they see outcomes,
//!   redirects and flashes only.

pub mod outcome;
pub mod proposal_service;
mod speakers;
pub mod store;

pub use outcome::{Flash, FlashKind, Outcome, ProposalForm, Redirect, Redirection, ServiceError};
pub use proposal_service::{
    parse_proposal_id, AssignmentStatus, ProposalInput, ProposalListing, ProposalService,
    ProposalView, Rendered, ServiceResult, SessionListing, SubmitMode,
};
pub use store::{ProposalStore, SqliteStore};
