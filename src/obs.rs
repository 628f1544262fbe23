//! Optional observability helpers for the authorize flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `authly_authorize.flow` with the `flow`
//!   (operation) and `stage` (call site) fields, plus a debug event for every state transition.
//! - Enable `metrics` to increment the `authly_authorize_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `authly_authorize_transition_total` counter labeled by `from` + `to`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, flows::FlowState};

/// Reports a state-machine transition to every enabled backend.
pub fn record_transition(from: FlowState, to: FlowState) {
	trace_transition(from, to);
	count_transition(from, to);
}

/// Orchestrator operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Initial authentication check on entry.
	Authenticate,
	/// Local plus backend validation of the authorize request.
	ValidateRequest,
	/// Login form submission.
	Login,
	/// Registration form submission.
	Register,
	/// Consent confirmation.
	Confirm,
	/// Consent denial.
	Deny,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authenticate => "authenticate",
			FlowKind::ValidateRequest => "validate_request",
			FlowKind::Login => "login",
			FlowKind::Register => "register",
			FlowKind::Confirm => "confirm",
			FlowKind::Deny => "deny",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an orchestrator operation.
	Attempt,
	/// The operation moved the flow forward.
	Success,
	/// The operation was rejected, failed, or returned an error.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
