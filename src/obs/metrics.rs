// self
use crate::{
	flows::FlowState,
	obs::{FlowKind, FlowOutcome},
};

/// Counter incremented once per attempt, success, or failure of an orchestrator operation.
pub const FLOW_COUNTER: &str = "authly_authorize_flow_total";
/// Counter incremented for every state-machine transition.
pub const TRANSITION_COUNTER: &str = "authly_authorize_transition_total";

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts one `from` → `to` transition, labeled with both state names.
pub(crate) fn count_transition(from: FlowState, to: FlowState) {
	#[cfg(feature = "metrics")]
	metrics::counter!(TRANSITION_COUNTER, "from" => from.as_str(), "to" => to.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (from, to);
}
