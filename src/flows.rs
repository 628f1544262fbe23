//! Flow orchestrator driving authenticate → login → validate → confirm.
//!
//! [`AuthorizeFlow`] owns the session-scoped [`AuthenticationState`] and a [`FlowState`]
//! machine. Each operation checks the current state, moves into a transitional state while its
//! network call is in flight, and settles into the next stable state before returning a
//! [`FlowStep`] telling the page what to do next. A second call while a transition is in
//! flight is refused with [`Error::Busy`].

pub mod authorize;
pub mod login;

pub use authorize::*;
pub use login::*;

// self
use crate::{
	_prelude::*,
	api::{ApiClient, AuthorizationDetails, FieldErrors, UserId},
	config::FlowConfig,
	error::ConfigError,
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome},
	oidc::ValidatedAuthorizationParams,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Generic message shown when the backend could not be reached.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Orchestrator specialized for the bundled reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestAuthorizeFlow = AuthorizeFlow<ReqwestTransport>;

/// States of the authorize flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
	/// Nothing has happened yet.
	Idle,
	/// The authentication check is in flight.
	CheckingAuth,
	/// The user has a session.
	Authenticated,
	/// The user must sign in first.
	Unauthenticated,
	/// A login submission is in flight.
	LoggingIn,
	/// The backend refused the credentials.
	LoginFailed,
	/// A registration submission is in flight.
	Registering,
	/// The backend refused the registration.
	RegistrationFailed,
	/// Authorize request validation is in flight.
	ValidatingRequest,
	/// The consent prompt is showing.
	AwaitingConfirmation,
	/// The authorize request was rejected.
	RequestInvalid,
	/// Consent confirmation is in flight.
	Confirming,
	/// The user agent is leaving for the client application.
	Redirecting,
	/// Confirmation failed.
	ConfirmFailed,
}
impl FlowState {
	/// Returns a stable label suitable for errors and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowState::Idle => "idle",
			FlowState::CheckingAuth => "checking_auth",
			FlowState::Authenticated => "authenticated",
			FlowState::Unauthenticated => "unauthenticated",
			FlowState::LoggingIn => "logging_in",
			FlowState::LoginFailed => "login_failed",
			FlowState::Registering => "registering",
			FlowState::RegistrationFailed => "registration_failed",
			FlowState::ValidatingRequest => "validating_request",
			FlowState::AwaitingConfirmation => "awaiting_confirmation",
			FlowState::RequestInvalid => "request_invalid",
			FlowState::Confirming => "confirming",
			FlowState::Redirecting => "redirecting",
			FlowState::ConfirmFailed => "confirm_failed",
		}
	}

	/// Returns true while a network call is in flight.
	pub const fn is_transitional(self) -> bool {
		matches!(
			self,
			FlowState::CheckingAuth
				| FlowState::LoggingIn
				| FlowState::Registering
				| FlowState::ValidatingRequest
				| FlowState::Confirming
		)
	}
}
impl Display for FlowState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Session-scoped authentication verdict.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum AuthenticationState {
	/// No check has run yet.
	#[default]
	Unknown,
	/// A check is in flight.
	Checking,
	/// The session belongs to this user.
	Authenticated(UserId),
	/// No valid session.
	Unauthenticated,
}

/// Where the page should go next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Navigation {
	/// In-app route change (path plus query).
	Route(String),
	/// Full-page navigation to an absolute URL.
	Document(String),
}

/// Everything the consent prompt needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentPrompt {
	/// Validated request being approved.
	pub params: ValidatedAuthorizationParams,
	/// Client details returned by the backend.
	pub details: AuthorizationDetails,
	/// Signed-in user, when known.
	pub user: Option<UserId>,
}

/// In-app error to display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rejection {
	/// Machine-readable code, absent for transport failures.
	pub error: Option<String>,
	/// Message for the user.
	pub message: String,
}
impl Rejection {
	/// Creates a rejection.
	pub fn new(error: Option<String>, message: impl Into<String>) -> Self {
		Self { error, message: message.into() }
	}

	/// Rejection used when the transport failed.
	pub fn transport() -> Self {
		Self::new(None, GENERIC_ERROR_MESSAGE)
	}
}

/// What the page should do after an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FlowStep {
	/// Signed in with nothing further to authorize.
	Authenticated,
	/// Navigate away.
	Navigate(Navigation),
	/// Show the consent prompt.
	Consent(Box<ConsentPrompt>),
	/// Show an error in-app.
	Rejected(Rejection),
	/// Highlight invalid form fields; nothing was sent.
	InvalidForm(FieldErrors),
}
impl FlowStep {
	fn outcome(&self) -> FlowOutcome {
		match self {
			FlowStep::Rejected(_) | FlowStep::InvalidForm(_) => FlowOutcome::Failure,
			_ => FlowOutcome::Success,
		}
	}
}

#[derive(Clone, Debug)]
struct PendingAuthorization {
	params: ValidatedAuthorizationParams,
}

/// Orchestrates one authorize session.
pub struct AuthorizeFlow<T>
where
	T: ?Sized + ApiTransport,
{
	api: ApiClient<T>,
	config: FlowConfig,
	state: Mutex<FlowState>,
	authentication: Mutex<AuthenticationState>,
	pending: Mutex<Option<PendingAuthorization>>,
}
impl<T> AuthorizeFlow<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an idle flow after validating `config`.
	pub fn new(api: ApiClient<T>, config: FlowConfig) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		Ok(Self {
			api,
			config,
			state: Mutex::new(FlowState::Idle),
			authentication: Mutex::new(AuthenticationState::Unknown),
			pending: Mutex::new(None),
		})
	}

	/// Backend client.
	pub fn api(&self) -> &ApiClient<T> {
		&self.api
	}

	/// Page configuration.
	pub fn config(&self) -> &FlowConfig {
		&self.config
	}

	/// Current state.
	pub fn state(&self) -> FlowState {
		*self.state.lock()
	}

	/// Current authentication verdict.
	pub fn authentication(&self) -> AuthenticationState {
		self.authentication.lock().clone()
	}

	/// Moves from one of `accepted` into `next`.
	///
	/// The returned [`Transition`] must be settled; dropping it unsettled (a cancelled future)
	/// rolls the flow back so later calls are not refused forever.
	fn begin(
		&self,
		action: &'static str,
		accepted: &[FlowState],
		next: FlowState,
	) -> Result<Transition<'_, T>> {
		let mut state = self.state.lock();
		let current = *state;

		if current.is_transitional() {
			return Err(Error::Busy { state: current });
		}
		if !accepted.contains(&current) {
			return Err(Error::InvalidTransition { state: current, action });
		}

		*state = next;

		obs::record_transition(current, next);

		Ok(Transition { flow: self, previous: current, armed: true })
	}

	fn settle(&self, next: FlowState) {
		let mut state = self.state.lock();
		let current = std::mem::replace(&mut *state, next);

		obs::record_transition(current, next);
	}

	fn set_authentication(&self, authentication: AuthenticationState) {
		*self.authentication.lock() = authentication;
	}

	/// Signed-in user, if the last check or submission established one.
	pub fn authenticated_user(&self) -> Option<UserId> {
		match &*self.authentication.lock() {
			AuthenticationState::Authenticated(id) => Some(id.clone()),
			_ => None,
		}
	}
}
impl<T> Debug for AuthorizeFlow<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizeFlow")
			.field("config", &self.config)
			.field("state", &self.state())
			.field("authentication", &self.authentication())
			.finish_non_exhaustive()
	}
}

/// In-flight transition started by [`AuthorizeFlow::begin`].
///
/// Dropped unsettled, it restores the state the flow was in before. An interrupted
/// authentication check resets to [`FlowState::Idle`] with an unknown verdict instead.
struct Transition<'a, T>
where
	T: ?Sized + ApiTransport,
{
	flow: &'a AuthorizeFlow<T>,
	previous: FlowState,
	armed: bool,
}
impl<T> Transition<'_, T>
where
	T: ?Sized + ApiTransport,
{
	fn previous(&self) -> FlowState {
		self.previous
	}

	fn settle(mut self, next: FlowState) {
		self.armed = false;
		self.flow.settle(next);
	}
}
impl<T> Drop for Transition<'_, T>
where
	T: ?Sized + ApiTransport,
{
	fn drop(&mut self) {
		if !self.armed {
			return;
		}

		let checking = {
			let mut authentication = self.flow.authentication.lock();
			let checking = *authentication == AuthenticationState::Checking;

			if checking {
				*authentication = AuthenticationState::Unknown;
			}

			checking
		};

		self.flow.settle(if checking { FlowState::Idle } else { self.previous });
	}
}

/// Records the final outcome of an operation.
fn record_result(kind: FlowKind, result: &Result<FlowStep>) {
	let outcome = match result {
		Ok(step) => step.outcome(),
		Err(_) => FlowOutcome::Failure,
	};

	obs::record_flow_outcome(kind, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transitional_states_are_the_in_flight_ones() {
		let transitional = [
			FlowState::CheckingAuth,
			FlowState::LoggingIn,
			FlowState::Registering,
			FlowState::ValidatingRequest,
			FlowState::Confirming,
		];

		for state in transitional {
			assert!(state.is_transitional(), "{state} should be transitional.");
		}

		assert!(!FlowState::AwaitingConfirmation.is_transitional());
		assert!(!FlowState::LoginFailed.is_transitional());
	}

	#[test]
	fn rejections_count_as_failures() {
		assert_eq!(FlowStep::Rejected(Rejection::transport()).outcome(), FlowOutcome::Failure);
		assert_eq!(FlowStep::Authenticated.outcome(), FlowOutcome::Success);
		assert_eq!(Rejection::transport().message, "An error occurred");
	}
}
