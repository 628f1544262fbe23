//! Login and registration page operations.
//!
//! Both pages may carry an `oidc_params` blob from the authorize page. After a successful
//! submission the blob is decoded and replayed as a full-page navigation to the authorize page,
//! which re-runs its own authentication check against the fresh session.

// self
use crate::{
	_prelude::*,
	api::{ApiFailure, LoginForm, RegisterForm, UserId},
	flows::{
		AuthenticationState, AuthorizeFlow, FlowState, FlowStep, Navigation, Rejection,
		Transition, record_result,
	},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	oidc::PreservedParams,
};

/// Fallback message for refused logins.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";
/// Fallback message for refused registrations.
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed";

const SIGN_IN_STATES: [FlowState; 4] = [
	FlowState::Idle,
	FlowState::Unauthenticated,
	FlowState::LoginFailed,
	FlowState::RegistrationFailed,
];

impl<T> AuthorizeFlow<T>
where
	T: ?Sized + ApiTransport,
{
	/// Submits the login form.
	///
	/// The form is checked locally first; an invalid form yields [`FlowStep::InvalidForm`]
	/// without a network call or a state change.
	pub async fn submit_login(
		&self,
		form: &LoginForm,
		preserved: Option<&PreservedParams>,
	) -> Result<FlowStep> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "submit_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Err(errors) = form.validate() {
					return Ok(FlowStep::InvalidForm(errors));
				}

				let transition = self.begin("log in", &SIGN_IN_STATES, FlowState::LoggingIn)?;

				let outcome = self
					.api
					.login(form)
					.await
					.map(|result| result.into_result().map(|data| data.user.id));

				self.finish_sign_in(
					transition,
					outcome,
					FlowState::LoginFailed,
					LOGIN_FAILED_MESSAGE,
					preserved,
				)
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Submits the registration form; mirrors [`AuthorizeFlow::submit_login`].
	pub async fn submit_register(
		&self,
		form: &RegisterForm,
		preserved: Option<&PreservedParams>,
	) -> Result<FlowStep> {
		const KIND: FlowKind = FlowKind::Register;

		let span = FlowSpan::new(KIND, "submit_register");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Err(errors) = form.validate() {
					return Ok(FlowStep::InvalidForm(errors));
				}

				let transition =
					self.begin("register", &SIGN_IN_STATES, FlowState::Registering)?;

				let outcome = self
					.api
					.register(form)
					.await
					.map(|result| result.into_result().map(|data| data.user.id));

				self.finish_sign_in(
					transition,
					outcome,
					FlowState::RegistrationFailed,
					REGISTRATION_FAILED_MESSAGE,
					preserved,
				)
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Link from the login page to the registration page, keeping the preserved blob.
	pub fn register_link(&self, preserved: Option<&PreservedParams>) -> String {
		self.config.register_route(preserved)
	}

	/// Link from the registration page back to the login page, keeping the preserved blob.
	pub fn login_link(&self, preserved: Option<&PreservedParams>) -> String {
		self.config.login_route(preserved)
	}

	/// Where to go after signing in.
	///
	/// With a preserved blob this is a full-page navigation to the authorize page. A blob that
	/// does not decode is appended to the authorize URL as-is.
	pub fn after_sign_in(&self, preserved: Option<&PreservedParams>) -> Navigation {
		let Some(blob) = preserved.filter(|blob| !blob.is_empty()) else {
			return Navigation::Route(self.config.home_path.clone());
		};

		let replayed =
			blob.decode().ok().and_then(|params| self.config.authorize_url(params.iter()).ok());

		match replayed {
			Some(url) => Navigation::Document(url.into()),
			None => self.raw_authorize_target(blob),
		}
	}

	fn finish_sign_in(
		&self,
		transition: Transition<'_, T>,
		outcome: Result<Result<UserId, ApiFailure>>,
		failed: FlowState,
		fallback: &str,
		preserved: Option<&PreservedParams>,
	) -> Result<FlowStep> {
		match outcome {
			Ok(Ok(user)) => {
				self.set_authentication(AuthenticationState::Authenticated(user));
				transition.settle(FlowState::Authenticated);

				Ok(FlowStep::Navigate(self.after_sign_in(preserved)))
			},
			Ok(Err(failure)) => {
				self.set_authentication(AuthenticationState::Unauthenticated);
				transition.settle(failed);

				Ok(FlowStep::Rejected(Rejection::new(
					Some(failure.error().to_owned()),
					failure.user_message(fallback),
				)))
			},
			Err(Error::Transport(_)) => {
				transition.settle(failed);

				Ok(FlowStep::Rejected(Rejection::transport()))
			},
			Err(e) => {
				transition.settle(failed);

				Err(e)
			},
		}
	}

	fn raw_authorize_target(&self, blob: &PreservedParams) -> Navigation {
		match self.config.origin.join(&self.config.authorize_path) {
			Ok(mut url) => {
				url.set_query(None);

				Navigation::Document(format!("{url}?{blob}"))
			},
			Err(_) => Navigation::Route(format!("{}?{blob}", self.config.authorize_path)),
		}
	}
}
