//! Authorize page operations: authentication check, request validation, consent.

// self
use crate::{
	_prelude::*,
	api::{ApiFailure, ApiResult, ConfirmAuthorizationRequest, ConfirmAuthorizationResponse},
	cache::CacheKey,
	error::ContractError,
	flows::{
		AuthenticationState, AuthorizeFlow, ConsentPrompt, FlowState, FlowStep, Navigation,
		PendingAuthorization, Rejection, record_result,
	},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	oidc::{
		self, AuthorizationRequestParams, ErrorCode, PreservedParams, ValidationError,
		build_error_redirect, build_protocol_error_redirect, build_success_redirect,
	},
};

/// Backend error codes reported to the client application rather than in-app.
pub const REDIRECTABLE_ERROR_CODES: [&str; 6] = [
	"invalid_request",
	"unsupported_response_type",
	"invalid_scope",
	"access_denied",
	"unsupported_code_challenge_method",
	"invalid_code_challenge",
];

/// Fallback message for refused authorization requests.
pub const AUTHORIZATION_FAILED_MESSAGE: &str = "Authorization failed";

const DENIED_DESCRIPTION: &str = "The resource owner denied the request";

const ENTRY_STATES: [FlowState; 9] = [
	FlowState::Idle,
	FlowState::Authenticated,
	FlowState::Unauthenticated,
	FlowState::LoginFailed,
	FlowState::RegistrationFailed,
	FlowState::AwaitingConfirmation,
	FlowState::RequestInvalid,
	FlowState::Redirecting,
	FlowState::ConfirmFailed,
];

impl<T> AuthorizeFlow<T>
where
	T: ?Sized + ApiTransport,
{
	/// Enters the authorize page with its raw query string.
	///
	/// Checks the session first. Without one, the whole query is preserved on the login route.
	/// With one, a non-empty query is validated right away.
	pub async fn enter(&self, query: &str) -> Result<FlowStep> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "enter");
		let params = AuthorizationRequestParams::from_query(query);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.authenticate(&params)).await;

		record_result(KIND, &result);

		match result {
			Ok(FlowStep::Authenticated) if !params.is_empty() =>
				self.validate_request(&params).await,
			other => other,
		}
	}

	async fn authenticate(&self, params: &AuthorizationRequestParams) -> Result<FlowStep> {
		let transition = self.begin("enter", &ENTRY_STATES, FlowState::CheckingAuth)?;

		self.set_authentication(AuthenticationState::Checking);
		*self.pending.lock() = None;
		self.api.cache().invalidate(&CacheKey::auth_me());

		match self.api.me().await {
			Ok(ApiResult::Success { data, .. }) => {
				self.set_authentication(AuthenticationState::Authenticated(data.user.id));
				transition.settle(FlowState::Authenticated);

				Ok(FlowStep::Authenticated)
			},
			Ok(ApiResult::Failure(_)) | Err(Error::Transport(_)) => {
				self.set_authentication(AuthenticationState::Unauthenticated);
				transition.settle(FlowState::Unauthenticated);

				let preserved = (!params.is_empty()).then(|| PreservedParams::encode(params));

				Ok(FlowStep::Navigate(Navigation::Route(
					self.config.login_route(preserved.as_ref()),
				)))
			},
			Err(e) => {
				self.set_authentication(AuthenticationState::Unknown);
				transition.settle(FlowState::Idle);

				Err(e)
			},
		}
	}

	/// Validates an authorize request locally, then against the backend.
	///
	/// Protocol errors go back to the client application when the request's `redirect_uri` is
	/// a well-formed absolute URL; otherwise they are rejected in-app.
	pub async fn validate_request(&self, params: &AuthorizationRequestParams) -> Result<FlowStep> {
		const KIND: FlowKind = FlowKind::ValidateRequest;

		let span = FlowSpan::new(KIND, "validate_request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let transition = self.begin(
					"validate the request",
					&[FlowState::Authenticated],
					FlowState::ValidatingRequest,
				)?;

				let validated = match oidc::validate(params) {
					Ok(validated) => validated,
					Err(err) => {
						transition.settle(FlowState::RequestInvalid);

						return Ok(reject_invalid_request(params, &err));
					},
				};

				match self.api.validate_authorization(params).await {
					Ok(ApiResult::Success { data, .. }) => {
						*self.pending.lock() =
							Some(PendingAuthorization { params: validated.clone() });

						transition.settle(FlowState::AwaitingConfirmation);

						Ok(FlowStep::Consent(Box::new(ConsentPrompt {
							params: validated,
							details: data,
							user: self.authenticated_user(),
						})))
					},
					Ok(ApiResult::Failure(failure)) => {
						transition.settle(FlowState::RequestInvalid);

						Ok(reject_backend_failure(params, &failure))
					},
					Err(Error::Transport(_)) => {
						transition.settle(FlowState::RequestInvalid);

						Ok(FlowStep::Rejected(Rejection::transport()))
					},
					Err(e) => {
						transition.settle(FlowState::RequestInvalid);

						Err(e)
					},
				}
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Approves the pending request and hands the user agent back to the client application.
	///
	/// A success response without a usable `redirect_uri` is a contract violation.
	pub async fn confirm(&self) -> Result<FlowStep> {
		const KIND: FlowKind = FlowKind::Confirm;

		let span = FlowSpan::new(KIND, "confirm");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let transition = self.begin(
					"confirm",
					&[FlowState::AwaitingConfirmation, FlowState::ConfirmFailed],
					FlowState::Confirming,
				)?;
				let Some(pending) = self.pending.lock().clone() else {
					let state = transition.previous();

					transition.settle(state);

					return Err(Error::InvalidTransition { state, action: "confirm" });
				};
				let request = ConfirmAuthorizationRequest::from(pending.params.clone());

				match self.api.confirm_authorization(&request).await {
					Ok(ApiResult::Success { data, .. }) =>
						match confirmed_redirect(data, &pending.params.state) {
							Ok(target) => {
								*self.pending.lock() = None;

								transition.settle(FlowState::Redirecting);

								Ok(FlowStep::Navigate(Navigation::Document(target)))
							},
							Err(e) => {
								transition.settle(FlowState::ConfirmFailed);

								Err(e)
							},
						},
					Ok(ApiResult::Failure(failure)) => {
						transition.settle(FlowState::ConfirmFailed);

						Ok(FlowStep::Rejected(Rejection::new(
							Some(failure.error().to_owned()),
							failure.user_message(AUTHORIZATION_FAILED_MESSAGE),
						)))
					},
					Err(Error::Transport(_)) => {
						transition.settle(FlowState::ConfirmFailed);

						Ok(FlowStep::Rejected(Rejection::transport()))
					},
					Err(e) => {
						transition.settle(FlowState::ConfirmFailed);

						Err(e)
					},
				}
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Declines the pending request; the client application receives `access_denied`.
	pub fn deny(&self) -> Result<FlowStep> {
		const KIND: FlowKind = FlowKind::Deny;

		let _guard = FlowSpan::new(KIND, "deny").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.deny_pending();

		record_result(KIND, &result);

		result
	}

	fn deny_pending(&self) -> Result<FlowStep> {
		let transition =
			self.begin("deny", &[FlowState::AwaitingConfirmation], FlowState::Redirecting)?;
		let Some(pending) = self.pending.lock().clone() else {
			let state = transition.previous();

			transition.settle(state);

			return Err(Error::InvalidTransition { state, action: "deny" });
		};
		let error = ValidationError::new(ErrorCode::AccessDenied, DENIED_DESCRIPTION);
		// A failed build drops the transition, which restores the consent prompt.
		let target = build_error_redirect(
			&pending.params.redirect_uri,
			&error,
			Some(&pending.params.state),
		)
		.map_err(|source| ContractError::InvalidRedirectUri { source })?;

		*self.pending.lock() = None;

		transition.settle(FlowState::Redirecting);

		Ok(FlowStep::Navigate(Navigation::Document(target)))
	}
}

/// Reports a local validation failure to the client when possible, in-app otherwise.
fn reject_invalid_request(params: &AuthorizationRequestParams, err: &ValidationError) -> FlowStep {
	oidc::trusted_redirect_uri(params)
		.and_then(|redirect_uri| build_error_redirect(redirect_uri, err, params.get("state")).ok())
		.map(|target| FlowStep::Navigate(Navigation::Document(target)))
		.unwrap_or_else(|| {
			FlowStep::Rejected(Rejection::new(
				Some(err.error.as_str().to_owned()),
				err.error_description.clone(),
			))
		})
}

/// Reports a backend validation failure to the client when its code is a redirectable
/// protocol error and the `redirect_uri` is trustworthy, in-app otherwise.
fn reject_backend_failure(params: &AuthorizationRequestParams, failure: &ApiFailure) -> FlowStep {
	let redirect = oidc::trusted_redirect_uri(params)
		.filter(|_| REDIRECTABLE_ERROR_CODES.contains(&failure.error()))
		.and_then(|redirect_uri| {
			build_protocol_error_redirect(
				redirect_uri,
				failure.error(),
				failure.error_description(),
				params.get("state"),
			)
			.ok()
		});

	match redirect {
		Some(target) => FlowStep::Navigate(Navigation::Document(target)),
		None => FlowStep::Rejected(Rejection::new(
			Some(failure.error().to_owned()),
			failure.user_message(AUTHORIZATION_FAILED_MESSAGE),
		)),
	}
}

/// Resolves where a successful confirmation sends the user agent.
fn confirmed_redirect(response: ConfirmAuthorizationResponse, state: &str) -> Result<String> {
	let redirect_uri = response
		.redirect_uri
		.filter(|uri| !uri.is_empty())
		.ok_or(ContractError::MissingRedirectUri)?;
	let target = match response.code.filter(|code| !code.is_empty()) {
		Some(code) => build_success_redirect(&redirect_uri, &code, Some(state)),
		None => Url::parse(&redirect_uri).map(String::from),
	}
	.map_err(|source| ContractError::InvalidRedirectUri { source })?;

	Ok(target)
}
