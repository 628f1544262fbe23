//! Authorize-request parameters and the fail-fast validator.

// self
use crate::{
	_prelude::*,
	oidc::{ErrorCode, ValidationError},
};

/// Outcome of [`validate`].
pub type ValidationResult = Result<ValidatedAuthorizationParams, ValidationError>;

/// Untrusted query parameters taken from an inbound authorize URL.
///
/// Repeated keys keep their last value. Iteration is sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationRequestParams(BTreeMap<String, String>);
impl AuthorizationRequestParams {
	/// Parses a raw (form-urlencoded) query string, with or without the leading `?`.
	pub fn from_query(query: &str) -> Self {
		let query = query.strip_prefix('?').unwrap_or(query);

		url::form_urlencoded::parse(query.as_bytes()).into_owned().collect()
	}

	/// Extracts the query parameters of `url`.
	pub fn from_url(url: &Url) -> Self {
		url.query_pairs().into_owned().collect()
	}

	/// Returns the raw value for `key`, if present.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Sets `key`, replacing any earlier value.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), value.into());
	}

	/// Removes `key`, returning its value.
	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.0.remove(key)
	}

	/// Returns true when no parameter was supplied.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over every key/value pair.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Serializes the parameters back into a form-urlencoded query string.
	pub fn to_query_string(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
	}

	/// Returns the value for `key` when it is present and non-empty.
	fn required(&self, key: &'static str) -> Result<&str, ValidationError> {
		self.get(key).filter(|value| !value.is_empty()).ok_or_else(|| ValidationError::missing(key))
	}
}
impl<K, V> FromIterator<(K, V)> for AuthorizationRequestParams
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}
}

/// Parameters that passed every rule of [`validate`], echoed unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedAuthorizationParams {
	/// Client identifier.
	pub client_id: String,
	/// Well-formed absolute redirect URL, as supplied.
	pub redirect_uri: String,
	/// Always `code`.
	pub response_type: String,
	/// Requested scopes, as supplied.
	pub scope: String,
	/// Opaque client state.
	pub state: String,
	/// PKCE challenge.
	pub code_challenge: String,
	/// `s256` or `plain`.
	pub code_challenge_method: String,
}
impl ValidatedAuthorizationParams {
	/// Space-delimited scopes split into individual values.
	pub fn scopes(&self) -> impl Iterator<Item = &str> {
		self.scope.split_whitespace()
	}

	/// Key/value view in declaration order.
	pub fn pairs(&self) -> [(&'static str, &str); 7] {
		[
			("client_id", &self.client_id),
			("redirect_uri", &self.redirect_uri),
			("response_type", &self.response_type),
			("scope", &self.scope),
			("state", &self.state),
			("code_challenge", &self.code_challenge),
			("code_challenge_method", &self.code_challenge_method),
		]
	}
}

/// Validates an inbound authorize request.
///
/// Rules run in a fixed order and the first failure wins:
///
/// 1. `client_id`, `redirect_uri`, `response_type` are present.
/// 2. `response_type` is `code` (`unsupported_response_type` otherwise).
/// 3. `scope`, `state`, `code_challenge`, `code_challenge_method` are present.
/// 4. `code_challenge_method` is exactly `s256` or `plain`.
/// 5. `redirect_uri` parses as an absolute URL.
///
/// Callers and tests rely on which error fires for inputs that break several rules, so the
/// order must not change. Values are neither trimmed nor case-folded.
pub fn validate(params: &AuthorizationRequestParams) -> ValidationResult {
	let client_id = params.required("client_id")?;
	let redirect_uri = params.required("redirect_uri")?;
	let response_type = params.required("response_type")?;

	if response_type != "code" {
		return Err(ValidationError::new(
			ErrorCode::UnsupportedResponseType,
			format!("Unsupported response_type: {response_type}. Only 'code' is supported."),
		));
	}

	let scope = params.required("scope")?;
	let state = params.required("state")?;
	let code_challenge = params.required("code_challenge")?;
	let code_challenge_method = params.required("code_challenge_method")?;

	// Case-sensitive on purpose: `S256` is rejected.
	if code_challenge_method.parse::<crate::oidc::CodeChallengeMethod>().is_err() {
		return Err(ValidationError::new(
			ErrorCode::InvalidRequest,
			format!(
				"Unsupported code_challenge_method: {code_challenge_method}. Only 's256' and 'plain' are supported."
			),
		));
	}
	if Url::parse(redirect_uri).is_err() {
		return Err(ValidationError::new(ErrorCode::InvalidRequest, "Invalid redirect_uri format"));
	}

	Ok(ValidatedAuthorizationParams {
		client_id: client_id.to_owned(),
		redirect_uri: redirect_uri.to_owned(),
		response_type: response_type.to_owned(),
		scope: scope.to_owned(),
		state: state.to_owned(),
		code_challenge: code_challenge.to_owned(),
		code_challenge_method: code_challenge_method.to_owned(),
	})
}

/// Returns the request's `redirect_uri` when it can receive protocol errors.
///
/// The request must name a client and carry a `redirect_uri` that parses as an absolute URL.
/// Without a `client_id` nothing vouches for the target, so errors stay in-app (RFC 6749
/// §4.1.2.1).
pub fn trusted_redirect_uri(params: &AuthorizationRequestParams) -> Option<&str> {
	params.get("client_id").filter(|client_id| !client_id.is_empty())?;
	params.get("redirect_uri").filter(|value| !value.is_empty() && Url::parse(value).is_ok())
}
