//! Carries a pending authorize request through the login page.
//!
//! The authorize page serializes its whole query into a single `oidc_params` value on the
//! login route. After a successful login the blob is decoded and replayed onto the authorize
//! page. Nothing is kept in shared state between the two pages.

// self
use crate::{_prelude::*, oidc::AuthorizationRequestParams};

/// Query key carrying the preserved blob on the login and registration pages.
pub const OIDC_PARAMS_KEY: &str = "oidc_params";

/// Failure to decode a preserved blob.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PreservedParamsError {
	/// A key or value did not percent-decode into UTF-8.
	#[error("Preserved parameter `{component}` is not valid UTF-8 once decoded.")]
	InvalidEncoding {
		/// Raw component that failed to decode.
		component: String,
	},
}

/// Form-urlencoded serialization of an authorize request's full query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreservedParams(String);
impl PreservedParams {
	/// Serializes every parameter of the inbound request.
	pub fn encode(params: &AuthorizationRequestParams) -> Self {
		Self(params.to_query_string())
	}

	/// Wraps a blob received from elsewhere without checking it.
	pub fn from_raw(blob: impl Into<String>) -> Self {
		Self(blob.into())
	}

	/// Extracts the blob from a login or registration page query string.
	///
	/// Returns `None` when the key is absent or empty.
	pub fn from_login_query(query: &str) -> Option<Self> {
		let query = query.strip_prefix('?').unwrap_or(query);

		url::form_urlencoded::parse(query.as_bytes())
			.filter(|(key, _)| key == OIDC_PARAMS_KEY)
			.last()
			.map(|(_, value)| value.into_owned())
			.filter(|value| !value.is_empty())
			.map(Self)
	}

	/// Raw, still-encoded blob.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true for an empty blob.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Strictly decodes the blob back into request parameters.
	///
	/// Unlike lenient form parsing, an escape sequence that decodes to invalid UTF-8 is an
	/// error, so callers can fall back to forwarding the raw blob.
	pub fn decode(&self) -> Result<AuthorizationRequestParams, PreservedParamsError> {
		let mut params = AuthorizationRequestParams::default();

		for pair in self.0.split('&').filter(|pair| !pair.is_empty()) {
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));

			params.insert(decode_component(key)?, decode_component(value)?);
		}

		Ok(params)
	}
}
impl Display for PreservedParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn decode_component(component: &str) -> Result<String, PreservedParamsError> {
	let spaced = component.replace('+', " ");

	urlencoding::decode(&spaced)
		.map(|decoded| decoded.into_owned())
		.map_err(|_| PreservedParamsError::InvalidEncoding { component: component.to_owned() })
}
