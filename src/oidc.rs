//! OIDC protocol helpers: authorize-request validation, client redirects, PKCE, and the
//! parameter codec that carries a pending request across the login page.

pub mod pkce;
pub mod preserved;
pub mod redirect;
pub mod request;

pub use pkce::*;
pub use preserved::*;
pub use redirect::*;
pub use request::*;

// self
use crate::_prelude::*;

/// OAuth 2.0 error codes produced by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
	/// The request is missing a parameter or carries a malformed one.
	InvalidRequest,
	/// The `response_type` is not supported.
	UnsupportedResponseType,
	/// The resource owner declined the request.
	AccessDenied,
}
impl ErrorCode {
	/// Returns the RFC 6749 identifier for the error code.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorCode::InvalidRequest => "invalid_request",
			ErrorCode::UnsupportedResponseType => "unsupported_response_type",
			ErrorCode::AccessDenied => "access_denied",
		}
	}
}
impl Display for ErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Protocol error reported either to the client application or in-app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{error}: {error_description}")]
pub struct ValidationError {
	/// OAuth error code.
	pub error: ErrorCode,
	/// Human-readable description.
	pub error_description: String,
}
impl ValidationError {
	/// Creates a new protocol error.
	pub fn new(error: ErrorCode, description: impl Into<String>) -> Self {
		Self { error, error_description: description.into() }
	}

	/// `invalid_request` naming a missing parameter.
	pub fn missing(parameter: &str) -> Self {
		Self::new(ErrorCode::InvalidRequest, format!("Missing required parameter: {parameter}"))
	}
}

/// Sets `key` on the URL query, replacing the first existing occurrence in place and
/// dropping any later duplicates; appends when the key is absent.
pub(crate) fn set_query_param(url: &mut Url, key: &str, value: &str) {
	let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
	let mut replaced = false;

	pairs.retain_mut(|(name, current)| {
		if name != key {
			return true;
		}
		if replaced {
			return false;
		}

		*current = value.to_owned();
		replaced = true;

		true
	});

	if !replaced {
		pairs.push((key.to_owned(), value.to_owned()));
	}

	url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// Drops every occurrence of `key` from the URL query; a query left empty is removed.
pub(crate) fn remove_query_param(url: &mut Url, key: &str) {
	let pairs: Vec<(String, String)> =
		url.query_pairs().into_owned().filter(|(name, _)| name != key).collect();

	if pairs.is_empty() {
		url.set_query(None);
	} else {
		url.query_pairs_mut().clear().extend_pairs(pairs);
	}
}
