//! Outbound redirects to the client application.
//!
//! Both builders are pure: they parse `redirect_uri`, set their parameters with
//! [`set_query_param`](super::set_query_param) semantics, and serialize. Output is
//! byte-identical for identical inputs because `url` serializes deterministically and the
//! parameters are always set in the same order. An empty `state` is treated as absent.

// self
use crate::{_prelude::*, oidc::ValidationError};

/// Builds `{redirect_uri}?error=..&error_description=..[&state=..]`.
///
/// Fails when `redirect_uri` is not a parseable URL.
pub fn build_error_redirect(
	redirect_uri: &str,
	error: &ValidationError,
	state: Option<&str>,
) -> Result<String, url::ParseError> {
	build_protocol_error_redirect(
		redirect_uri,
		error.error.as_str(),
		Some(&error.error_description),
		state,
	)
}

/// Same as [`build_error_redirect`] for error codes reported by the backend verbatim.
///
/// When `error_description` is absent, any description already on `redirect_uri` is dropped so
/// it cannot be paired with the new `error`.
pub fn build_protocol_error_redirect(
	redirect_uri: &str,
	error: &str,
	error_description: Option<&str>,
	state: Option<&str>,
) -> Result<String, url::ParseError> {
	let mut url = Url::parse(redirect_uri)?;

	super::set_query_param(&mut url, "error", error);

	match error_description {
		Some(description) => super::set_query_param(&mut url, "error_description", description),
		None => super::remove_query_param(&mut url, "error_description"),
	}
	if let Some(state) = state.filter(|value| !value.is_empty()) {
		super::set_query_param(&mut url, "state", state);
	}

	Ok(url.into())
}

/// Builds `{redirect_uri}?code=..[&state=..]`.
///
/// Fails when `redirect_uri` is not a parseable URL.
pub fn build_success_redirect(
	redirect_uri: &str,
	code: &str,
	state: Option<&str>,
) -> Result<String, url::ParseError> {
	let mut url = Url::parse(redirect_uri)?;

	super::set_query_param(&mut url, "code", code);

	if let Some(state) = state.filter(|value| !value.is_empty()) {
		super::set_query_param(&mut url, "state", state);
	}

	Ok(url.into())
}
