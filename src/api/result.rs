//! Normalized result shape returned by every backend operation.

// crates.io
use serde::{Serializer, ser::SerializeStruct};
// self
use crate::_prelude::*;

/// Error code reported when the transport followed a redirect instead of returning JSON.
pub const REDIRECT_OCCURRED: &str = "redirect_occurred";
/// Error code reported when the response matched no known shape.
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Uniform outcome of one backend operation.
///
/// Serializes as `{"success":true,"data":..,"message":..}` or
/// `{"success":false,"error":..,"error_description"?:..}`.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResult<T> {
	/// Operation succeeded.
	Success {
		/// Operation-specific payload.
		data: T,
		/// Backend message, empty when none was sent.
		message: String,
	},
	/// Operation failed.
	Failure(ApiFailure),
}
impl<T> ApiResult<T> {
	/// Returns true for [`ApiResult::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, ApiResult::Success { .. })
	}

	/// Payload, if the operation succeeded.
	pub fn data(&self) -> Option<&T> {
		match self {
			ApiResult::Success { data, .. } => Some(data),
			ApiResult::Failure(_) => None,
		}
	}

	/// Failure, if the operation failed.
	pub fn failure(&self) -> Option<&ApiFailure> {
		match self {
			ApiResult::Success { .. } => None,
			ApiResult::Failure(failure) => Some(failure),
		}
	}

	/// Converts into a plain [`Result`] over the payload.
	pub fn into_result(self) -> Result<T, ApiFailure> {
		match self {
			ApiResult::Success { data, .. } => Ok(data),
			ApiResult::Failure(failure) => Err(failure),
		}
	}
}
impl<T> Serialize for ApiResult<T>
where
	T: Serialize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			ApiResult::Success { data, message } => {
				let mut state = serializer.serialize_struct("ApiResult", 3)?;

				state.serialize_field("success", &true)?;
				state.serialize_field("data", data)?;
				state.serialize_field("message", message)?;
				state.end()
			},
			ApiResult::Failure(failure) => failure.serialize(serializer),
		}
	}
}

/// Why an operation failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiFailure {
	/// The transport followed a redirect, which means the session was rejected upstream.
	RedirectOccurred {
		/// Redirect target, when the transport reported one.
		location: Option<Url>,
	},
	/// The backend reported a structured error, passed through verbatim.
	Backend {
		/// Backend error code.
		error: String,
		/// Backend description, when supplied.
		error_description: Option<String>,
	},
	/// Nothing recognizable came back.
	Unknown,
}
impl ApiFailure {
	/// Error code as reported to callers.
	pub fn error(&self) -> &str {
		match self {
			ApiFailure::RedirectOccurred { .. } => REDIRECT_OCCURRED,
			ApiFailure::Backend { error, .. } => error,
			ApiFailure::Unknown => UNKNOWN_ERROR,
		}
	}

	/// Backend-supplied description, if any.
	pub fn error_description(&self) -> Option<&str> {
		match self {
			ApiFailure::Backend { error_description, .. } => error_description.as_deref(),
			_ => None,
		}
	}

	/// Message to show a user: the backend description when present, otherwise `fallback`.
	pub fn user_message(&self, fallback: &str) -> String {
		self.error_description().filter(|text| !text.is_empty()).unwrap_or(fallback).to_owned()
	}
}
impl Display for ApiFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.error_description() {
			Some(description) => write!(f, "{}: {description}", self.error()),
			None => f.write_str(self.error()),
		}
	}
}
impl Serialize for ApiFailure {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let location = match self {
			ApiFailure::RedirectOccurred { location } => location.as_ref(),
			_ => None,
		};
		let len = 2 + usize::from(self.error_description().is_some()) + usize::from(location.is_some());
		let mut state = serializer.serialize_struct("ApiResult", len)?;

		state.serialize_field("success", &false)?;
		state.serialize_field("error", self.error())?;

		if let Some(description) = self.error_description() {
			state.serialize_field("error_description", description)?;
		}
		if let Some(location) = location {
			state.serialize_field("location", location.as_str())?;
		}

		state.end()
	}
}
