//! Classification of raw transport outcomes and their normalization into [`ApiResult`].

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{ApiFailure, ApiResult, Operation},
	error::ContractError,
	http::RawResponse,
};

/// Closed set of shapes a backend response can take.
#[derive(Clone, Debug, PartialEq)]
pub enum RawOutcome {
	/// The transport followed (or was told to follow) a redirect.
	Redirected {
		/// Redirect target, when known.
		location: Option<Url>,
	},
	/// The envelope reported `success: true`.
	Success {
		/// Raw payload, `null` when absent.
		data: Value,
		/// Optional backend message.
		message: Option<String>,
	},
	/// The envelope carried a structured error.
	Failure {
		/// Backend error code.
		error: String,
		/// Backend description.
		error_description: Option<String>,
	},
	/// Anything else, including non-JSON bodies.
	Unrecognized,
}
impl RawOutcome {
	/// Classifies a transport response.
	///
	/// A redirect wins over whatever the body says, then `success: true`, then a non-empty
	/// `error`. Everything else is unrecognized.
	pub fn classify(response: &RawResponse) -> Self {
		if response.redirected || response.is_redirect_status() {
			return RawOutcome::Redirected { location: response.location.clone() };
		}

		let Ok(envelope) = serde_json::from_slice::<Envelope>(&response.body) else {
			return RawOutcome::Unrecognized;
		};

		if envelope.success == Some(true) {
			return RawOutcome::Success { data: envelope.data, message: envelope.message };
		}

		match envelope.error {
			Some(error) if !error.is_empty() =>
				RawOutcome::Failure { error, error_description: envelope.error_description },
			_ => RawOutcome::Unrecognized,
		}
	}
}

#[derive(Debug, Deserialize)]
struct Envelope {
	#[serde(default)]
	success: Option<bool>,
	#[serde(default)]
	data: Value,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// Turns a classified outcome into the operation's [`ApiResult`].
///
/// A success payload that does not deserialize into `T` is a contract violation and is
/// returned as [`ContractError::Schema`], never as a failure value.
pub fn normalize<T>(operation: Operation, outcome: RawOutcome) -> Result<ApiResult<T>>
where
	T: DeserializeOwned,
{
	let result = match outcome {
		RawOutcome::Redirected { location } =>
			ApiResult::Failure(ApiFailure::RedirectOccurred { location }),
		RawOutcome::Success { data, message } => {
			let data = serde_path_to_error::deserialize(data).map_err(|source| {
				ContractError::Schema { operation: operation.as_str(), source }
			})?;

			ApiResult::Success { data, message: message.unwrap_or_default() }
		},
		RawOutcome::Failure { error, error_description } =>
			ApiResult::Failure(ApiFailure::Backend { error, error_description }),
		RawOutcome::Unrecognized => ApiResult::Failure(ApiFailure::Unknown),
	};

	Ok(result)
}
