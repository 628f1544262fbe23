//! Crate-level error types shared by the API client, the OIDC helpers, and the flows.

// self
use crate::{_prelude::*, api::FieldErrors, config::FlowConfigError, flows::FlowState};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Backend-reported failures are not errors: they arrive as
/// [`ApiResult::Failure`](crate::api::ApiResult::Failure) values. This enum covers what the
/// normalizer cannot turn into such a value.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Transport(TransportError),
	/// The backend broke the response contract of an operation.
	#[error(transparent)]
	Contract(#[from] ContractError),
	/// Request input failed local validation; nothing was sent.
	#[error("Request input is invalid: {0}.")]
	InvalidInput(#[from] FieldErrors),

	/// Another transition is still in flight.
	#[error("Flow is busy in the {state} state.")]
	Busy {
		/// State the flow was in when the call was refused.
		state: FlowState,
	},
	/// The requested action is not accepted from the current state.
	#[error("Cannot {action} from the {state} state.")]
	InvalidTransition {
		/// State the flow was in when the call was refused.
		state: FlowState,
		/// Action label.
		action: &'static str,
	},
}

impl From<TransportError> for Error {
	fn from(e: TransportError) -> Self {
		match e {
			TransportError::Config(e) => Self::Config(e),
			e => Self::Transport(e),
		}
	}
}

/// Configuration failures raised while assembling clients or flows.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// API base URL cannot carry relative paths.
	#[error("API base URL cannot be used as a base: {url}.")]
	InvalidApiBase {
		/// Offending URL.
		url: String,
	},
	/// API path could not be joined onto the base URL.
	#[error("API path `{path}` is invalid.")]
	InvalidApiPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Flow configuration failed validation.
	#[error(transparent)]
	Flow(#[from] FlowConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend API.")]
	Io(#[from] std::io::Error),
	/// The request could not be addressed; surfaces as [`Error::Config`], never as a network
	/// failure.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Contract violations: the backend answered, but not in the shape the operation requires.
///
/// These abort the operation and are never downgraded into a normalized failure.
#[derive(Debug, ThisError)]
pub enum ContractError {
	/// A success payload did not match the operation's declared schema.
	#[error("The {operation} response does not match its schema.")]
	Schema {
		/// Operation label.
		operation: &'static str,
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A request body could not be serialized.
	#[error("The {operation} request body could not be serialized.")]
	RequestBody {
		/// Operation label.
		operation: &'static str,
		/// Serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Confirmation succeeded without telling the client where to go.
	#[error("Authorization confirmation succeeded without a redirect_uri.")]
	MissingRedirectUri,
	/// Confirmation returned a redirect target that is not a URL.
	#[error("Authorization confirmation returned an invalid redirect_uri.")]
	InvalidRedirectUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
