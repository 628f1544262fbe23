//! PKCE primitives and a relying-party side builder for authorize requests.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, oidc::AuthorizationRequestParams};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Error returned when a `code_challenge_method` value is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unsupported code_challenge_method: {0}.")]
pub struct UnknownChallengeMethod(pub String);

/// PKCE challenge methods accepted by the authorize page.
///
/// Identifiers are matched case-sensitively, so the RFC 7636 spelling `S256` does not parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
	/// SHA-256 based PKCE.
	#[serde(rename = "s256")]
	S256,
	/// Verifier sent verbatim.
	#[serde(rename = "plain")]
	Plain,
}
impl CodeChallengeMethod {
	/// Returns the identifier sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			CodeChallengeMethod::S256 => "s256",
			CodeChallengeMethod::Plain => "plain",
		}
	}

	/// Derives the challenge for `verifier`.
	pub fn challenge(self, verifier: &str) -> String {
		match self {
			CodeChallengeMethod::S256 => {
				let digest = Sha256::digest(verifier.as_bytes());

				URL_SAFE_NO_PAD.encode(digest)
			},
			CodeChallengeMethod::Plain => verifier.to_owned(),
		}
	}
}
impl FromStr for CodeChallengeMethod {
	type Err = UnknownChallengeMethod;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"s256" => Ok(Self::S256),
			"plain" => Ok(Self::Plain),
			other => Err(UnknownChallengeMethod(other.to_owned())),
		}
	}
}
impl Display for CodeChallengeMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Verifier/challenge pair kept by the relying party.
#[derive(Clone)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
	method: CodeChallengeMethod,
}
impl PkcePair {
	/// Generates a fresh random verifier and derives its challenge.
	pub fn generate(method: CodeChallengeMethod) -> Self {
		Self::from_verifier(random_string(PKCE_VERIFIER_LEN), method)
	}

	/// Builds a pair around a known verifier.
	pub fn from_verifier(verifier: impl Into<String>, method: CodeChallengeMethod) -> Self {
		let verifier = verifier.into();
		let challenge = method.challenge(&verifier);

		Self { verifier, challenge, method }
	}

	/// Secret verifier, sent only at token exchange.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// Challenge sent with the authorize request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method.
	pub fn method(&self) -> CodeChallengeMethod {
		self.method
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish_non_exhaustive()
	}
}

/// Assembles a complete authorize request the way a relying party would.
#[derive(Clone, Debug)]
pub struct AuthorizationRequestBuilder {
	client_id: String,
	redirect_uri: Url,
	scope: String,
	state: Option<String>,
	method: CodeChallengeMethod,
}
impl AuthorizationRequestBuilder {
	/// Starts a request for `client_id` redirecting to `redirect_uri`.
	pub fn new(client_id: impl Into<String>, redirect_uri: Url) -> Self {
		Self {
			client_id: client_id.into(),
			redirect_uri,
			scope: "openid".into(),
			state: None,
			method: CodeChallengeMethod::S256,
		}
	}

	/// Overrides the requested scopes (defaults to `openid`).
	pub fn scope<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.scope = scopes.into_iter().map(|s| s.as_ref().to_owned()).collect::<Vec<_>>().join(" ");

		self
	}

	/// Pins the `state` value instead of generating one.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Overrides the challenge method (defaults to `s256`).
	pub fn method(mut self, method: CodeChallengeMethod) -> Self {
		self.method = method;

		self
	}

	/// Generates the PKCE pair and returns it with the request parameters.
	pub fn build(self) -> (AuthorizationRequestParams, PkcePair) {
		let pkce = PkcePair::generate(self.method);
		let state = self.state.unwrap_or_else(|| random_string(STATE_LEN));
		let params = AuthorizationRequestParams::from_iter([
			("client_id", self.client_id),
			("redirect_uri", self.redirect_uri.into()),
			("response_type", "code".to_owned()),
			("scope", self.scope),
			("state", state),
			("code_challenge", pkce.challenge.clone()),
			("code_challenge_method", pkce.method.as_str().to_owned()),
		]);

		(params, pkce)
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
