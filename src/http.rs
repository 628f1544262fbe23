//! Transport capability consumed by the API client.
//!
//! The crate never speaks HTTP on its own: it asks an [`ApiTransport`] to perform
//! `request(method, path, body)` and receives a [`RawResponse`] describing what came back,
//! including whether the transport had to follow a redirect to get there. Headers, cookies,
//! and retries belong to the transport.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::error::TransportError;

/// Boxed future returned by [`ApiTransport::request`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// HTTP verbs used by the backend API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
}
impl ApiMethod {
	/// Returns the verb as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiMethod::Get => "GET",
			ApiMethod::Post => "POST",
		}
	}
}
impl Display for ApiMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// What the transport observed for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
	/// Final HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
	/// True when the transport followed (or was told to follow) a redirect.
	pub redirected: bool,
	/// Where the redirect pointed, when known.
	pub location: Option<Url>,
}
impl RawResponse {
	/// Response with a JSON body.
	pub fn json(status: u16, body: &Value) -> Self {
		Self { status, body: body.to_string().into_bytes(), ..Default::default() }
	}

	/// Response that ended at `location` after a redirect.
	pub fn redirected(status: u16, location: Option<Url>) -> Self {
		Self { status, redirected: true, location, ..Default::default() }
	}

	/// Returns true for 3xx statuses.
	pub fn is_redirect_status(&self) -> bool {
		(300..400).contains(&self.status)
	}
}

/// Capability to send one request to the backend API.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every flow behind an `Arc`.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `body` (JSON) to `path` (relative to the API base, may carry a query).
	fn request<'a>(
		&'a self,
		method: ApiMethod,
		path: &'a str,
		body: Option<Value>,
	) -> TransportFuture<'a>;
}

/// Reqwest-backed transport rooted at an API base URL.
///
/// Redirects are followed by the underlying client; a response whose final URL differs from
/// the requested one is reported as redirected. Install a cookie store on a custom
/// [`ReqwestClient`] to carry the session cookie.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Creates a transport with a default client.
	pub fn new(base_url: Url) -> Result<Self, ConfigError> {
		Self::with_client(ReqwestClient::new(), base_url)
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, mut base_url: Url) -> Result<Self, ConfigError> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidApiBase { url: base_url.into() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		Ok(Self { client, base_url })
	}

	/// API base URL, always ending in `/`.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Resolves `path` against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidApiPath { path: path.to_owned(), source })
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn request<'a>(
		&'a self,
		method: ApiMethod,
		path: &'a str,
		body: Option<Value>,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let url = self.endpoint(path)?;
			let mut request = match method {
				ApiMethod::Get => self.client.get(url.clone()),
				ApiMethod::Post => self.client.post(url.clone()),
			}
			.header(reqwest::header::ACCEPT, "application/json");

			if let Some(body) = body {
				request = request
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(body.to_string());
			}

			let response = request.send().await?;
			let status = response.status().as_u16();
			let final_url = response.url().clone();
			let header_location = response
				.headers()
				.get(reqwest::header::LOCATION)
				.and_then(|value| value.to_str().ok())
				.and_then(|value| final_url.join(value).ok());
			let redirected = final_url != url || (300..400).contains(&status);
			let location = if final_url != url { Some(final_url) } else { header_location };
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, body, redirected, location })
		})
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_gains_a_trailing_slash() {
		let transport = ReqwestTransport::new(
			Url::parse("https://api.example/v1").expect("Base URL fixture should parse."),
		)
		.expect("Transport should build.");

		assert_eq!(transport.base_url().as_str(), "https://api.example/v1/");
		assert_eq!(
			transport.endpoint("/auth/login").expect("Endpoint should resolve.").as_str(),
			"https://api.example/v1/auth/login"
		);
	}

	#[tokio::test]
	async fn unaddressable_paths_are_configuration_errors() {
		let transport = ReqwestTransport::new(
			Url::parse("https://api.example/v1").expect("Base URL fixture should parse."),
		)
		.expect("Transport should build.");
		let err = transport
			.request(ApiMethod::Get, "http://[", None)
			.await
			.expect_err("A malformed absolute path cannot be joined.");

		assert!(matches!(
			Error::from(err),
			Error::Config(ConfigError::InvalidApiPath { ref path, .. }) if path == "http://["
		));
	}

	#[test]
	fn rejects_cannot_be_a_base_urls() {
		let err = ReqwestTransport::new(
			Url::parse("mailto:ops@example.com").expect("Mailto fixture should parse."),
		)
		.expect_err("Opaque URLs cannot serve as API bases.");

		assert!(matches!(err, ConfigError::InvalidApiBase { .. }));
	}
}
