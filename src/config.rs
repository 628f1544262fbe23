//! Flow configuration: the page origin plus the in-app paths the orchestrator navigates to.

// self
use crate::{_prelude::*, oidc::PreservedParams};

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// Errors raised while constructing or validating a [`FlowConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum FlowConfigError {
	/// Origin must use HTTPS unless it points at a loopback host.
	#[error("The origin must use HTTPS: {url}.")]
	InsecureOrigin {
		/// Origin URL that failed validation.
		url: String,
	},
	/// Origin must not carry a query or fragment.
	#[error("The origin must not carry a query or fragment: {url}.")]
	OriginHasQuery {
		/// Origin URL that failed validation.
		url: String,
	},
	/// In-app paths must be absolute.
	#[error("The {page} path must start with `/`: {path}.")]
	RelativePath {
		/// Which page path failed validation.
		page: &'static str,
		/// Offending path.
		path: String,
	},
}

/// Where the authorization pages live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
	/// Origin serving the login and authorize pages (used for full-page navigations).
	pub origin: Url,
	/// Login page path.
	#[serde(default = "default_login_path")]
	pub login_path: String,
	/// Registration page path.
	#[serde(default = "default_register_path")]
	pub register_path: String,
	/// Authorize page path.
	#[serde(default = "default_authorize_path")]
	pub authorize_path: String,
	/// Landing path after a login that carried no OIDC request.
	#[serde(default = "default_home_path")]
	pub home_path: String,
}
impl FlowConfig {
	/// Creates a new builder for the provided origin.
	pub fn builder(origin: Url) -> FlowConfigBuilder {
		FlowConfigBuilder::new(origin)
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), FlowConfigError> {
		let secure = self.origin.scheme() == "https"
			|| (self.origin.scheme() == "http"
				&& self.origin.host_str().is_some_and(|host| LOOPBACK_HOSTS.contains(&host)));

		if !secure {
			return Err(FlowConfigError::InsecureOrigin { url: self.origin.to_string() });
		}
		if self.origin.query().is_some() || self.origin.fragment().is_some() {
			return Err(FlowConfigError::OriginHasQuery { url: self.origin.to_string() });
		}

		validate_path("login", &self.login_path)?;
		validate_path("register", &self.register_path)?;
		validate_path("authorize", &self.authorize_path)?;
		validate_path("home", &self.home_path)?;

		Ok(())
	}

	/// In-app route to the login page, carrying the preserved OIDC parameters when present.
	pub fn login_route(&self, preserved: Option<&PreservedParams>) -> String {
		route_with_blob(&self.login_path, preserved)
	}

	/// In-app route to the registration page, carrying the preserved OIDC parameters when
	/// present.
	pub fn register_route(&self, preserved: Option<&PreservedParams>) -> String {
		route_with_blob(&self.register_path, preserved)
	}

	/// Absolute authorize page URL with `pairs` set as query parameters.
	pub fn authorize_url<'a, I>(&self, pairs: I) -> Result<Url, url::ParseError>
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut url = self.origin.join(&self.authorize_path)?;

		for (key, value) in pairs {
			crate::oidc::set_query_param(&mut url, key, value);
		}

		Ok(url)
	}
}

/// Builder for [`FlowConfig`] values.
#[derive(Debug)]
pub struct FlowConfigBuilder {
	config: FlowConfig,
}
impl FlowConfigBuilder {
	/// Creates a new builder seeded with the provided origin and default paths.
	pub fn new(origin: Url) -> Self {
		Self {
			config: FlowConfig {
				origin,
				login_path: default_login_path(),
				register_path: default_register_path(),
				authorize_path: default_authorize_path(),
				home_path: default_home_path(),
			},
		}
	}

	/// Overrides the login page path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.config.login_path = path.into();

		self
	}

	/// Overrides the registration page path.
	pub fn register_path(mut self, path: impl Into<String>) -> Self {
		self.config.register_path = path.into();

		self
	}

	/// Overrides the authorize page path.
	pub fn authorize_path(mut self, path: impl Into<String>) -> Self {
		self.config.authorize_path = path.into();

		self
	}

	/// Overrides the landing path.
	pub fn home_path(mut self, path: impl Into<String>) -> Self {
		self.config.home_path = path.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<FlowConfig, FlowConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn route_with_blob(path: &str, preserved: Option<&PreservedParams>) -> String {
	match preserved {
		Some(blob) if !blob.is_empty() =>
			format!("{path}?oidc_params={}", urlencoding::encode(blob.as_str())),
		_ => path.to_owned(),
	}
}

fn validate_path(page: &'static str, path: &str) -> Result<(), FlowConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(FlowConfigError::RelativePath { page, path: path.to_owned() })
	}
}

fn default_login_path() -> String {
	"/login".into()
}

fn default_register_path() -> String {
	"/register".into()
}

fn default_authorize_path() -> String {
	"/authorize".into()
}

fn default_home_path() -> String {
	"/".into()
}
