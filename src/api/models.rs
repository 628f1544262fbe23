//! Request and response models for the backend operations.

// self
use crate::{_prelude::*, api::FieldErrors, oidc::ValidatedAuthorizationParams};

const MIN_PASSWORD_LEN: usize = 8;

/// Backend user identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);
impl UserId {
	/// Wraps a raw identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Raw identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Authenticated user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Identifier.
	pub id: UserId,
	/// Login name.
	pub username: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Contact address, when known.
	#[serde(default)]
	pub email: Option<String>,
	/// Whether the account may sign in.
	pub is_active: bool,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Last update instant.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

/// `data` payload of `POST /auth/login` and `GET /auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
	/// Signed-in user.
	pub user: User,
}

/// Reference to a freshly registered account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUserRef {
	/// Identifier of the new account.
	pub id: UserId,
}

/// `data` payload of `POST /auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
	/// New account.
	pub user: RegisteredUserRef,
}

/// Credentials submitted from the login page.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
	/// Login name.
	pub username: String,
	/// Password.
	pub password: String,
}
impl LoginForm {
	/// Creates a new form.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}

	/// Checks the form shape without touching the network.
	pub fn validate(&self) -> Result<(), FieldErrors> {
		let mut errors = FieldErrors::default();

		if self.username.is_empty() {
			errors.add("username", "Username is required");
		}
		if self.password.is_empty() {
			errors.add("password", "Password is required");
		}

		errors.into_result()
	}
}
impl Debug for LoginForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginForm")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account details submitted from the registration page.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
	/// Login name.
	pub username: String,
	/// Password, at least eight characters.
	pub password: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Optional contact address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}
impl RegisterForm {
	/// Checks the form shape without touching the network.
	pub fn validate(&self) -> Result<(), FieldErrors> {
		let mut errors = FieldErrors::default();

		if self.username.is_empty() {
			errors.add("username", "Username is required");
		}
		if self.password.chars().count() < MIN_PASSWORD_LEN {
			errors.add("password", "Password must be at least 8 characters");
		}
		if self.first_name.is_empty() {
			errors.add("first_name", "First name is required");
		}
		if self.last_name.is_empty() {
			errors.add("last_name", "Last name is required");
		}
		if let Some(email) = self.email.as_deref().filter(|email| !email.contains('@')) {
			errors.add("email", format!("Invalid email address: {email}"));
		}

		errors.into_result()
	}
}
impl Debug for RegisterForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterForm")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("first_name", &self.first_name)
			.field("last_name", &self.last_name)
			.field("email", &self.email)
			.finish()
	}
}

/// `data` payload of `GET /oauth/authorize/validate`, shown on the consent prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDetails {
	/// Client identifier the backend resolved.
	pub client_id: String,
	/// Display name of the client application.
	#[serde(default)]
	pub client_name: Option<String>,
	/// Scopes the client may be granted.
	#[serde(default)]
	pub scopes: Vec<String>,
}

/// Body of `POST /oauth/authorize/confirm`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmAuthorizationRequest {
	/// Client identifier.
	pub client_id: String,
	/// Client redirect target.
	pub redirect_uri: String,
	/// Always `code`.
	pub response_type: String,
	/// Granted scopes.
	pub scope: String,
	/// Opaque client state.
	pub state: String,
	/// PKCE challenge.
	pub code_challenge: String,
	/// PKCE challenge method.
	pub code_challenge_method: String,
}
impl From<ValidatedAuthorizationParams> for ConfirmAuthorizationRequest {
	fn from(params: ValidatedAuthorizationParams) -> Self {
		Self {
			client_id: params.client_id,
			redirect_uri: params.redirect_uri,
			response_type: params.response_type,
			scope: params.scope,
			state: params.state,
			code_challenge: params.code_challenge,
			code_challenge_method: params.code_challenge_method,
		}
	}
}

/// `data` payload of `POST /oauth/authorize/confirm`.
///
/// `redirect_uri` is optional at the schema level so its absence surfaces as a dedicated
/// contract violation rather than a generic schema mismatch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmAuthorizationResponse {
	/// Where to send the user agent.
	#[serde(default)]
	pub redirect_uri: Option<String>,
	/// Authorization code, when the backend leaves redirect assembly to the client.
	#[serde(default)]
	pub code: Option<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_form_requires_both_fields() {
		let errors = LoginForm::new("", "").validate().expect_err("Empty form should fail.");

		assert_eq!(errors.len(), 2);
		assert_eq!(errors.get("username"), Some("Username is required"));
		assert!(LoginForm::new("alice", "secret").validate().is_ok());
	}

	#[test]
	fn register_form_checks_password_length_and_email() {
		let form = RegisterForm {
			username: "alice".into(),
			password: "short".into(),
			first_name: "Alice".into(),
			last_name: "Liddell".into(),
			email: Some("alice.example".into()),
		};
		let errors = form.validate().expect_err("Short password and bad email should fail.");

		assert_eq!(errors.get("password"), Some("Password must be at least 8 characters"));
		assert!(errors.get("email").is_some());
		assert!(errors.get("username").is_none());
	}

	#[test]
	fn debug_output_redacts_passwords() {
		let rendered = format!("{:?}", LoginForm::new("alice", "hunter22"));

		assert!(rendered.contains("alice"));
		assert!(!rendered.contains("hunter22"));
	}

	#[test]
	fn user_parses_rfc3339_timestamps() {
		let payload = serde_json::json!({
			"user": {
				"id": "u-1",
				"username": "alice",
				"first_name": "Alice",
				"last_name": "Liddell",
				"email": null,
				"is_active": true,
				"created_at": "2026-01-01T12:00:00Z",
				"updated_at": "2026-01-02T12:00:00Z"
			}
		});
		let parsed: UserResponse =
			serde_json::from_value(payload).expect("User payload should deserialize.");

		assert_eq!(parsed.user.id.as_str(), "u-1");
		assert_eq!(parsed.user.created_at.year(), 2026);
	}
}
