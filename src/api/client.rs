//! Typed backend client; every operation funnels through one normalization path.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{
		ApiResult, AuthorizationDetails, ConfirmAuthorizationRequest,
		ConfirmAuthorizationResponse, LoginForm, Operation, RawOutcome, RegisterForm,
		RegisteredUser, User, UserResponse, normalize,
	},
	cache::{CacheKey, CachedValue, QueryCache},
	error::ContractError,
	http::ApiTransport,
	oidc::AuthorizationRequestParams,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Client specialized for the bundled reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Backend API client bound to a transport and a caching collaborator.
///
/// Backend-reported failures come back as [`ApiResult::Failure`]; only transport failures,
/// contract violations, and locally invalid input are returned as [`Error`].
pub struct ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	cache: Arc<dyn QueryCache>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client from a transport and a cache.
	pub fn new(transport: impl Into<Arc<T>>, cache: Arc<dyn QueryCache>) -> Self {
		Self { transport: transport.into(), cache }
	}

	/// Underlying transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Caching collaborator.
	pub fn cache(&self) -> &Arc<dyn QueryCache> {
		&self.cache
	}

	/// `POST /auth/login`.
	///
	/// The form is validated first; invalid input is refused without a request.
	pub async fn login(&self, form: &LoginForm) -> Result<ApiResult<UserResponse>> {
		form.validate()?;

		let body = encode_body(Operation::Login, form)?;
		let result = self.call(Operation::Login, Operation::Login.path(), Some(body)).await?;

		if result.is_success() {
			self.invalidate_session();
		}

		Ok(result)
	}

	/// `POST /auth/register`.
	///
	/// The form is validated first; invalid input is refused without a request.
	pub async fn register(&self, form: &RegisterForm) -> Result<ApiResult<RegisteredUser>> {
		form.validate()?;

		let body = encode_body(Operation::Register, form)?;
		let result = self.call(Operation::Register, Operation::Register.path(), Some(body)).await?;

		if result.is_success() {
			self.invalidate_session();
		}

		Ok(result)
	}

	/// `GET /auth/me`.
	///
	/// The verdict is cached under `auth/status` (and the user under `auth/me`) stamped with
	/// the instant the request started, so a slower earlier check cannot overwrite a later one.
	pub async fn me(&self) -> Result<ApiResult<UserResponse>> {
		let started_at = OffsetDateTime::now_utc();
		let result: ApiResult<UserResponse> =
			self.call(Operation::Me, Operation::Me.path(), None).await?;

		match &result {
			ApiResult::Success { data, .. } => {
				if let Ok(user) = serde_json::to_value(&data.user) {
					self.cache.store(CacheKey::auth_me(), CachedValue::new(user, started_at));
				}

				self.cache
					.store(CacheKey::auth_status(), CachedValue::new(Value::Bool(true), started_at));
			},
			ApiResult::Failure(_) => {
				self.cache.invalidate(&CacheKey::auth_me());
				self.cache
					.store(CacheKey::auth_status(), CachedValue::new(Value::Bool(false), started_at));
			},
		}

		Ok(result)
	}

	/// `GET /oauth/authorize/validate?<query>`.
	pub async fn validate_authorization(
		&self,
		params: &AuthorizationRequestParams,
	) -> Result<ApiResult<AuthorizationDetails>> {
		const OP: Operation = Operation::ValidateAuthorization;

		let started_at = OffsetDateTime::now_utc();
		let query = params.to_query_string();
		let path = format!("{}?{query}", OP.path());
		let result: ApiResult<AuthorizationDetails> = self.call(OP, &path, None).await?;

		if let Some(Ok(details)) = result.data().map(serde_json::to_value) {
			self.cache.store(CacheKey::oidc_validate(&query), CachedValue::new(details, started_at));
		}

		Ok(result)
	}

	/// `POST /oauth/authorize/confirm`.
	pub async fn confirm_authorization(
		&self,
		request: &ConfirmAuthorizationRequest,
	) -> Result<ApiResult<ConfirmAuthorizationResponse>> {
		const OP: Operation = Operation::ConfirmAuthorization;

		let body = encode_body(OP, request)?;

		self.call(OP, OP.path(), Some(body)).await
	}

	/// User cached by the last successful [`ApiClient::me`], if still valid.
	pub fn cached_user(&self) -> Option<User> {
		self.cache
			.cached(&CacheKey::auth_me())
			.and_then(|entry| serde_json::from_value(entry.value).ok())
	}

	/// Last cached authentication verdict.
	pub fn cached_auth_status(&self) -> Option<bool> {
		self.cache.cached(&CacheKey::auth_status()).and_then(|entry| entry.value.as_bool())
	}

	async fn call<D>(
		&self,
		operation: Operation,
		path: &str,
		body: Option<Value>,
	) -> Result<ApiResult<D>>
	where
		D: DeserializeOwned,
	{
		let response = self.transport.request(operation.method(), path, body).await?;

		normalize(operation, RawOutcome::classify(&response))
	}

	fn invalidate_session(&self) {
		self.cache.invalidate(&CacheKey::auth_me());
		self.cache.invalidate(&CacheKey::auth_status());
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), cache: self.cache.clone() }
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").finish_non_exhaustive()
	}
}

fn encode_body<B>(operation: Operation, body: &B) -> Result<Value>
where
	B: Serialize,
{
	serde_json::to_value(body)
		.map_err(|source| ContractError::RequestBody { operation: operation.as_str(), source }.into())
}
