//! Shared fixtures: a scripted in-memory transport plus request/response builders.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use serde_json::{Value, json};
// self
use authly_authorize::{
	api::ApiClient,
	cache::MemoryQueryCache,
	config::FlowConfig,
	error::TransportError,
	flows::AuthorizeFlow,
	http::{ApiMethod, ApiTransport, RawResponse, TransportFuture},
	url::Url,
};

/// Authorize query every validator rule accepts.
pub const VALID_QUERY: &str = "client_id=abc&redirect_uri=https%3A%2F%2Fapp.example%2Fcb&response_type=code&scope=openid&state=xyz&code_challenge=chal&code_challenge_method=s256";

/// One request observed by [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
	pub method: ApiMethod,
	pub path: String,
	pub body: Option<Value>,
}

/// Scripted reply.
#[derive(Clone, Debug)]
pub enum Reply {
	Respond(RawResponse),
	NetworkDown,
}

/// Transport replaying scripted replies in order and recording every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
	replies: Mutex<VecDeque<Reply>>,
	requests: Mutex<Vec<RecordedRequest>>,
	delay: Option<Duration>,
}
impl ScriptedTransport {
	pub fn new<I>(replies: I) -> Arc<Self>
	where
		I: IntoIterator<Item = Reply>,
	{
		Arc::new(Self { replies: Mutex::new(replies.into_iter().collect()), ..Default::default() })
	}

	/// Same as [`ScriptedTransport::new`], but every reply is held back for `delay`.
	pub fn delayed<I>(delay: Duration, replies: I) -> Arc<Self>
	where
		I: IntoIterator<Item = Reply>,
	{
		Arc::new(Self {
			replies: Mutex::new(replies.into_iter().collect()),
			requests: Mutex::default(),
			delay: Some(delay),
		})
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn paths(&self) -> Vec<String> {
		self.requests.lock().iter().map(|request| request.path.clone()).collect()
	}
}
impl ApiTransport for ScriptedTransport {
	fn request<'a>(
		&'a self,
		method: ApiMethod,
		path: &'a str,
		body: Option<Value>,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			self.requests.lock().push(RecordedRequest { method, path: path.to_owned(), body });

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			let reply = self.replies.lock().pop_front();

			match reply {
				Some(Reply::Respond(response)) => Ok(response),
				Some(Reply::NetworkDown) | None => Err(TransportError::Io(std::io::Error::other(
					"Scripted transport has no reply for this request.",
				))),
			}
		})
	}
}

pub fn success(data: Value) -> Reply {
	Reply::Respond(RawResponse::json(200, &json!({ "success": true, "data": data })))
}

pub fn failure(status: u16, error: &str, description: Option<&str>) -> Reply {
	let mut body = json!({ "success": false, "error": error });

	if let Some(description) = description {
		body["error_description"] = Value::from(description);
	}

	Reply::Respond(RawResponse::json(status, &body))
}

pub fn redirected() -> Reply {
	Reply::Respond(RawResponse::redirected(
		200,
		Some(Url::parse("https://auth.example/login").expect("Login URL fixture should parse.")),
	))
}

pub fn user(id: &str) -> Value {
	json!({
		"user": {
			"id": id,
			"username": "alice",
			"first_name": "Alice",
			"last_name": "Liddell",
			"email": "alice@example.com",
			"is_active": true,
			"created_at": "2026-01-01T12:00:00Z",
			"updated_at": "2026-01-01T12:00:00Z"
		}
	})
}

pub fn details() -> Value {
	json!({ "client_id": "abc", "client_name": "Example App", "scopes": ["openid"] })
}

pub fn config() -> FlowConfig {
	FlowConfig::builder(Url::parse("https://auth.example").expect("Origin fixture should parse."))
		.build()
		.expect("Flow config fixture should validate.")
}

pub fn build_flow(
	transport: Arc<ScriptedTransport>,
) -> (AuthorizeFlow<ScriptedTransport>, Arc<MemoryQueryCache>) {
	let cache = Arc::new(MemoryQueryCache::default());
	let api: ApiClient<ScriptedTransport> = ApiClient::new(transport, cache.clone());
	let flow = AuthorizeFlow::new(api, config()).expect("Flow fixture should build.");

	(flow, cache)
}
