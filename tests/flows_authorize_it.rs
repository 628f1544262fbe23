mod common;

// std
use std::time::Duration;
// self
use authly_authorize::{
	cache::{CacheKey, QueryCache},
	error::{ContractError, Error},
	flows::{AuthenticationState, FlowState, FlowStep, Navigation, Rejection},
	http::ApiMethod,
	oidc::PreservedParams,
	url::Url,
};
use common::*;
use serde_json::json;

fn document(step: &FlowStep) -> Url {
	match step {
		FlowStep::Navigate(Navigation::Document(target)) =>
			Url::parse(target).expect("Document navigation should be an absolute URL."),
		other => panic!("Expected a full-page navigation, got {other:?}."),
	}
}

#[tokio::test]
async fn unauthenticated_entry_preserves_the_whole_query() {
	let transport = ScriptedTransport::new([redirected()]);
	let (flow, _) = build_flow(transport.clone());
	let query = format!("{VALID_QUERY}&prompt=login");
	let step = flow.enter(&query).await.expect("Entry should settle.");
	let FlowStep::Navigate(Navigation::Route(route)) = &step else {
		panic!("Expected an in-app route to the login page, got {step:?}.");
	};

	assert!(route.starts_with("/login?oidc_params="), "{route}");
	assert_eq!(flow.state(), FlowState::Unauthenticated);
	assert_eq!(flow.authentication(), AuthenticationState::Unauthenticated);
	assert_eq!(transport.paths(), ["/auth/me"]);

	let blob = PreservedParams::from_login_query(&route["/login".len()..])
		.expect("Login route should carry the preserved blob.");
	let replayed = blob.decode().expect("Preserved blob should decode.");

	assert_eq!(replayed.get("prompt"), Some("login"));
	assert_eq!(replayed.get("redirect_uri"), Some("https://app.example/cb"));
	assert_eq!(replayed.get("code_challenge_method"), Some("s256"));
}

#[tokio::test]
async fn entry_without_a_query_only_checks_the_session() {
	let transport = ScriptedTransport::new([success(user("u-1"))]);
	let (flow, cache) = build_flow(transport.clone());
	let step = flow.enter("").await.expect("Entry should settle.");

	assert_eq!(step, FlowStep::Authenticated);
	assert_eq!(flow.state(), FlowState::Authenticated);
	assert!(matches!(
		flow.authentication(),
		AuthenticationState::Authenticated(id) if id.as_str() == "u-1"
	));
	assert_eq!(cache.cached(&CacheKey::auth_status()).map(|entry| entry.value), Some(json!(true)));
	assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn transport_failure_on_entry_counts_as_unauthenticated() {
	let transport = ScriptedTransport::new([Reply::NetworkDown]);
	let (flow, _) = build_flow(transport);
	let step = flow.enter("").await.expect("Entry should settle.");

	assert_eq!(step, FlowStep::Navigate(Navigation::Route("/login".into())));
	assert_eq!(flow.state(), FlowState::Unauthenticated);
}

#[tokio::test]
async fn authenticated_valid_request_reaches_consent_then_redirects_with_code() {
	let transport = ScriptedTransport::new([
		success(user("u-1")),
		success(details()),
		success(json!({ "redirect_uri": "https://app.example/cb", "code": "AUTHCODE" })),
	]);
	let (flow, _) = build_flow(transport.clone());
	let step = flow.enter(VALID_QUERY).await.expect("Entry should settle.");
	let FlowStep::Consent(prompt) = &step else {
		panic!("Expected the consent prompt, got {step:?}.");
	};

	assert_eq!(prompt.details.client_name.as_deref(), Some("Example App"));
	assert_eq!(prompt.params.state, "xyz");
	assert_eq!(prompt.user.as_ref().map(|id| id.as_str()), Some("u-1"));
	assert_eq!(flow.state(), FlowState::AwaitingConfirmation);

	let step = flow.confirm().await.expect("Confirmation should settle.");
	let target = document(&step);

	assert_eq!(target.as_str(), "https://app.example/cb?code=AUTHCODE&state=xyz");
	assert_eq!(flow.state(), FlowState::Redirecting);

	let requests = transport.requests();

	assert_eq!(requests[1].method, ApiMethod::Get);
	assert!(requests[1].path.starts_with("/oauth/authorize/validate?"));
	assert_eq!(requests[2].method, ApiMethod::Post);
	assert_eq!(requests[2].path, "/oauth/authorize/confirm");
	assert_eq!(
		requests[2].body.as_ref().and_then(|body| body.get("code_challenge")),
		Some(&json!("chal"))
	);
}

#[tokio::test]
async fn confirm_without_code_follows_the_server_redirect() {
	let transport = ScriptedTransport::new([
		success(user("u-1")),
		success(details()),
		success(json!({ "redirect_uri": "https://app.example/cb?code=SRV&state=xyz" })),
	]);
	let (flow, _) = build_flow(transport);

	flow.enter(VALID_QUERY).await.expect("Entry should settle.");

	let step = flow.confirm().await.expect("Confirmation should settle.");

	assert_eq!(document(&step).as_str(), "https://app.example/cb?code=SRV&state=xyz");
}

#[tokio::test]
async fn confirm_success_without_redirect_uri_fails_loudly() {
	let transport = ScriptedTransport::new([
		success(user("u-1")),
		success(details()),
		success(json!({ "code": "AUTHCODE" })),
	]);
	let (flow, _) = build_flow(transport);

	flow.enter(VALID_QUERY).await.expect("Entry should settle.");

	let err = flow.confirm().await.expect_err("A missing redirect_uri must abort confirmation.");

	assert!(matches!(err, Error::Contract(ContractError::MissingRedirectUri)));
	assert_eq!(flow.state(), FlowState::ConfirmFailed);
}

#[tokio::test]
async fn invalid_request_with_trusted_redirect_uri_goes_back_to_the_client() {
	let transport = ScriptedTransport::new([success(user("u-1"))]);
	let (flow, _) = build_flow(transport.clone());
	let query = VALID_QUERY.replace("response_type=code", "response_type=token");
	let step = flow.enter(&query).await.expect("Entry should settle.");
	let target = document(&step);
	let pairs = target.query_pairs().into_owned().collect::<Vec<_>>();

	assert_eq!(target.path(), "/cb");
	assert!(pairs.contains(&("error".into(), "unsupported_response_type".into())));
	assert!(pairs.contains(&("state".into(), "xyz".into())));
	assert_eq!(flow.state(), FlowState::RequestInvalid);
	// Local validation failed, so the backend was never asked.
	assert_eq!(transport.paths(), ["/auth/me"]);
}

#[tokio::test]
async fn invalid_request_without_trusted_redirect_uri_stays_in_app() {
	let transport = ScriptedTransport::new([success(user("u-1"))]);
	let (flow, _) = build_flow(transport);
	let step =
		flow.enter("client_id=abc&redirect_uri=nowhere").await.expect("Entry should settle.");

	assert_eq!(
		step,
		FlowStep::Rejected(Rejection::new(
			Some("invalid_request".into()),
			"Missing required parameter: response_type"
		))
	);
}

#[tokio::test]
async fn backend_protocol_errors_are_redirected_others_are_shown() {
	let transport = ScriptedTransport::new([
		success(user("u-1")),
		failure(400, "invalid_scope", Some("Scope not allowed")),
	]);
	let (flow, _) = build_flow(transport);
	let step = flow.enter(VALID_QUERY).await.expect("Entry should settle.");

	assert_eq!(
		document(&step).as_str(),
		"https://app.example/cb?error=invalid_scope&error_description=Scope+not+allowed&state=xyz"
	);

	let transport = ScriptedTransport::new([
		success(user("u-1")),
		failure(400, "invalid_client_id", Some("Unknown client")),
	]);
	let (flow, _) = build_flow(transport);
	let step = flow.enter(VALID_QUERY).await.expect("Entry should settle.");

	assert_eq!(
		step,
		FlowStep::Rejected(Rejection::new(Some("invalid_client_id".into()), "Unknown client"))
	);
	assert_eq!(flow.state(), FlowState::RequestInvalid);
}

#[tokio::test]
async fn deny_sends_access_denied_with_state() {
	let transport = ScriptedTransport::new([success(user("u-1")), success(details())]);
	let (flow, _) = build_flow(transport.clone());

	flow.enter(VALID_QUERY).await.expect("Entry should settle.");

	let target = document(&flow.deny().expect("Denial should settle."));

	assert_eq!(
		target.as_str(),
		"https://app.example/cb?error=access_denied&error_description=The+resource+owner+denied+the+request&state=xyz"
	);
	assert_eq!(flow.state(), FlowState::Redirecting);
	assert_eq!(transport.requests().len(), 2);
	assert!(matches!(flow.deny(), Err(Error::InvalidTransition { action: "deny", .. })));
}

#[tokio::test]
async fn confirm_before_consent_is_refused() {
	let transport = ScriptedTransport::new([]);
	let (flow, _) = build_flow(transport.clone());
	let err = flow.confirm().await.expect_err("Nothing is pending yet.");

	assert!(matches!(err, Error::InvalidTransition { state: FlowState::Idle, .. }));
	assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn overlapping_entries_are_refused_while_in_flight() {
	let transport = ScriptedTransport::delayed(Duration::from_millis(50), [success(user("u-1"))]);
	let (flow, _) = build_flow(transport.clone());
	let (first, second) = tokio::join!(flow.enter(""), async {
		tokio::time::sleep(Duration::from_millis(10)).await;

		flow.enter("").await
	});

	assert_eq!(first.expect("First entry should settle."), FlowStep::Authenticated);
	assert!(matches!(second, Err(Error::Busy { state: FlowState::CheckingAuth })));
	assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn cancelled_entry_releases_the_flow() {
	let transport = ScriptedTransport::delayed(Duration::from_millis(200), [success(user("u-1"))]);
	let (flow, _) = build_flow(transport);
	let timed_out = tokio::time::timeout(Duration::from_millis(20), flow.enter("")).await;

	assert!(timed_out.is_err());
	assert_eq!(flow.state(), FlowState::Idle);
	assert_eq!(flow.authentication(), AuthenticationState::Unknown);

	// The dropped request never consumed its reply.
	let step = flow.enter("").await.expect("A fresh entry should not be refused.");

	assert_eq!(step, FlowStep::Authenticated);
	assert_eq!(flow.state(), FlowState::Authenticated);
}

#[tokio::test]
async fn redirect_uri_without_client_is_not_trusted() {
	let transport = ScriptedTransport::new([success(user("u-1"))]);
	let (flow, _) = build_flow(transport.clone());
	let step = flow
		.enter("redirect_uri=https%3A%2F%2Fevil.example%2Fsteal&state=s")
		.await
		.expect("Entry should settle.");

	assert_eq!(
		step,
		FlowStep::Rejected(Rejection::new(
			Some("invalid_request".into()),
			"Missing required parameter: client_id"
		))
	);
	assert_eq!(flow.state(), FlowState::RequestInvalid);
	assert_eq!(transport.paths(), ["/auth/me"]);
}

#[tokio::test]
async fn backend_refusal_without_description_uses_the_fallback() {
	let transport =
		ScriptedTransport::new([success(user("u-1")), failure(400, "invalid_client_id", None)]);
	let (flow, _) = build_flow(transport);
	let step = flow.enter(VALID_QUERY).await.expect("Entry should settle.");

	assert_eq!(
		step,
		FlowStep::Rejected(Rejection::new(
			Some("invalid_client_id".into()),
			"Authorization failed"
		))
	);
}

#[tokio::test]
async fn malformed_session_payload_aborts_entry() {
	let transport = ScriptedTransport::new([success(json!({ "user": { "id": 42 } }))]);
	let (flow, _) = build_flow(transport);
	let err = flow.enter(VALID_QUERY).await.expect_err("A schema violation must not be swallowed.");

	assert!(matches!(err, Error::Contract(ContractError::Schema { operation: "me", .. })));
	assert_eq!(flow.state(), FlowState::Idle);
	assert_eq!(flow.authentication(), AuthenticationState::Unknown);
}
