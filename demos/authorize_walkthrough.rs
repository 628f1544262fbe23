//! Walks through the client-side half of an authorization-code + PKCE request without touching
//! the network: build and validate a request, carry it across the login page, then build the
//! redirects a relying party would receive.

// crates.io
use color_eyre::Result;
// self
use authly_authorize::{
	config::FlowConfig,
	oidc::{
		self, AuthorizationRequestBuilder, AuthorizationRequestParams, CodeChallengeMethod,
		ErrorCode, PreservedParams, ValidationError,
	},
	url::Url,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let config = FlowConfig::builder(Url::parse("https://auth.example.com")?).build()?;
	let (params, pkce) =
		AuthorizationRequestBuilder::new("demo-client", Url::parse("https://app.example.com/cb")?)
			.scope(["openid", "profile"])
			.method(CodeChallengeMethod::S256)
			.build();

	println!("Keep this verifier for the token exchange: {}.", pkce.verifier());

	let authorize_url = config.authorize_url(params.iter())?;

	println!("Authorize page: {authorize_url}.");

	let validated = oidc::validate(&params)?;

	println!("Validated request for client `{}`.", validated.client_id);

	// An unauthenticated visitor is sent to the login page with the whole query preserved.
	let inbound = AuthorizationRequestParams::from_url(&authorize_url);
	let preserved = PreservedParams::encode(&inbound);
	let login_route = config.login_route(Some(&preserved));

	println!("Login route: {login_route}.");

	let carried = PreservedParams::from_login_query(
		login_route.split_once('?').map(|(_, query)| query).unwrap_or_default(),
	);
	let replayed = carried.map(|blob| blob.decode()).transpose()?.unwrap_or_default();

	println!("Replayed after login: {}.", config.authorize_url(replayed.iter())?);

	let success = oidc::build_success_redirect(
		&validated.redirect_uri,
		"demo-code",
		Some(&validated.state),
	)?;
	let denied = oidc::build_error_redirect(
		&validated.redirect_uri,
		&ValidationError::new(ErrorCode::AccessDenied, "The resource owner denied the request"),
		Some(&validated.state),
	)?;

	println!("Approved: {success}.");
	println!("Denied: {denied}.");

	let mut broken = params.clone();

	broken.insert("response_type", "token");

	if let Err(e) = oidc::validate(&broken) {
		println!("Rejected `response_type=token`: {e}.");
	}

	Ok(())
}
