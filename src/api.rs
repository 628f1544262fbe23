//! Backend API operations and the result normalizer they all share.
//!
//! Every operation goes through [`ApiClient`], which sends the request, classifies the raw
//! transport outcome into a [`RawOutcome`], and normalizes it into an [`ApiResult`]. The
//! classification and normalization rules live in one place so no operation can drift.

pub mod client;
pub mod models;
pub mod normalize;
pub mod result;

pub use client::*;
pub use models::*;
pub use normalize::*;
pub use result::*;

// self
use crate::{_prelude::*, http::ApiMethod};

/// Backend operations consumed by the flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// `POST /auth/login`.
	Login,
	/// `POST /auth/register`.
	Register,
	/// `GET /auth/me`.
	Me,
	/// `GET /oauth/authorize/validate?<query>`.
	ValidateAuthorization,
	/// `POST /oauth/authorize/confirm`.
	ConfirmAuthorization,
}
impl Operation {
	/// HTTP verb.
	pub const fn method(self) -> ApiMethod {
		match self {
			Operation::Me | Operation::ValidateAuthorization => ApiMethod::Get,
			Operation::Login | Operation::Register | Operation::ConfirmAuthorization =>
				ApiMethod::Post,
		}
	}

	/// Path relative to the API base, without query.
	pub const fn path(self) -> &'static str {
		match self {
			Operation::Login => "/auth/login",
			Operation::Register => "/auth/register",
			Operation::Me => "/auth/me",
			Operation::ValidateAuthorization => "/oauth/authorize/validate",
			Operation::ConfirmAuthorization => "/oauth/authorize/confirm",
		}
	}

	/// Stable label suitable for errors and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Login => "login",
			Operation::Register => "register",
			Operation::Me => "me",
			Operation::ValidateAuthorization => "validate_authorization",
			Operation::ConfirmAuthorization => "confirm_authorization",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Field-level validation failures keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);
impl FieldErrors {
	/// Records a message for `field`, keeping the first one.
	pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
		self.0.entry(field).or_insert_with(|| message.into());
	}

	/// Message for `field`, if any.
	pub fn get(&self, field: &str) -> Option<&str> {
		self.0.get(field).map(String::as_str)
	}

	/// Returns true when no field failed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of failing fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates over field/message pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		self.0.iter().map(|(field, message)| (*field, message.as_str()))
	}

	/// `Ok(())` when empty, otherwise `Err(self)`.
	pub fn into_result(self) -> Result<(), FieldErrors> {
		if self.is_empty() { Ok(()) } else { Err(self) }
	}
}
impl Display for FieldErrors {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, (field, message)) in self.iter().enumerate() {
			if idx > 0 {
				f.write_str("; ")?;
			}

			write!(f, "{field}: {message}")?;
		}

		Ok(())
	}
}
impl StdError for FieldErrors {}
