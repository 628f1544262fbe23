//! Client-side half of an OAuth 2.0 / OIDC Authorization Code + PKCE flow.
//!
//! The crate validates inbound authorize requests, turns every backend outcome into one
//! normalized result shape, builds the redirects sent back to relying parties, and drives the
//! authenticate → login → confirm sequence as an explicit state machine.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod oidc;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
