//! Rust’s drop-in token gateway for container registries: translate Docker Distribution token
//! requests into `client_credentials` exchanges with transport-aware observability.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod exchange;
pub mod http;
pub mod obs;
pub mod policy;
pub mod server;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{http::ReqwestTokenClient, policy::CredentialPolicy, server::Gateway};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestTokenClient>;

	/// Builds a credential policy pointed at the provided token endpoint, carrying the client
	/// identifier and extra scope used across integration tests.
	pub fn test_policy(token_endpoint: impl Into<String>) -> CredentialPolicy {
		CredentialPolicy {
			client_id: "gateway-client".into(),
			token_endpoint: token_endpoint.into(),
			extra_scope: "audience:registry".into(),
			..Default::default()
		}
	}

	/// Constructs a [`Gateway`] backed by the plain reqwest transport used across integration
	/// tests.
	pub fn build_reqwest_test_gateway(policy: CredentialPolicy) -> ReqwestTestGateway {
		Gateway::with_http_client(policy, ReqwestTokenClient::default())
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::{Duration, Instant},
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use axum;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
