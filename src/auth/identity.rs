//! Workload identity assertion sourced from the mounted service account token.

// std
use std::{fs, path::Path};
// self
use crate::auth::Secret;

/// Mounted service account token path read at startup.
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Workload identity assertion cached once at startup and reused for every anonymous
/// exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityAssertion(Secret);
impl IdentityAssertion {
	/// Wraps an already-loaded assertion value.
	pub fn new(token: impl Into<String>) -> Self {
		Self(Secret::new(token))
	}

	/// Reads the assertion from `path` once.
	///
	/// A read failure is tolerated: the gateway logs a warning and caches an empty
	/// assertion, so anonymous exchanges still go out with an empty
	/// `client_assertion` field. The file content is used verbatim, without
	/// trimming.
	pub fn load(path: impl AsRef<Path>) -> Self {
		let path = path.as_ref();

		match fs::read_to_string(path) {
			Ok(token) => Self::new(token),
			Err(error) => {
				tracing::warn!(
					path = %path.display(),
					error = %error,
					"failed to read mounted secrets"
				);

				Self::new(String::new())
			},
		}
	}

	/// Returns the cached assertion.
	pub fn token(&self) -> &Secret {
		&self.0
	}
}
