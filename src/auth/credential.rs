//! Resolved outbound credential variants.

// self
use crate::auth::Secret;

/// Client assertion type URN sent alongside JWT bearer assertions.
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
	"urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Credential selected for the outbound grant; exactly one variant per request.
///
/// The exchanger consumes the variant opaquely: `UserPassword` contributes the
/// `username`/`password` form fields, `ClientAssertion` contributes
/// `client_assertion_type`/`client_assertion`, and the two field sets never mix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedCredential {
	/// Forward an explicit or anonymous username/password pair.
	UserPassword {
		/// Value of the `username` form field.
		username: String,
		/// Value of the `password` form field.
		password: Secret,
	},
	/// Forward a bearer assertion under [`CLIENT_ASSERTION_TYPE_JWT_BEARER`].
	ClientAssertion {
		/// Value of the `client_assertion` form field.
		assertion: Secret,
	},
}
impl ResolvedCredential {
	/// Builds the user/password variant.
	pub fn user_password(username: impl Into<String>, password: Secret) -> Self {
		Self::UserPassword { username: username.into(), password }
	}

	/// Builds the assertion variant.
	pub fn client_assertion(assertion: Secret) -> Self {
		Self::ClientAssertion { assertion }
	}

	/// Returns the username when the variant carries one.
	pub fn username(&self) -> Option<&str> {
		match self {
			Self::UserPassword { username, .. } => Some(username),
			Self::ClientAssertion { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn username_is_variant_scoped() {
		let pair = ResolvedCredential::user_password("alice", Secret::new("pw"));
		let assertion = ResolvedCredential::client_assertion(Secret::new("jwt"));

		assert_eq!(pair.username(), Some("alice"));
		assert_eq!(assertion.username(), None);
	}

	#[test]
	fn debug_never_reveals_secrets() {
		let pair = ResolvedCredential::user_password("alice", Secret::new("password-material"));
		let rendered = format!("{pair:?}");

		assert!(rendered.contains("alice"));
		assert!(!rendered.contains("password-material"));
	}
}
