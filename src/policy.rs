//! Process-wide credential policy: environment-backed configuration plus the
//! credential resolution decision order.

// self
use crate::{
	_prelude::*,
	auth::{
		BasicCredentials, IdentityAssertion, ResolvedCredential, SERVICE_ACCOUNT_TOKEN_PATH, Secret,
	},
};

/// Immutable credential policy loaded once at startup and shared behind [`Arc`].
///
/// Request handling never reads the environment; everything a request needs is
/// captured here, including the workload identity assertion.
#[derive(Clone, Debug, Default)]
pub struct CredentialPolicy {
	/// OAuth 2.0 client identifier sent with every grant.
	pub client_id: String,
	/// Token endpoint URL, parsed per-request so a malformed value surfaces as a
	/// construction error instead of failing startup.
	pub token_endpoint: String,
	/// Extra scope joined onto every outbound grant.
	pub extra_scope: String,
	/// Anonymous fallback username; only honored together with the password.
	pub anonymous_username: Option<String>,
	/// Anonymous fallback password; only honored together with the username.
	pub anonymous_password: Option<Secret>,
	/// Cached workload identity assertion; `Some` enables the anonymous assertion
	/// fallback even when the cached value is empty.
	pub anonymous_assertion: Option<IdentityAssertion>,
	/// Username marker that reinterprets the password field as a bearer assertion.
	pub passthrough_username: Option<String>,
}
impl CredentialPolicy {
	/// Loads the policy from process environment variables.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads the policy through a caller-supplied variable lookup.
	///
	/// Lookup keys are `CLIENT_ID`, `TOKEN_URL`, `SCOPE`, `ANON_USERNAME`,
	/// `ANON_PASSWORD`, `ANON_KUBE_JWT`, and `PASS_JWT_USERNAME`. Loading never
	/// fails; empty or absent variables disable their branch. A non-empty
	/// `ANON_KUBE_JWT` reads the identity assertion from
	/// [`SERVICE_ACCOUNT_TOKEN_PATH`] exactly once.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

		Self {
			client_id: get("CLIENT_ID").unwrap_or_default(),
			token_endpoint: get("TOKEN_URL").unwrap_or_default(),
			extra_scope: get("SCOPE").unwrap_or_default(),
			anonymous_username: get("ANON_USERNAME"),
			anonymous_password: get("ANON_PASSWORD").map(Secret::new),
			anonymous_assertion: get("ANON_KUBE_JWT")
				.map(|_| IdentityAssertion::load(SERVICE_ACCOUNT_TOKEN_PATH)),
			passthrough_username: get("PASS_JWT_USERNAME"),
		}
	}

	/// Resolves the outbound credential for one request.
	///
	/// Decision order, first match wins: explicit Basic-Auth, the anonymous
	/// identity assertion, the anonymous username/password pair, then
	/// [`Error::AuthenticationRequired`]. The passthrough override applies only to
	/// user/password credentials whose username equals the configured marker; the
	/// password is then reinterpreted as a bearer assertion.
	pub fn resolve(&self, basic: Option<BasicCredentials>) -> Result<ResolvedCredential> {
		let resolved = if let Some(BasicCredentials { username, password }) = basic {
			ResolvedCredential::UserPassword { username, password }
		} else if let Some(assertion) = &self.anonymous_assertion {
			return Ok(ResolvedCredential::client_assertion(assertion.token().clone()));
		} else if let (Some(username), Some(password)) =
			(&self.anonymous_username, &self.anonymous_password)
		{
			ResolvedCredential::user_password(username.clone(), password.clone())
		} else {
			return Err(Error::AuthenticationRequired);
		};

		Ok(self.apply_passthrough(resolved))
	}

	fn apply_passthrough(&self, resolved: ResolvedCredential) -> ResolvedCredential {
		match (&self.passthrough_username, resolved) {
			(Some(marker), ResolvedCredential::UserPassword { username, password })
				if *marker == username =>
				ResolvedCredential::ClientAssertion { assertion: password },
			(_, resolved) => resolved,
		}
	}
}
