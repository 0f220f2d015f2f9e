//! Observability helpers for the gateway's token exchanges.
//!
//! Tracing is always on: each exchange emits a trace event carrying its phase
//! durations, and the instrumented HTTP client reports DNS and connect times on
//! its own events. Enable `metrics` to additionally increment the
//! `oauth2_gateway_request_total` counter for every attempt/success/failure,
//! labeled by `credential` + `outcome`; without the feature
//! [`record_exchange_outcome`] compiles to a no-op so call sites never need
//! feature gates.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::ResolvedCredential};

/// Credential kinds forwarded to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
	/// Username and password pair.
	UserPassword,
	/// JWT-bearer client assertion.
	ClientAssertion,
}
impl CredentialKind {
	/// Returns a stable label suitable for metric or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::UserPassword => "user_password",
			CredentialKind::ClientAssertion => "client_assertion",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<&ResolvedCredential> for CredentialKind {
	fn from(credential: &ResolvedCredential) -> Self {
		match credential {
			ResolvedCredential::UserPassword { .. } => CredentialKind::UserPassword,
			ResolvedCredential::ClientAssertion { .. } => CredentialKind::ClientAssertion,
		}
	}
}

/// Outcome labels recorded for each exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeOutcome {
	/// Entry to the exchanger.
	Attempt,
	/// Token endpoint round trip produced a decodable response.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl ExchangeOutcome {
	/// Returns a stable label suitable for metric or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExchangeOutcome::Attempt => "attempt",
			ExchangeOutcome::Success => "success",
			ExchangeOutcome::Failure => "failure",
		}
	}
}
impl Display for ExchangeOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::Secret;

	#[test]
	fn labels_are_stable() {
		assert_eq!(CredentialKind::UserPassword.to_string(), "user_password");
		assert_eq!(CredentialKind::ClientAssertion.to_string(), "client_assertion");
		assert_eq!(ExchangeOutcome::Attempt.to_string(), "attempt");
		assert_eq!(ExchangeOutcome::Success.to_string(), "success");
		assert_eq!(ExchangeOutcome::Failure.to_string(), "failure");
	}

	#[test]
	fn kind_follows_credential_variant() {
		let pair = ResolvedCredential::user_password("alice", Secret::new("pw"));
		let assertion = ResolvedCredential::client_assertion(Secret::new("jwt"));

		assert_eq!(CredentialKind::from(&pair), CredentialKind::UserPassword);
		assert_eq!(CredentialKind::from(&assertion), CredentialKind::ClientAssertion);
	}
}
