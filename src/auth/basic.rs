//! Basic-Auth header decoding for the inbound token surface.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::Secret};

/// Username/password pair decoded from an inbound `Authorization: Basic` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicCredentials {
	/// Username half of the decoded pair.
	pub username: String,
	/// Password half of the decoded pair.
	pub password: Secret,
}
impl BasicCredentials {
	/// Builds a credential pair from already-decoded parts.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: Secret::new(password.into()) }
	}

	/// Decodes an `Authorization` header value into a credential pair.
	///
	/// Returns `None` for anything that is not well-formed Basic-Auth (wrong scheme,
	/// invalid base64, missing colon separator, non-UTF-8 payload); the resolver
	/// treats that as absent credentials.
	pub fn from_header(value: &str) -> Option<Self> {
		let payload = strip_basic_scheme(value)?;
		let decoded = STANDARD.decode(payload).ok()?;
		let decoded = String::from_utf8(decoded).ok()?;
		let (username, password) = decoded.split_once(':')?;

		Some(Self::new(username, password))
	}
}

fn strip_basic_scheme(value: &str) -> Option<&str> {
	const SCHEME: &str = "Basic ";

	let (scheme, payload) = value.split_at_checked(SCHEME.len())?;

	scheme.eq_ignore_ascii_case(SCHEME).then_some(payload)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine, engine::general_purpose::STANDARD};
	// self
	use super::*;

	fn encode(raw: &str) -> String {
		format!("Basic {}", STANDARD.encode(raw))
	}

	#[test]
	fn from_header_decodes_pair() {
		let credentials = BasicCredentials::from_header(&encode("alice:wonder land"))
			.expect("Well-formed Basic-Auth should decode.");

		assert_eq!(credentials.username, "alice");
		assert_eq!(credentials.password.expose(), "wonder land");
	}

	#[test]
	fn from_header_scheme_is_case_insensitive() {
		let header = format!("bASIC {}", STANDARD.encode("svc:token"));
		let credentials = BasicCredentials::from_header(&header)
			.expect("Scheme comparison should ignore ASCII case.");

		assert_eq!(credentials.username, "svc");
	}

	#[test]
	fn from_header_keeps_colons_in_password() {
		let credentials = BasicCredentials::from_header(&encode("user:pa:ss:word"))
			.expect("Only the first colon should split the pair.");

		assert_eq!(credentials.username, "user");
		assert_eq!(credentials.password.expose(), "pa:ss:word");
	}

	#[test]
	fn from_header_allows_empty_password() {
		let credentials = BasicCredentials::from_header(&encode("lonely:"))
			.expect("An empty password is still a valid pair.");

		assert_eq!(credentials.username, "lonely");
		assert_eq!(credentials.password.expose(), "");
	}

	#[test]
	fn from_header_rejects_malformed_values() {
		assert_eq!(BasicCredentials::from_header("Bearer abc"), None);
		assert_eq!(BasicCredentials::from_header("Basic not-base64!!"), None);
		assert_eq!(BasicCredentials::from_header(&encode("no-colon-here")), None);
		assert_eq!(BasicCredentials::from_header("Basic"), None);
		assert_eq!(BasicCredentials::from_header(""), None);
		assert_eq!(BasicCredentials::from_header("Bä"), None);
	}

	#[test]
	fn from_header_rejects_non_utf8_payload() {
		let header = format!("Basic {}", STANDARD.encode([0x61, 0x3A, 0xFF, 0xFE]));

		assert_eq!(BasicCredentials::from_header(&header), None);
	}
}
