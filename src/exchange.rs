//! Outbound `client_credentials` exchange and registry reply shaping.
//!
//! Whatever the inbound credential looked like, the token endpoint always sees a
//! `grant_type=client_credentials` form POST carrying the configured `client_id`
//! and the joined scope. The response decode is lenient so partially-conforming
//! authorization servers still produce a usable registry reply.

// crates.io
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::{CLIENT_ASSERTION_TYPE_JWT_BEARER, ResolvedCredential, Secret},
	http::{PhaseTimingSlot, TokenEndpointRequest, TokenHttpClient},
	obs::{self, CredentialKind, ExchangeOutcome},
	server::Gateway,
};

/// Decoded token endpoint response body.
///
/// Every field is optional and unknown fields are ignored. The endpoint's HTTP
/// status code is never consulted. `token` mirrors the legacy field some servers
/// return alongside `access_token`; it is decoded for completeness but the reply
/// shaper never reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IssuerTokenResponse {
	/// OAuth2 access token.
	pub access_token: Option<Secret>,
	/// Legacy token field.
	pub token: Option<Secret>,
	/// OpenID Connect ID token.
	pub id_token: Option<Secret>,
}

/// Reply returned to the registry client, shaped by the `offline_token` flag.
///
/// Serialization always emits exactly two keys. Offline requests receive
/// `access_token` + `id_token`, ordinary registry requests receive `token` +
/// `id_token`, and values missing upstream serialize as empty strings rather
/// than disappearing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenReply {
	/// Shape for `offline_token=true` requests.
	Offline {
		/// OAuth2 access token.
		access_token: Secret,
		/// OpenID Connect ID token.
		id_token: Secret,
	},
	/// Shape for ordinary registry token requests.
	Registry {
		/// Registry bearer token.
		token: Secret,
		/// OpenID Connect ID token.
		id_token: Secret,
	},
}
impl TokenReply {
	/// Shapes the outbound reply from a decoded token endpoint response.
	///
	/// Registry replies carry the upstream `access_token` under the `token` key.
	pub fn shape(offline: bool, response: IssuerTokenResponse) -> Self {
		let access_token = response.access_token.unwrap_or_default();
		let id_token = response.id_token.unwrap_or_default();

		if offline {
			TokenReply::Offline { access_token, id_token }
		} else {
			TokenReply::Registry { token: access_token, id_token }
		}
	}
}

impl<C> Gateway<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Exchanges one resolved credential for a token endpoint response.
	///
	/// The inbound `User-Agent` is forwarded unchanged when present. Malformed
	/// response bodies decode to [`IssuerTokenResponse::default`] after a warning;
	/// only construction and transport failures surface as errors.
	pub async fn exchange_token(
		&self,
		credential: &ResolvedCredential,
		scope: Option<&str>,
		user_agent: Option<&str>,
	) -> Result<IssuerTokenResponse> {
		let kind = CredentialKind::from(credential);

		obs::record_exchange_outcome(kind, ExchangeOutcome::Attempt);

		match self.exchange_token_inner(kind, credential, scope, user_agent).await {
			Ok(response) => {
				obs::record_exchange_outcome(kind, ExchangeOutcome::Success);

				Ok(response)
			},
			Err(Error::UpstreamDecode { source }) => {
				obs::record_exchange_outcome(kind, ExchangeOutcome::Failure);

				tracing::warn!(error = %source, "failed to parse token response");

				Ok(IssuerTokenResponse::default())
			},
			Err(error) => {
				obs::record_exchange_outcome(kind, ExchangeOutcome::Failure);

				Err(error)
			},
		}
	}

	async fn exchange_token_inner(
		&self,
		kind: CredentialKind,
		credential: &ResolvedCredential,
		scope: Option<&str>,
		user_agent: Option<&str>,
	) -> Result<IssuerTokenResponse> {
		let endpoint = Url::parse(&self.policy.token_endpoint).map_err(Error::upstream_request)?;
		let scope = joined_scope(scope, &self.policy.extra_scope);
		let request = TokenEndpointRequest {
			endpoint,
			body: grant_form_body(&self.policy.client_id, credential, &scope),
			user_agent: user_agent.map(|value| value.to_owned()),
		};
		let timings = PhaseTimingSlot::default();
		let reply = self.http_client.post_form(request, timings.clone()).await?;

		if let Some(phases) = timings.take() {
			obs::trace_exchange_phases(kind, &phases);
		}

		// Decode leniently regardless of the endpoint's status code.
		let mut deserializer = serde_json::Deserializer::from_slice(&reply.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::UpstreamDecode { source })
	}
}

/// Joins the inbound scope with the statically-configured extra scope.
///
/// Both sides are kept verbatim with a single space between them. An absent
/// inbound scope therefore yields a leading space and an empty extra scope a
/// trailing one; authorization servers tokenize on whitespace either way.
pub fn joined_scope(inbound: Option<&str>, extra: &str) -> String {
	let inbound = inbound.unwrap_or_default();

	format!("{inbound} {extra}")
}

/// Encodes the `client_credentials` form body for one resolved credential.
///
/// Field order is deterministic: `client_id`, `grant_type`, the credential
/// fields, then `scope`.
pub fn grant_form_body(client_id: &str, credential: &ResolvedCredential, scope: &str) -> String {
	let mut form = FormSerializer::new(String::new());

	form.append_pair("client_id", client_id);
	form.append_pair("grant_type", "client_credentials");

	match credential {
		ResolvedCredential::UserPassword { username, password } => {
			form.append_pair("username", username);
			form.append_pair("password", password.expose());
		},
		ResolvedCredential::ClientAssertion { assertion } => {
			form.append_pair("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT_BEARER);
			form.append_pair("client_assertion", assertion.expose());
		},
	}

	form.append_pair("scope", scope);

	form.finish()
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn joined_scope_keeps_padding() {
		assert_eq!(
			joined_scope(Some("repository:library/app:pull"), "aud"),
			"repository:library/app:pull aud"
		);
		assert_eq!(joined_scope(None, "aud"), " aud");
		assert_eq!(
			joined_scope(Some("repository:library/app:pull"), ""),
			"repository:library/app:pull "
		);
		assert_eq!(joined_scope(None, ""), " ");
	}

	#[test]
	fn grant_form_body_encodes_user_password() {
		let credential = ResolvedCredential::user_password("alice", Secret::new("wonder land"));
		let body =
			grant_form_body("gateway-client", &credential, "repository:library/app:pull aud");

		assert_eq!(
			body,
			"client_id=gateway-client&grant_type=client_credentials&username=alice&\
			 password=wonder+land&scope=repository%3Alibrary%2Fapp%3Apull+aud"
		);
	}

	#[test]
	fn grant_form_body_encodes_client_assertion() {
		let credential =
			ResolvedCredential::client_assertion(Secret::new("header.payload.signature"));
		let body = grant_form_body("gateway-client", &credential, " aud");

		assert_eq!(
			body,
			"client_id=gateway-client&grant_type=client_credentials&\
			 client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3A\
			 jwt-bearer&client_assertion=header.payload.signature&scope=+aud"
		);
	}

	#[test]
	fn reply_shape_offline_uses_access_token_key() {
		let response = IssuerTokenResponse {
			access_token: Some(Secret::new("issued")),
			token: Some(Secret::new("legacy")),
			id_token: Some(Secret::new("identity")),
		};
		let value = serde_json::to_value(TokenReply::shape(true, response))
			.expect("Reply must serialize to JSON.");

		assert_eq!(value, json!({ "access_token": "issued", "id_token": "identity" }));
	}

	#[test]
	fn reply_shape_registry_renames_access_token() {
		let response = IssuerTokenResponse {
			access_token: Some(Secret::new("issued")),
			token: Some(Secret::new("legacy")),
			id_token: Some(Secret::new("identity")),
		};
		let value = serde_json::to_value(TokenReply::shape(false, response))
			.expect("Reply must serialize to JSON.");

		assert_eq!(value, json!({ "token": "issued", "id_token": "identity" }));
	}

	#[test]
	fn reply_shape_defaults_to_empty_strings() {
		let value = serde_json::to_value(TokenReply::shape(false, IssuerTokenResponse::default()))
			.expect("Reply must serialize to JSON.");

		assert_eq!(value, json!({ "token": "", "id_token": "" }));
	}

	#[test]
	fn issuer_response_decodes_leniently() {
		let body = br#"{"access_token":"issued","expires_in":300,"unknown":{"nested":true}}"#;
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let response: IssuerTokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.expect("Unknown fields must not fail the decode.");

		assert_eq!(response.access_token, Some(Secret::new("issued")));
		assert_eq!(response.token, None);
		assert_eq!(response.id_token, None);
	}
}
