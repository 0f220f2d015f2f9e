//! Axum server exposing the Docker Distribution token endpoint.
//!
//! `GET`/`POST /token` resolves the inbound credential against the configured
//! policy, performs the outbound exchange, and shapes the reply for the
//! requesting registry client. Only missing credentials produce a `401`
//! challenge; failures past authentication collapse to empty `200` responses so
//! registry clients fall back to anonymous pulls instead of hard-failing.

// std
use std::{io, net::SocketAddr};
// crates.io
use axum::{
	Router,
	extract::{RawQuery, State},
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::BasicCredentials,
	exchange::TokenReply,
	http::TokenHttpClient,
	policy::CredentialPolicy,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTokenClient;

/// Address the standalone gateway binary listens on.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9001";
/// Challenge sent with every `401` so Docker clients retry with Basic credentials.
pub const WWW_AUTHENTICATE_CHALLENGE: &str =
	"Basic realm=\"distribution-oauth\", charset=\"UTF-8\"";

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTokenClient>;

/// Translates Docker Distribution token requests into `client_credentials` exchanges.
///
/// The gateway owns the credential policy and the HTTP transport so the handler
/// and exchange layers can share them across requests; clones observe the same
/// transport.
pub struct Gateway<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Credential resolution policy applied to every inbound request.
	pub policy: Arc<CredentialPolicy>,
	/// HTTP client used for every outbound token endpoint request.
	pub http_client: Arc<C>,
}
impl<C> Gateway<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_http_client(policy: CredentialPolicy, http_client: impl Into<Arc<C>>) -> Self {
		Self { policy: Arc::new(policy), http_client: http_client.into() }
	}

	/// Builds the axum router serving the token and liveness endpoints.
	pub fn router(&self) -> Router {
		Router::new()
			.route("/token", get(issue_token::<C>).post(issue_token::<C>))
			.route("/live", get(live))
			.layer(TraceLayer::new_for_http())
			.with_state(self.clone())
	}

	/// Serves the gateway on [`DEFAULT_LISTEN_ADDR`] until an interrupt arrives.
	pub async fn run(self) -> io::Result<()> {
		let listener = TcpListener::bind(DEFAULT_LISTEN_ADDR).await?;
		let local_addr = listener.local_addr()?;

		tracing::info!(addr = %local_addr, "starting token gateway");

		axum::serve(listener, self.router()).with_graceful_shutdown(shutdown_signal()).await
	}

	/// Serves the gateway on `addr` in a background task, returning the bound address.
	///
	/// The server stops once `shutdown` resolves. Binding to port `0` and reading
	/// the returned address is the intended way to drive a live gateway from tests
	/// or embedders.
	pub async fn run_with_shutdown(
		self,
		addr: SocketAddr,
		shutdown: impl Future<Output = ()> + Send + 'static,
	) -> io::Result<SocketAddr> {
		let listener = TcpListener::bind(addr).await?;
		let local_addr = listener.local_addr()?;

		tracing::info!(addr = %local_addr, "starting token gateway");
		tokio::spawn(async move {
			axum::serve(listener, self.router()).with_graceful_shutdown(shutdown).await.ok();
		});

		Ok(local_addr)
	}
}
impl<C> Clone for Gateway<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self { policy: self.policy.clone(), http_client: self.http_client.clone() }
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway").field("policy", &self.policy).finish()
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTokenClient> {
	/// Creates a gateway backed by a plain reqwest transport.
	///
	/// Pair [`ReqwestTokenClient::instrumented`] with [`Gateway::with_http_client`]
	/// when connection-phase trace events are wanted.
	pub fn new(policy: CredentialPolicy) -> Self {
		Self::with_http_client(policy, ReqwestTokenClient::default())
	}
}

/// Query parameters accepted by the token endpoint.
#[derive(Clone, Debug, Default)]
pub struct TokenQuery {
	/// Registry service identifier, logged but otherwise unused.
	pub service: Option<String>,
	/// Inbound registry scope, joined with the configured extra scope.
	pub scope: Option<String>,
	/// Literal `"true"` selects the offline reply shape.
	pub offline_token: Option<String>,
}
impl TokenQuery {
	/// Parses a raw query string, keeping the first value of each recognized parameter.
	///
	/// Docker clients send `scope` more than once for multi-repository operations
	/// such as cross-repository blob mounts; duplicates after the first are
	/// ignored rather than rejected.
	pub fn parse(raw: &str) -> Self {
		let mut query = Self::default();

		for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
			let slot = match &*key {
				"service" => &mut query.service,
				"scope" => &mut query.scope,
				"offline_token" => &mut query.offline_token,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		query
	}

	/// Whether the request asked for the offline reply shape.
	pub fn offline(&self) -> bool {
		self.offline_token.as_deref() == Some("true")
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		match self {
			Error::AuthenticationRequired => (
				StatusCode::UNAUTHORIZED,
				[(header::WWW_AUTHENTICATE, WWW_AUTHENTICATE_CHALLENGE)],
				"Authorization required\n",
			)
				.into_response(),
			_ => StatusCode::OK.into_response(),
		}
	}
}

async fn issue_token<C>(
	State(gateway): State<Gateway<C>>,
	RawQuery(raw): RawQuery,
	headers: HeaderMap,
) -> Response
where
	C: ?Sized + TokenHttpClient,
{
	let query = TokenQuery::parse(raw.as_deref().unwrap_or_default());
	let basic = headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(BasicCredentials::from_header);
	let credential = match gateway.policy.resolve(basic) {
		Ok(credential) => credential,
		Err(error) => return error.into_response(),
	};
	let user_agent = headers.get(header::USER_AGENT).and_then(|value| value.to_str().ok());
	let remote =
		headers.get("x-forwarded-for").and_then(|value| value.to_str().ok()).unwrap_or_default();

	tracing::info!(
		service = query.service.as_deref().unwrap_or_default(),
		scope = query.scope.as_deref().unwrap_or_default(),
		username = credential.username().unwrap_or_default(),
		remote,
		"token request"
	);

	match gateway.exchange_token(&credential, query.scope.as_deref(), user_agent).await {
		Ok(response) => token_reply_response(TokenReply::shape(query.offline(), response)),
		Err(error @ Error::UpstreamRequest { .. }) => {
			tracing::warn!(error = ?error, "failed to create token request");

			error.into_response()
		},
		Err(error) => {
			tracing::warn!(error = ?error, "failed to send token request");

			error.into_response()
		},
	}
}

async fn live() -> StatusCode {
	StatusCode::NO_CONTENT
}

fn token_reply_response(reply: TokenReply) -> Response {
	match serde_json::to_vec(&reply) {
		Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
		Err(source) => {
			let error = Error::ResponseWrite { source };

			tracing::warn!(error = ?error, "failed to write token response");

			StatusCode::OK.into_response()
		},
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %error, "failed to install interrupt handler");

			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(error) => {
				tracing::error!(error = %error, "failed to install terminate handler");

				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutdown signal received");
}
