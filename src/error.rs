//! Gateway-level error types shared across resolution, exchange, and the HTTP surface.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No credential could be resolved for the inbound request.
	#[error("Authorization required.")]
	AuthenticationRequired,
	/// Outbound token request could not be constructed.
	#[error("Failed to build the token endpoint request.")]
	UpstreamRequest {
		/// Underlying construction failure.
		#[source]
		source: BoxError,
	},
	/// Transport failure (DNS, TCP, TLS) while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	UpstreamTransport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	UpstreamDecode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// Reply serialization failed after a successful exchange.
	#[error("Failed to encode the token reply.")]
	ResponseWrite {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::error::Error,
	},
}
impl Error {
	/// Wraps an outbound request construction failure.
	pub fn upstream_request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::UpstreamRequest { source: Box::new(src) }
	}

	/// Wraps a transport-specific network error.
	pub fn upstream_transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::UpstreamTransport { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() { Self::upstream_request(e) } else { Self::upstream_transport(e) }
	}
}
