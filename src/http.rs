//! Transport primitives for the outbound token exchange.
//!
//! The module exposes [`TokenHttpClient`] alongside [`PhaseTimings`] and
//! [`PhaseTimingSlot`] so custom HTTP clients can integrate without losing the
//! gateway's instrumentation hooks. Implementations call [`PhaseTimingSlot::take`]
//! before dispatching a request and [`PhaseTimingSlot::store`] once the response
//! body has been read, so phases from prior requests never leak into new ones.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
#[cfg(feature = "reqwest")] use std::task::{Context, Poll};
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	dns::{Addrs, Name, Resolve, Resolving},
	header::{CONTENT_TYPE, USER_AGENT},
};
#[cfg(feature = "reqwest")]
use tower::{Layer, Service};
// self
use crate::_prelude::*;

/// Boxed future type returned by [`TokenHttpClient`] implementations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing the outbound form POST.
///
/// The trait is the gateway's only dependency on an HTTP stack. Callers provide an
/// implementation (typically behind `Arc<T>` where `T: TokenHttpClient`) and the
/// exchanger hands each call a fresh [`PhaseTimingSlot`] clone for instrumentation.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes the token endpoint POST described by `request`.
	///
	/// # Timing Contract
	///
	/// - Call [`PhaseTimingSlot::take`] before dispatching so stale phases never
	///   leak across requests.
	/// - Store the measured phases with [`PhaseTimingSlot::store`] once the body
	///   has been read; construction and transport failures leave the slot empty.
	fn post_form(
		&self,
		request: TokenEndpointRequest,
		timings: PhaseTimingSlot,
	) -> TransportFuture<'_, TokenEndpointReply>;
}

/// Fully-described outbound token endpoint request.
///
/// The body arrives already form-encoded; transports only attach headers and
/// execute.
#[derive(Clone, Debug)]
pub struct TokenEndpointRequest {
	/// Token endpoint URL.
	pub endpoint: Url,
	/// `application/x-www-form-urlencoded` body.
	pub body: String,
	/// Inbound `User-Agent` forwarded unchanged; `None` sends no user agent at all.
	pub user_agent: Option<String>,
}

/// Raw token endpoint response handed back to the exchanger.
#[derive(Clone, Debug)]
pub struct TokenEndpointReply {
	/// HTTP status code returned by the token endpoint.
	pub status: u16,
	/// Fully-buffered response body.
	pub body: Vec<u8>,
}

/// Durations of the request-scoped phases of one exchange.
///
/// Connection-scoped phases (DNS, connect) are reported by the instrumented
/// client instead, because pooling reuses them across requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTimings {
	/// Time from dispatch until the response headers arrived.
	pub first_byte: Duration,
	/// Time spent reading the response body.
	pub body_read: Duration,
	/// Total round trip including the body read.
	pub total: Duration,
}

/// Thread-safe slot for sharing [`PhaseTimings`] between transport and flow layers.
///
/// The exchanger creates a fresh slot for each request and reads the captured
/// phases immediately after the transport resolves. Transport implementations
/// borrow the slot just long enough to call [`store`](PhaseTimingSlot::store).
#[derive(Clone, Debug, Default)]
pub struct PhaseTimingSlot(Arc<Mutex<Option<PhaseTimings>>>);
impl PhaseTimingSlot {
	/// Stores the measured phases for the current request.
	pub fn store(&self, timings: PhaseTimings) {
		*self.0.lock() = Some(timings);
	}

	/// Returns the captured phases, if any, consuming them from the slot.
	pub fn take(&self) -> Option<PhaseTimings> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`Default`] wires a plain client; [`ReqwestTokenClient::instrumented`] builds one
/// whose resolver and connector also report connection-scoped timings at trace
/// level.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTokenClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTokenClient {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that reports DNS and connect durations at trace level.
	pub fn instrumented() -> Result<Self, ReqwestError> {
		let client = ReqwestClient::builder()
			.dns_resolver(Arc::new(TimedDnsResolver))
			.connector_layer(ConnectTimingLayer)
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTokenClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTokenClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestTokenClient {
	fn post_form(
		&self,
		request: TokenEndpointRequest,
		timings: PhaseTimingSlot,
	) -> TransportFuture<'_, TokenEndpointReply> {
		Box::pin(async move {
			timings.take();

			let started = Instant::now();
			let mut builder = self
				.0
				.post(request.endpoint)
				.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
				.body(request.body);

			if let Some(user_agent) = request.user_agent {
				builder = builder.header(USER_AGENT, user_agent);
			}

			let response = builder.send().await?;
			let first_byte = started.elapsed();
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();
			let total = started.elapsed();

			timings.store(PhaseTimings {
				first_byte,
				body_read: total.saturating_sub(first_byte),
				total,
			});

			Ok(TokenEndpointReply { status, body })
		})
	}
}

/// DNS resolver that reports lookup duration at trace level.
///
/// Resolution delegates to the runtime's host lookup; the connector replaces the
/// placeholder port on every returned address.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TimedDnsResolver;
#[cfg(feature = "reqwest")]
impl Resolve for TimedDnsResolver {
	fn resolve(&self, name: Name) -> Resolving {
		Box::pin(async move {
			let started = Instant::now();
			let addrs = tokio::net::lookup_host((name.as_str(), 0_u16)).await?;
			let addrs: Addrs = Box::new(addrs.collect::<Vec<_>>().into_iter());

			tracing::trace!(
				host = name.as_str(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				"dns lookup done"
			);

			Ok(addrs)
		})
	}
}

/// Tower layer wrapping the connector to report connection establishment time.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectTimingLayer;
#[cfg(feature = "reqwest")]
impl<S> Layer<S> for ConnectTimingLayer {
	type Service = ConnectTiming<S>;

	fn layer(&self, inner: S) -> Self::Service {
		ConnectTiming { inner }
	}
}

/// Connector wrapper produced by [`ConnectTimingLayer`].
///
/// TCP and TLS establishment are a single phase here; the transport offers no seam
/// between them.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ConnectTiming<S> {
	inner: S,
}
#[cfg(feature = "reqwest")]
impl<S, Request> Service<Request> for ConnectTiming<S>
where
	S: Service<Request>,
	S::Future: 'static + Send,
{
	type Error = S::Error;
	type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;
	type Response = S::Response;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request) -> Self::Future {
		let started = Instant::now();
		let connecting = self.inner.call(request);

		Box::pin(async move {
			let connected = connecting.await;

			tracing::trace!(
				elapsed_ms = started.elapsed().as_millis() as u64,
				ok = connected.is_ok(),
				"connection established"
			);

			connected
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn phase_timing_slot_roundtrip() {
		let slot = PhaseTimingSlot::default();

		assert!(slot.take().is_none());

		let timings = PhaseTimings {
			first_byte: Duration::from_millis(5),
			body_read: Duration::from_millis(2),
			total: Duration::from_millis(7),
		};

		slot.store(timings);

		assert_eq!(slot.take(), Some(timings));
		assert!(slot.take().is_none(), "Take must consume the stored phases.");
	}

	#[test]
	fn phase_timing_slot_clones_share_state() {
		let slot = PhaseTimingSlot::default();
		let transport_side = slot.clone();

		transport_side.store(PhaseTimings::default());

		assert!(slot.take().is_some());
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn connect_timing_layer_passes_through() {
		use tower::{ServiceExt, service_fn};

		let service = ConnectTimingLayer.layer(service_fn(|value: u8| async move {
			Ok::<_, std::convert::Infallible>(value + 1)
		}));
		let out = service.oneshot(7).await.expect("Connector wrapper must pass values through.");

		assert_eq!(out, 8);
	}
}
