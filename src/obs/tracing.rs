// crates.io
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
// self
use crate::{http::PhaseTimings, obs::CredentialKind};

/// Filter applied when `RUST_LOG` is unset.
///
/// Phase events are emitted at trace level, so the gateway's own target defaults
/// to `trace` while everything else stays at `info`.
pub const DEFAULT_LOG_FILTER: &str = "info,oauth2_gateway=trace";

/// Installs the global JSON tracing subscriber.
///
/// Call this once at startup. Embedders that already install their own
/// subscriber should skip this and rely on the gateway's `tracing` events
/// flowing into theirs; calling it twice panics.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

	tracing_subscriber::registry().with(fmt::layer().json().with_filter(filter)).init();
}

/// Emits one trace event carrying the request-scoped phase durations of an exchange.
pub fn trace_exchange_phases(kind: CredentialKind, timings: &PhaseTimings) {
	tracing::trace!(
		credential = kind.as_str(),
		first_byte_ms = timings.first_byte.as_millis() as u64,
		body_read_ms = timings.body_read.as_millis() as u64,
		total_ms = timings.total.as_millis() as u64,
		"token exchange round trip"
	);
}
