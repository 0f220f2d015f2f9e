// self
use crate::obs::{CredentialKind, ExchangeOutcome};

/// Records an exchange outcome via the global metrics recorder (when enabled).
pub fn record_exchange_outcome(kind: CredentialKind, outcome: ExchangeOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_gateway_request_total",
			"credential" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
