//! Standalone Docker Distribution token gateway.
//!
//! Reads its policy from the environment, installs the JSON tracing subscriber,
//! and serves the token endpoint until interrupted. Fatal errors are reported
//! through tracing so every diagnostic shares one log stream.

// std
use std::process::ExitCode;
// crates.io
use oauth2_gateway::{http::ReqwestTokenClient, obs, policy::CredentialPolicy, server::Gateway};

#[tokio::main]
async fn main() -> ExitCode {
	obs::init_tracing();

	let policy = CredentialPolicy::from_env();
	let http_client = match ReqwestTokenClient::instrumented() {
		Ok(client) => client,
		Err(error) => {
			tracing::error!(error = %error, "failed to build http client");

			return ExitCode::FAILURE;
		},
	};

	if let Err(error) = Gateway::with_http_client(policy, http_client).run().await {
		tracing::error!(error = %error, "token gateway exited");

		return ExitCode::FAILURE;
	}

	ExitCode::SUCCESS
}
