//! Auth-domain credential models: Basic-Auth decoding, resolved credentials, and the
//! workload identity assertion.

pub mod basic;
pub mod credential;
pub mod identity;
pub mod secret;

pub use basic::*;
pub use credential::*;
pub use identity::*;
pub use secret::*;
