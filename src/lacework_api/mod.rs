/// Lacework API integration module
///
/// This module provides what an AWS account-onboarding workflow needs from
/// Lacework: access tokens backed by a secret store, and the lifecycle of
/// CloudAccounts integrations.
///
/// ## Onboarding Flow
///
/// 1. Caller names the secret holding the Lacework API key pair
/// 2. The key pair is exchanged for an access token (default 24h validity)
/// 3. The token and its expiry are written back into the same secret
/// 4. CloudAccounts integrations are created, searched and deleted with the token,
///    optionally scoped to a sub-account
pub mod client;
pub mod config;
pub mod credentials;
pub mod onboarding;
pub mod resources;
pub mod types;

pub use client::LaceworkClient;
pub use config::LaceworkConfig;
pub use credentials::{get_secret, update_secret, CredentialRecord};
pub use onboarding::LaceworkOnboarding;
pub use resources::*;
pub use types::{AccessToken, ApiError, LaceworkError};
