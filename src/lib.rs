//! Lacework Onboarding SDK
//!
//! A Rust library for wiring AWS accounts into Lacework during account onboarding.
//!
//! This SDK provides:
//! - Access token issuance from the Lacework API key pair, persisted to a secret store
//! - Secret stores for AWS Secrets Manager, the OS keychain and in-process use
//! - Creation, lookup and deletion of CloudAccounts integrations (`AwsCtSqs`, `AwsCfg`)
//! - Sub-account scoping for multi-tenant Lacework deployments
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lacework_onboarding::{
//!     CloudTrailAccount, LaceworkConfig, LaceworkOnboarding, SecretsManagerStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! lacework_onboarding::logging::init();
//!
//! let config = LaceworkConfig::from_env()?;
//! let store = Arc::new(SecretsManagerStore::from_env().await);
//! let onboarding = LaceworkOnboarding::new(config, store);
//!
//! // Create a CloudTrail integration (token is issued or refreshed as needed)
//! let created = onboarding
//!     .add_cloudtrail_account(&CloudTrailAccount {
//!         name: "acme-prod-cloudtrail".to_string(),
//!         external_id: "lweid:aws:v2:acme:123456789012:abc".to_string(),
//!         role_arn: "arn:aws:iam::123456789012:role/LaceworkCrossAccount".to_string(),
//!         sqs_queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/lacework".to_string(),
//!     })
//!     .await?;
//! println!("Created integration {:?}", created.intg_guid);
//!
//! // Remove it again on stack deletion
//! let outcome = onboarding.remove_cloud_account("acme-prod-cloudtrail").await?;
//! println!("Deleted: {}", outcome.deleted());
//! # Ok(())
//! # }
//! ```

pub mod lacework_api;
pub mod logging;
pub mod storage;

// Re-export commonly used types and functions
pub use lacework_api::{
    client::LaceworkClient,
    config::LaceworkConfig,
    credentials::{get_secret, update_secret, CredentialRecord},
    onboarding::LaceworkOnboarding,
    resources::{
        AccountLookup, CloudAccountRequest, CloudAccountType, CloudTrailAccount, ConfigAccount,
        CreatedCloudAccount, DeleteOutcome, SearchRequest, SearchResponse,
    },
    types::{AccessToken, ApiError, LaceworkError},
};
pub use storage::{
    KeyringSecretStore, MemorySecretStore, SecretStore, SecretsManagerStore, StorageError,
};
