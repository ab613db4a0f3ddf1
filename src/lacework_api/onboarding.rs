use std::sync::Arc;

use crate::lacework_api::client::LaceworkClient;
use crate::lacework_api::config::LaceworkConfig;
use crate::lacework_api::resources::{
    CloudTrailAccount, ConfigAccount, CreatedCloudAccount, DeleteOutcome,
};
use crate::lacework_api::types::LaceworkError;
use crate::storage::SecretStore;

/// Onboarding workflow for one Lacework account
///
/// Binds a client, the secret store holding the API credentials and the
/// configured sub-account, so each step only needs the integration details.
/// Account operations obtain a valid token first, reissuing it when the
/// stored one is missing or close to expiry.
pub struct LaceworkOnboarding {
    client: LaceworkClient,
    store: Arc<dyn SecretStore>,
    config: LaceworkConfig,
}

impl LaceworkOnboarding {
    pub fn new(config: LaceworkConfig, store: Arc<dyn SecretStore>) -> Self {
        let client = LaceworkClient::new(&config.host)
            .with_token_expiry(config.token_expiry_seconds)
            .with_refresh_margin(config.refresh_margin_seconds);

        Self {
            client,
            store,
            config,
        }
    }

    pub fn client(&self) -> &LaceworkClient {
        &self.client
    }

    pub fn config(&self) -> &LaceworkConfig {
        &self.config
    }

    /// A usable token, reissued on demand
    pub async fn access_token(&self) -> Result<String, LaceworkError> {
        self.client
            .valid_token(self.store.as_ref(), &self.config.credentials_secret_id)
            .await
    }

    /// Issue and persist a new token regardless of the stored one
    pub async fn refresh_token(&self) -> Result<String, LaceworkError> {
        self.client
            .issue_token(self.store.as_ref(), &self.config.credentials_secret_id)
            .await
    }

    pub async fn add_cloudtrail_account(
        &self,
        account: &CloudTrailAccount,
    ) -> Result<CreatedCloudAccount, LaceworkError> {
        let token = self.access_token().await?;
        self.client
            .create_cloudtrail_account(&token, self.sub_account(), account)
            .await
    }

    pub async fn add_config_account(
        &self,
        account: &ConfigAccount,
    ) -> Result<CreatedCloudAccount, LaceworkError> {
        let token = self.access_token().await?;
        self.client
            .create_config_account(&token, self.sub_account(), account)
            .await
    }

    pub async fn remove_cloud_account(&self, name: &str) -> Result<DeleteOutcome, LaceworkError> {
        let token = self.access_token().await?;
        self.client
            .delete_cloud_account(&token, self.sub_account(), name)
            .await
    }

    fn sub_account(&self) -> Option<&str> {
        self.config.sub_account.as_deref()
    }
}
