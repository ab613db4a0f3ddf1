use chrono::{Duration, Utc};
use serde::Serialize;

use crate::lacework_api::credentials::{get_secret, update_secret};
use crate::lacework_api::resources::{
    AccountLookup, CloudAccountRequest, CloudAccountSummary, CloudTrailAccount, ConfigAccount,
    CreatedCloudAccount, DeleteOutcome, ResourceResponse, SearchRequest, SearchResponse,
};
use crate::lacework_api::types::{AccessToken, AccessTokenRequest, ApiError, LaceworkError};
use crate::storage::SecretStore;

/// Token issuance endpoint
pub const ACCESS_TOKEN_PATH: &str = "api/v2/access/tokens";
/// CloudAccounts collection
pub const CLOUD_ACCOUNTS_PATH: &str = "api/v2/CloudAccounts";
/// CloudAccounts search endpoint
pub const CLOUD_ACCOUNTS_SEARCH_PATH: &str = "api/v2/CloudAccounts/search";
/// Validity window requested for new access tokens (seconds)
pub const DEFAULT_TOKEN_EXPIRY_SECONDS: u64 = 86400;
/// A stored token closer than this to expiry is reissued (seconds)
pub const DEFAULT_REFRESH_MARGIN_SECONDS: i64 = 300;

/// Header carrying the secret key on token requests
const SECRET_KEY_HEADER: &str = "X-LW-UAKS";
/// Header selecting a sub-account in multi-tenant Lacework deployments
const SUB_ACCOUNT_HEADER: &str = "Account-Name";

/// HTTP client for the Lacework v2 API
///
/// Covers the pieces an AWS onboarding workflow needs: minting access tokens
/// from the API key pair and managing CloudAccounts integrations. Each call
/// is a single request/response exchange; nothing is retried.
#[derive(Debug, Clone)]
pub struct LaceworkClient {
    /// `https://<account>.lacework.net`
    base_url: String,
    /// HTTP client for making requests (certificate verification enabled)
    client: reqwest::Client,
    token_expiry_seconds: u64,
    refresh_margin: Duration,
}

impl LaceworkClient {
    /// Create a new Lacework API client
    ///
    /// # Arguments
    ///
    /// * `host` - Lacework host such as `acme.lacework.net`. A value that
    ///   already carries a scheme is used as the base URL verbatim.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lacework_onboarding::LaceworkClient;
    ///
    /// let client = LaceworkClient::new("acme.lacework.net");
    /// assert_eq!(client.base_url(), "https://acme.lacework.net");
    /// ```
    pub fn new(host: impl AsRef<str>) -> Self {
        let base_url = normalize_base_url(host.as_ref());
        tracing::debug!("Creating LaceworkClient with base URL: {}", base_url);

        Self {
            base_url,
            client: reqwest::Client::new(),
            token_expiry_seconds: DEFAULT_TOKEN_EXPIRY_SECONDS,
            refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECONDS),
        }
    }

    /// Override the validity window requested for new tokens
    pub fn with_token_expiry(mut self, seconds: u64) -> Self {
        self.token_expiry_seconds = seconds;
        self
    }

    /// Override how close to expiry a stored token may get before reissue
    pub fn with_refresh_margin(mut self, seconds: i64) -> Self {
        self.refresh_margin = Duration::seconds(seconds);
        self
    }

    /// Get the base URL for this client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ------------------------------------------------------------------
    // Transport helpers
    // ------------------------------------------------------------------

    /// Send an authenticated JSON POST
    ///
    /// The response is returned whatever its status; only transport failures
    /// are errors.
    pub async fn post_request<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        payload: &T,
        sub_account: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", token)
            .header("Content-Type", "application/json");
        if let Some(account) = sub_account_header(sub_account) {
            request = request.header(SUB_ACCOUNT_HEADER, account);
        }

        request.json(payload).send().await.map_err(|e| {
            tracing::error!("Failed to send POST {}: {}", url, e);
            ApiError::from(e)
        })
    }

    /// Send an authenticated DELETE
    pub async fn delete_request(
        &self,
        path: &str,
        token: &str,
        sub_account: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);

        let mut request = self.client.delete(&url).header("Authorization", token);
        if let Some(account) = sub_account_header(sub_account) {
            request = request.header(SUB_ACCOUNT_HEADER, account);
        }

        request.send().await.map_err(|e| {
            tracing::error!("Failed to send DELETE {}: {}", url, e);
            ApiError::from(e)
        })
    }

    /// Send a token request authenticated by the API key pair
    pub async fn token_request(
        &self,
        key_id: &str,
        secret_key: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(ACCESS_TOKEN_PATH);
        let payload = AccessTokenRequest {
            key_id: key_id.to_string(),
            expiry_time: self.token_expiry_seconds,
        };
        tracing::debug!(
            "Requesting access token from {}: key_id={}, expiry_time={}",
            url,
            key_id,
            payload.expiry_time
        );

        self.client
            .post(&url)
            .header(SECRET_KEY_HEADER, secret_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send token request: {}", e);
                ApiError::from(e)
            })
    }

    // ------------------------------------------------------------------
    // Token issuer
    // ------------------------------------------------------------------

    /// Exchange the API key pair for an access token
    ///
    /// Succeeds only on HTTP 201; any other status becomes
    /// [`LaceworkError::TokenIssuance`] carrying the status and body.
    pub async fn request_access_token(
        &self,
        key_id: &str,
        secret_key: &str,
    ) -> Result<AccessToken, LaceworkError> {
        let response = self.token_request(key_id, secret_key).await?;
        let status = response.status();
        tracing::info!("Token API response code: {}", status.as_u16());

        if status != reqwest::StatusCode::CREATED {
            let body = read_body(response).await;
            tracing::error!("Generate access token failure: HTTP {} - {}", status.as_u16(), body);
            return Err(LaceworkError::TokenIssuance {
                status: status.as_u16(),
                body,
            });
        }

        let token: AccessToken = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse access token response: {}", e);
            ApiError::Parse(format!("Failed to parse access token response: {}", e))
        })?;
        tracing::debug!("Access token length: {}", token.token.len());

        Ok(token)
    }

    /// Issue a fresh access token and persist it into the credential record
    ///
    /// Loads the record under `credential_id`, requests a token with its key
    /// pair, writes `AccessToken`/`TokenExpiry` back, and returns the token.
    /// Nothing is written when the token request fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lacework_onboarding::{LaceworkClient, SecretsManagerStore};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = SecretsManagerStore::from_env().await;
    /// let client = LaceworkClient::new("acme.lacework.net");
    /// let token = client.issue_token(&store, "LaceworkApiCredentials").await?;
    /// println!("Token length: {}", token.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn issue_token(
        &self,
        store: &dyn SecretStore,
        credential_id: &str,
    ) -> Result<String, LaceworkError> {
        tracing::info!("Issuing Lacework access token for credentials {}", credential_id);

        let mut record = get_secret(store, credential_id).await?;
        let issued = self
            .request_access_token(&record.access_key_id, &record.secret_key)
            .await?;

        record.access_token = Some(issued.token.clone());
        record.token_expiry = Some(issued.expires_at.clone());
        update_secret(store, credential_id, &record).await?;

        tracing::info!(
            "New access token saved to secret store: credential_id={}, expires_at={}",
            credential_id,
            issued.expires_at
        );

        Ok(issued.token)
    }

    /// Return the stored access token as-is
    ///
    /// Expiry is not checked; use [`LaceworkClient::valid_token`] when the
    /// token must be usable.
    pub async fn get_token(
        &self,
        store: &dyn SecretStore,
        credential_id: &str,
    ) -> Result<String, LaceworkError> {
        tracing::debug!("Reading stored access token from {}", credential_id);

        get_secret(store, credential_id)
            .await?
            .access_token
            .ok_or_else(|| LaceworkError::MissingToken(credential_id.to_string()))
    }

    /// Return a token that stays valid past the refresh margin
    ///
    /// Reuses the stored token when `TokenExpiry` is far enough away,
    /// otherwise issues and persists a new one.
    pub async fn valid_token(
        &self,
        store: &dyn SecretStore,
        credential_id: &str,
    ) -> Result<String, LaceworkError> {
        let record = get_secret(store, credential_id).await?;

        if record.has_fresh_token(Utc::now(), self.refresh_margin) {
            if let Some(token) = record.access_token {
                tracing::debug!("Reusing stored access token from {}", credential_id);
                return Ok(token);
            }
        }

        tracing::info!(
            "Stored access token in {} is missing or near expiry ({:?}), reissuing",
            credential_id,
            record.token_expiry
        );
        self.issue_token(store, credential_id).await
    }

    // ------------------------------------------------------------------
    // Account manager
    // ------------------------------------------------------------------

    /// Create an `AwsCtSqs` (CloudTrail via SQS) integration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lacework_onboarding::{CloudTrailAccount, LaceworkClient};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = LaceworkClient::new("acme.lacework.net");
    /// let account = CloudTrailAccount {
    ///     name: "acme-prod-cloudtrail".to_string(),
    ///     external_id: "lweid:aws:v2:acme:123456789012:abc".to_string(),
    ///     role_arn: "arn:aws:iam::123456789012:role/LaceworkCrossAccount".to_string(),
    ///     sqs_queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/lacework".to_string(),
    /// };
    /// let created = client
    ///     .create_cloudtrail_account("access_token", Some("Prod"), &account)
    ///     .await?;
    /// println!("intgGuid: {:?}", created.intg_guid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_cloudtrail_account(
        &self,
        token: &str,
        sub_account: Option<&str>,
        account: &CloudTrailAccount,
    ) -> Result<CreatedCloudAccount, LaceworkError> {
        tracing::info!("Adding CloudTrail cloud account: name={}", account.name);
        self.create_cloud_account(token, sub_account, &account.to_request())
            .await
    }

    /// Create an `AwsCfg` (configuration posture) integration
    pub async fn create_config_account(
        &self,
        token: &str,
        sub_account: Option<&str>,
        account: &ConfigAccount,
    ) -> Result<CreatedCloudAccount, LaceworkError> {
        tracing::info!("Adding Config cloud account: name={}", account.name);
        self.create_cloud_account(token, sub_account, &account.to_request())
            .await
    }

    /// POST a CloudAccounts integration; 201 is the only success
    pub async fn create_cloud_account(
        &self,
        token: &str,
        sub_account: Option<&str>,
        request: &CloudAccountRequest,
    ) -> Result<CreatedCloudAccount, LaceworkError> {
        tracing::debug!("Create cloud account payload: {:?}", request);

        let response = self
            .post_request(CLOUD_ACCOUNTS_PATH, token, request, sub_account)
            .await?;
        let status = response.status();
        let body = read_body(response).await;
        tracing::info!("API response code: {}", status.as_u16());
        tracing::debug!("API response: {}", body);

        if status != reqwest::StatusCode::CREATED {
            tracing::error!(
                "Failed to add {:?} cloud account {}: HTTP {} - {}",
                request.account_type,
                request.name,
                status.as_u16(),
                body
            );
            return Err(LaceworkError::AccountCreation {
                status: status.as_u16(),
                body,
            });
        }

        let intg_guid = serde_json::from_str::<ResourceResponse<CloudAccountSummary>>(&body)
            .ok()
            .map(|created| created.data.intg_guid);
        tracing::info!(
            "Cloud account created: name={}, intg_guid={:?}",
            request.name,
            intg_guid
        );

        Ok(CreatedCloudAccount { intg_guid })
    }

    /// Look an integration up by its exact name
    ///
    /// Zero or several matches are reported as [`AccountLookup::NotFound`] and
    /// [`AccountLookup::Ambiguous`] rather than errors. A non-200 search
    /// response is a [`LaceworkError::Search`].
    pub async fn find_account_by_name(
        &self,
        token: &str,
        sub_account: Option<&str>,
        name: &str,
    ) -> Result<AccountLookup, LaceworkError> {
        let search = SearchRequest::by_name(name);
        tracing::debug!("Search cloud account payload: {:?}", search);

        let response = self
            .post_request(CLOUD_ACCOUNTS_SEARCH_PATH, token, &search, sub_account)
            .await?;
        let status = response.status();
        let body = read_body(response).await;
        tracing::info!("API response code: {}", status.as_u16());
        tracing::debug!("API response: {}", body);

        if status != reqwest::StatusCode::OK {
            tracing::error!(
                "Failed to search cloud accounts for {}: HTTP {} - {}",
                name,
                status.as_u16(),
                body
            );
            return Err(LaceworkError::Search {
                status: status.as_u16(),
                body,
            });
        }

        let results: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse search response: {} - Response body: {}", e, body);
            ApiError::Parse(format!("Failed to parse search response: {}", e))
        })?;

        let mut matches = results.data;
        match matches.len() {
            0 => {
                tracing::warn!("Cloud account with integration name {} was not found.", name);
                Ok(AccountLookup::NotFound)
            }
            1 => Ok(AccountLookup::Found(matches.remove(0).intg_guid)),
            count => {
                tracing::warn!(
                    "More than one cloud account with integration name {} was found ({} matches).",
                    name,
                    count
                );
                Ok(AccountLookup::Ambiguous { matches: count })
            }
        }
    }

    /// Delete the integration with this exact name
    ///
    /// A DELETE is only sent when the name resolves to exactly one GUID;
    /// otherwise the outcome records why nothing was deleted.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lacework_onboarding::LaceworkClient;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = LaceworkClient::new("acme.lacework.net");
    /// let outcome = client
    ///     .delete_cloud_account("access_token", None, "acme-prod-cloudtrail")
    ///     .await?;
    /// if !outcome.deleted() {
    ///     println!("Nothing deleted: {:?}", outcome);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn delete_cloud_account(
        &self,
        token: &str,
        sub_account: Option<&str>,
        name: &str,
    ) -> Result<DeleteOutcome, LaceworkError> {
        tracing::info!("Deleting cloud account: name={}", name);

        let intg_guid = match self.find_account_by_name(token, sub_account, name).await? {
            AccountLookup::Found(guid) => guid,
            AccountLookup::NotFound => return Ok(DeleteOutcome::NotFound),
            AccountLookup::Ambiguous { matches } => {
                return Ok(DeleteOutcome::Ambiguous { matches })
            }
        };

        let path = format!("{}/{}", CLOUD_ACCOUNTS_PATH, intg_guid);
        let response = self.delete_request(&path, token, sub_account).await?;
        let status = response.status();
        let body = read_body(response).await;
        tracing::info!("API response code: {}", status.as_u16());
        tracing::debug!("API response: {}", body);

        if status != reqwest::StatusCode::NO_CONTENT {
            tracing::error!(
                "Failed to delete cloud account {} ({}): HTTP {} - {}",
                name,
                intg_guid,
                status.as_u16(),
                body
            );
            return Err(LaceworkError::AccountDeletion {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Cloud account deleted: name={}, intg_guid={}", name, intg_guid);
        Ok(DeleteOutcome::Deleted { intg_guid })
    }
}

/// Prefix bare hosts with `https://` and drop trailing slashes
fn normalize_base_url(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// `Account-Name` value for a sub-account; empty means no header
fn sub_account_header(sub_account: Option<&str>) -> Option<String> {
    sub_account
        .filter(|account| !account.is_empty())
        .map(str::to_lowercase)
}

async fn read_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LaceworkClient::new("acme.lacework.net");
        assert_eq!(client.base_url(), "https://acme.lacework.net");
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        assert_eq!(normalize_base_url("http://127.0.0.1:8080/"), "http://127.0.0.1:8080");
        assert_eq!(normalize_base_url("https://acme.lacework.net"), "https://acme.lacework.net");
        assert_eq!(normalize_base_url(" acme.lacework.net/ "), "https://acme.lacework.net");
    }

    #[test]
    fn test_url_joins_paths() {
        let client = LaceworkClient::new("acme.lacework.net");
        assert_eq!(
            client.url(CLOUD_ACCOUNTS_SEARCH_PATH),
            "https://acme.lacework.net/api/v2/CloudAccounts/search"
        );
        assert_eq!(
            client.url("/api/v2/CloudAccounts/ACME_1"),
            "https://acme.lacework.net/api/v2/CloudAccounts/ACME_1"
        );
    }

    #[test]
    fn test_sub_account_header_lowercases() {
        assert_eq!(sub_account_header(Some("ProdTenant")), Some("prodtenant".to_string()));
        assert_eq!(sub_account_header(Some("")), None);
        assert_eq!(sub_account_header(None), None);
    }

    #[test]
    fn test_builder_overrides() {
        let client = LaceworkClient::new("acme.lacework.net")
            .with_token_expiry(3600)
            .with_refresh_margin(60);
        assert_eq!(client.token_expiry_seconds, 3600);
        assert_eq!(client.refresh_margin, Duration::seconds(60));
    }
}
