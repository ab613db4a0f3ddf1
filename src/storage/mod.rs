use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use aws_sdk_secretsmanager::error::DisplayErrorContext;

/// Secret store abstraction for the credential record
///
/// A secret is a single string value (JSON in practice) addressed by an
/// identifier. Implementations must report a secret without a string value
/// as `Ok(None)` rather than an error; callers turn that into
/// [`crate::LaceworkError::SecretNotFound`].
pub trait SecretStore: Send + Sync {
    /// Read the string value stored under `secret_id`
    fn read_secret(
        &self,
        secret_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StorageError>> + Send + '_>>;

    /// Overwrite the string value stored under `secret_id`
    fn write_secret(
        &self,
        secret_id: &str,
        value: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;
}

/// Storage errors
#[derive(Debug)]
pub enum StorageError {
    /// Secret store service error (AWS Secrets Manager, lock poisoning)
    Backend(String),
    /// Keyring error
    Keyring(String),
    /// Stored value could not be (de)serialized
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend(msg) => write!(f, "Secret store error: {}", msg),
            StorageError::Keyring(msg) => write!(f, "Keyring error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<keyring::Error> for StorageError {
    fn from(err: keyring::Error) -> Self {
        StorageError::Keyring(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// AWS Secrets Manager backed store
///
/// Reads with `GetSecretValue` and writes with `UpdateSecret`. A secret that
/// does not exist, or exists with only a binary value, reads as `None`.
#[derive(Debug, Clone)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    /// Wrap an existing Secrets Manager client
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS configuration chain
    /// (environment, profile, instance/task role)
    pub async fn from_env() -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_secretsmanager::Client::new(&aws_config))
    }
}

impl SecretStore for SecretsManagerStore {
    fn read_secret(
        &self,
        secret_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StorageError>> + Send + '_>> {
        let secret_id = secret_id.to_string();

        Box::pin(async move {
            match self
                .client
                .get_secret_value()
                .secret_id(&secret_id)
                .send()
                .await
            {
                Ok(output) => Ok(output.secret_string().map(str::to_string)),
                Err(err) => {
                    let service_err = err.into_service_error();
                    if service_err.is_resource_not_found_exception() {
                        tracing::debug!("Secret {} does not exist in Secrets Manager", secret_id);
                        return Ok(None);
                    }
                    tracing::error!(
                        "GetSecretValue failed for {}: {}",
                        secret_id,
                        DisplayErrorContext(&service_err)
                    );
                    Err(StorageError::Backend(format!(
                        "GetSecretValue failed for {}: {}",
                        secret_id,
                        DisplayErrorContext(&service_err)
                    )))
                }
            }
        })
    }

    fn write_secret(
        &self,
        secret_id: &str,
        value: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let secret_id = secret_id.to_string();
        let value = value.to_string();

        Box::pin(async move {
            self.client
                .update_secret()
                .secret_id(&secret_id)
                .secret_string(value)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    tracing::error!(
                        "UpdateSecret failed for {}: {}",
                        secret_id,
                        DisplayErrorContext(&service_err)
                    );
                    StorageError::Backend(format!(
                        "UpdateSecret failed for {}: {}",
                        secret_id,
                        DisplayErrorContext(&service_err)
                    ))
                })?;

            tracing::debug!("Updated secret in Secrets Manager: {}", secret_id);
            Ok(())
        })
    }
}

/// Keyring-based secret store
///
/// Keeps the credential record in the OS-native credential store, one entry
/// per secret identifier under a shared service name:
/// - macOS: Keychain
/// - Linux: kernel keyutils
/// - Windows: Credential Manager
///
/// Useful for running the onboarding flow from a workstation without AWS.
pub struct KeyringSecretStore {
    service_name: String,
}

impl KeyringSecretStore {
    /// Create a new keyring store with the specified service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(service_name: &str, secret_id: &str) -> Result<keyring::Entry, StorageError> {
        keyring::Entry::new(service_name, secret_id)
            .map_err(|e| StorageError::Keyring(format!("Failed to create keyring entry: {}", e)))
    }
}

impl SecretStore for KeyringSecretStore {
    fn read_secret(
        &self,
        secret_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StorageError>> + Send + '_>> {
        let secret_id = secret_id.to_string();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = Self::entry(&service_name, &secret_id)?;
            match entry.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn write_secret(
        &self,
        secret_id: &str,
        value: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let secret_id = secret_id.to_string();
        let value = value.to_string();
        let service_name = self.service_name.clone();

        Box::pin(async move {
            let entry = Self::entry(&service_name, &secret_id)?;
            entry.set_password(&value)?;
            tracing::debug!(
                "Stored secret in keyring: service={}, secret_id={}",
                service_name,
                secret_id
            );
            Ok(())
        })
    }
}

/// In-process secret store
///
/// Holds secrets in a map. An identifier can also be registered without a
/// string value, which mirrors a Secrets Manager secret that only carries
/// binary data.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, Option<String>>>,
    writes: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a string secret
    pub fn with_secret(self, secret_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(secret_id, Some(value.into()));
        self
    }

    /// Register `secret_id` with no string value
    pub fn with_empty_secret(self, secret_id: impl Into<String>) -> Self {
        self.insert(secret_id, None);
        self
    }

    /// Current string value for `secret_id`
    pub fn get(&self, secret_id: &str) -> Option<String> {
        self.secrets
            .lock()
            .ok()
            .and_then(|secrets| secrets.get(secret_id).cloned().flatten())
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn insert(&self, secret_id: impl Into<String>, value: Option<String>) {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(secret_id.into(), value);
        }
    }
}

impl SecretStore for MemorySecretStore {
    fn read_secret(
        &self,
        secret_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StorageError>> + Send + '_>> {
        let result = self
            .secrets
            .lock()
            .map(|secrets| secrets.get(secret_id).cloned().flatten())
            .map_err(|e| StorageError::Backend(format!("Secret map lock poisoned: {}", e)));

        Box::pin(async move { result })
    }

    fn write_secret(
        &self,
        secret_id: &str,
        value: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let result = self
            .secrets
            .lock()
            .map(|mut secrets| {
                secrets.insert(secret_id.to_string(), Some(value.to_string()));
                self.writes.fetch_add(1, Ordering::SeqCst);
            })
            .map_err(|e| StorageError::Backend(format!("Secret map lock poisoned: {}", e)));

        Box::pin(async move { result })
    }
}
