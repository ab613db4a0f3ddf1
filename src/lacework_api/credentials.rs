use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::lacework_api::types::LaceworkError;
use crate::storage::{SecretStore, StorageError};

/// Lacework API credentials as stored in the secret store
///
/// The long-lived key pair is provisioned out of band. `AccessToken` and
/// `TokenExpiry` are only present once a token has been issued. Any other
/// fields in the stored JSON are carried through unchanged when the record
/// is rewritten.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "AccessKeyID")]
    pub access_key_id: String,
    #[serde(rename = "SecretKey")]
    pub secret_key: String,
    #[serde(rename = "AccessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "TokenExpiry", default, skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CredentialRecord {
    /// Create a record holding only the key pair
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            access_token: None,
            token_expiry: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Parsed `TokenExpiry`, if present and valid RFC 3339
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.token_expiry.as_deref()?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(expiry) => Some(expiry.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!("Failed to parse token expiry {:?}: {}", raw, e);
                None
            }
        }
    }

    /// Whether the stored token stays valid for at least `margin` from `now`
    ///
    /// A missing token or an unparseable expiry counts as not fresh.
    pub fn has_fresh_token(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        if self.access_token.is_none() {
            return false;
        }
        match self.token_expires_at() {
            Some(expiry) => expiry - margin > now,
            None => false,
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("token_expiry", &self.token_expiry)
            .field("extra_fields", &self.extra.len())
            .finish()
    }
}

/// Load and decode the credential record stored under `credential_id`
pub async fn get_secret(
    store: &dyn SecretStore,
    credential_id: &str,
) -> Result<CredentialRecord, LaceworkError> {
    tracing::debug!("Loading Lacework credentials from secret {}", credential_id);

    let value = store.read_secret(credential_id).await?.ok_or_else(|| {
        tracing::error!("SecretString not found in {}", credential_id);
        LaceworkError::SecretNotFound(credential_id.to_string())
    })?;

    serde_json::from_str(&value).map_err(|e| {
        tracing::error!("Credential record in {} is not valid JSON: {}", credential_id, e);
        LaceworkError::Storage(StorageError::from(e))
    })
}

/// Overwrite the credential record stored under `credential_id`
pub async fn update_secret(
    store: &dyn SecretStore,
    credential_id: &str,
    record: &CredentialRecord,
) -> Result<(), LaceworkError> {
    let json = serde_json::to_string(record).map_err(StorageError::from)?;
    store.write_secret(credential_id, &json).await?;
    tracing::debug!("Credential record written to {}", credential_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySecretStore;
    use chrono::TimeZone;

    #[test]
    fn test_record_uses_secret_field_names() {
        let json = serde_json::json!({
            "AccessKeyID": "ACME_ABC",
            "SecretKey": "_s3cr3t",
        });
        let record: CredentialRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.access_key_id, "ACME_ABC");
        assert_eq!(record.secret_key, "_s3cr3t");
        assert!(record.access_token.is_none());

        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("AccessToken").is_none());
        assert!(out.get("TokenExpiry").is_none());
    }

    #[test]
    fn test_record_preserves_unknown_fields() {
        let json = serde_json::json!({
            "AccessKeyID": "ACME_ABC",
            "SecretKey": "_s3cr3t",
            "AccountName": "acme",
        });
        let record: CredentialRecord = serde_json::from_value(json).unwrap();
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["AccountName"], "acme");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut record = CredentialRecord::new("ACME_ABC", "_s3cr3t");
        record.access_token = Some("_bearer".to_string());
        let debug = format!("{:?}", record);
        assert!(!debug.contains("_s3cr3t"));
        assert!(!debug.contains("_bearer"));
        assert!(debug.contains("ACME_ABC"));
    }

    #[test]
    fn test_fresh_token_respects_margin() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let mut record = CredentialRecord::new("k", "s");
        record.access_token = Some("t".to_string());
        record.token_expiry = Some("2026-10-16T12:10:00.000Z".to_string());

        assert!(record.has_fresh_token(now, Duration::minutes(5)));
        assert!(!record.has_fresh_token(now, Duration::minutes(15)));
    }

    #[test]
    fn test_fresh_token_requires_token_and_parseable_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let mut record = CredentialRecord::new("k", "s");
        record.token_expiry = Some("2030-01-01T00:00:00Z".to_string());
        assert!(!record.has_fresh_token(now, Duration::zero()));

        record.access_token = Some("t".to_string());
        record.token_expiry = Some("tomorrow".to_string());
        assert!(!record.has_fresh_token(now, Duration::zero()));
    }

    #[tokio::test]
    async fn test_get_secret_missing_string_is_not_found() {
        let store = MemorySecretStore::new().with_empty_secret("lacework/api");
        let err = get_secret(&store, "lacework/api").await.unwrap_err();
        assert!(matches!(err, LaceworkError::SecretNotFound(id) if id == "lacework/api"));
    }

    #[tokio::test]
    async fn test_get_secret_malformed_json() {
        let store = MemorySecretStore::new().with_secret("lacework/api", "not json");
        let err = get_secret(&store, "lacework/api").await.unwrap_err();
        assert!(matches!(err, LaceworkError::Storage(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_update_then_get_roundtrips_record() {
        let store = MemorySecretStore::new();
        let mut record = CredentialRecord::new("ACME_ABC", "_s3cr3t");
        record.access_token = Some("tok".to_string());
        record.token_expiry = Some("2026-10-17T00:00:00Z".to_string());

        update_secret(&store, "lacework/api", &record).await.unwrap();
        let loaded = get_secret(&store, "lacework/api").await.unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("tok"));
        assert_eq!(loaded.token_expiry.as_deref(), Some("2026-10-17T00:00:00Z"));
    }
}
