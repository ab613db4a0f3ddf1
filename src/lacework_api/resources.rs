use serde::{Deserialize, Serialize};

/// CloudAccounts integration type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudAccountType {
    /// CloudTrail ingestion through an SQS queue
    AwsCtSqs,
    /// Configuration posture scanning
    AwsCfg,
}

/// Cross-account IAM role Lacework assumes in the customer account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossAccountCredentials {
    pub external_id: String,
    pub role_arn: String,
}

/// `data` block of an `AwsCtSqs` integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudTrailData {
    pub cross_account_credentials: CrossAccountCredentials,
    pub queue_url: String,
}

/// `data` block of an `AwsCfg` integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigData {
    pub cross_account_credentials: CrossAccountCredentials,
    pub aws_account_id: String,
}

/// Type-specific integration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CloudAccountData {
    CloudTrail(CloudTrailData),
    Config(ConfigData),
}

/// Request body for `POST /api/v2/CloudAccounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudAccountRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: CloudAccountType,
    /// 1 = enabled, 0 = disabled
    pub enabled: u8,
    pub data: CloudAccountData,
}

/// Input for a CloudTrail (`AwsCtSqs`) integration
#[derive(Debug, Clone)]
pub struct CloudTrailAccount {
    pub name: String,
    pub external_id: String,
    pub role_arn: String,
    pub sqs_queue_url: String,
}

impl CloudTrailAccount {
    /// Build the enabled `AwsCtSqs` request body
    pub fn to_request(&self) -> CloudAccountRequest {
        CloudAccountRequest {
            name: self.name.clone(),
            account_type: CloudAccountType::AwsCtSqs,
            enabled: 1,
            data: CloudAccountData::CloudTrail(CloudTrailData {
                cross_account_credentials: CrossAccountCredentials {
                    external_id: self.external_id.clone(),
                    role_arn: self.role_arn.clone(),
                },
                queue_url: self.sqs_queue_url.clone(),
            }),
        }
    }
}

/// Input for a Config (`AwsCfg`) integration
#[derive(Debug, Clone)]
pub struct ConfigAccount {
    pub name: String,
    pub external_id: String,
    pub role_arn: String,
    pub aws_account_id: String,
}

impl ConfigAccount {
    /// Build the enabled `AwsCfg` request body
    pub fn to_request(&self) -> CloudAccountRequest {
        CloudAccountRequest {
            name: self.name.clone(),
            account_type: CloudAccountType::AwsCfg,
            enabled: 1,
            data: CloudAccountData::Config(ConfigData {
                cross_account_credentials: CrossAccountCredentials {
                    external_id: self.external_id.clone(),
                    role_arn: self.role_arn.clone(),
                },
                aws_account_id: self.aws_account_id.clone(),
            }),
        }
    }
}

/// One filter clause of a CloudAccounts search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub field: String,
    pub expression: String,
    pub value: String,
}

/// Request body for `POST /api/v2/CloudAccounts/search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub filters: Vec<SearchFilter>,
    pub returns: Vec<String>,
}

impl SearchRequest {
    /// Exact match on integration name, returning only `intgGuid`
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            filters: vec![SearchFilter {
                field: "name".to_string(),
                expression: "eq".to_string(),
                value: name.into(),
            }],
            returns: vec!["intgGuid".to_string()],
        }
    }
}

/// Integration summary as returned by search and create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccountSummary {
    pub intg_guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

/// Response from CloudAccounts search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<CloudAccountSummary>,
}

/// Single-resource envelope (`{"data": {...}}`) returned on create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceResponse<T> {
    pub data: T,
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCloudAccount {
    /// GUID assigned by Lacework, when the 201 body carried one
    pub intg_guid: Option<String>,
}

/// Outcome of looking an integration up by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLookup {
    /// Exactly one integration has the name
    Found(String),
    /// No integration has the name
    NotFound,
    /// Several integrations share the name; none is picked
    Ambiguous { matches: usize },
}

impl AccountLookup {
    /// The GUID when the match was unique
    pub fn guid(&self) -> Option<&str> {
        match self {
            AccountLookup::Found(guid) => Some(guid),
            _ => None,
        }
    }
}

/// Outcome of deleting an integration by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { intg_guid: String },
    /// Nothing to delete
    NotFound,
    /// Skipped because the name matched several integrations
    Ambiguous { matches: usize },
}

impl DeleteOutcome {
    /// Whether a DELETE was issued and accepted
    pub fn deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cloudtrail_request_shape() {
        let account = CloudTrailAccount {
            name: "acme-ct".to_string(),
            external_id: "ext-123".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/lw".to_string(),
            sqs_queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/lw".to_string(),
        };

        let json = serde_json::to_value(account.to_request()).unwrap();
        assert_eq!(
            json,
            json!({
                "name": "acme-ct",
                "type": "AwsCtSqs",
                "enabled": 1,
                "data": {
                    "crossAccountCredentials": {
                        "externalId": "ext-123",
                        "roleArn": "arn:aws:iam::123456789012:role/lw"
                    },
                    "queueUrl": "https://sqs.us-east-1.amazonaws.com/123456789012/lw"
                }
            })
        );
    }

    #[test]
    fn test_config_request_shape() {
        let account = ConfigAccount {
            name: "acme-cfg".to_string(),
            external_id: "ext-123".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/lw".to_string(),
            aws_account_id: "123456789012".to_string(),
        };

        let json = serde_json::to_value(account.to_request()).unwrap();
        assert_eq!(json["type"], "AwsCfg");
        assert_eq!(json["data"]["awsAccountId"], "123456789012");
        assert!(json["data"].get("queueUrl").is_none());
    }

    #[test]
    fn test_names_with_quotes_are_escaped() {
        let account = ConfigAccount {
            name: "acme \"prod\"\n".to_string(),
            external_id: "e".to_string(),
            role_arn: "r".to_string(),
            aws_account_id: "1".to_string(),
        };

        let body = serde_json::to_string(&account.to_request()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["name"], "acme \"prod\"\n");
    }

    #[test]
    fn test_search_by_name_shape() {
        let json = serde_json::to_value(SearchRequest::by_name("acme-ct")).unwrap();
        assert_eq!(
            json,
            json!({
                "filters": [{"field": "name", "expression": "eq", "value": "acme-ct"}],
                "returns": ["intgGuid"]
            })
        );
    }

    #[test]
    fn test_search_response_tolerates_missing_data() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.data.is_empty());

        let response: SearchResponse =
            serde_json::from_value(json!({"data": [{"intgGuid": "ACME_1"}]})).unwrap();
        assert_eq!(response.data[0].intg_guid, "ACME_1");
        assert!(response.data[0].name.is_none());
    }

    #[test]
    fn test_lookup_and_delete_helpers() {
        assert_eq!(AccountLookup::Found("g".to_string()).guid(), Some("g"));
        assert_eq!(AccountLookup::NotFound.guid(), None);
        assert_eq!(AccountLookup::Ambiguous { matches: 2 }.guid(), None);

        assert!(DeleteOutcome::Deleted { intg_guid: "g".to_string() }.deleted());
        assert!(!DeleteOutcome::NotFound.deleted());
        assert!(!DeleteOutcome::Ambiguous { matches: 3 }.deleted());
    }
}
