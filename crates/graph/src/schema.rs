//! Schema administration against a Dgraph Alpha.
//!
//! Installs the fixed eCAR predicate schema or drops every predicate and
//! all data. Requests go to the Alpha's HTTP `/alter` endpoint.

use async_trait::async_trait;
use ecargraph_config::AppConfig;
use ecargraph_core::GraphError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Indexed predicate declarations for eCAR v0.3 records.
pub const SCHEMA: &str = "\
action: [uid] .
actorID: string @index(hash) .
acts_on: [uid] .
dgraph.graphql.schema: string .
object: string @index(exact) .
objectID: string @index(hash) .
action_type: string @index(exact) .
hostname: string @index(exact) .
ppid: string @index(exact) .
timestamp: string .
pid: string @index(exact) .
id: string @index(hash) .
";

/// The narrow interface the CLI and the watch pipeline need from the store.
#[async_trait]
pub trait SchemaAdmin: Send + Sync {
    /// Human-readable endpoint, for logs.
    fn endpoint(&self) -> &str;

    /// Install or update predicate declarations.
    async fn apply_schema(&self, schema: &str) -> Result<(), GraphError>;

    /// Remove every predicate and all data.
    async fn drop_all(&self) -> Result<(), GraphError>;
}

/// [`SchemaAdmin`] over Dgraph's HTTP API.
pub struct DgraphHttpAdmin {
    base_url: String,
    client: reqwest::Client,
}

impl DgraphHttpAdmin {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GraphError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphError::Unreachable {
                endpoint: base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GraphError> {
        Self::new(
            config.alpha_http.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn alter_url(&self) -> String {
        format!("{}/alter", self.base_url)
    }

    async fn alter(&self, body: String) -> Result<(), GraphError> {
        let url = self.alter_url();
        debug!(url = %url, bytes = body.len(), "Sending alter request");

        let response = self
            .client
            .post(&url)
            .body(body)
            .send()
            .await
            .map_err(|e| GraphError::Unreachable {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| GraphError::Unreachable {
            endpoint: url,
            reason: e.to_string(),
        })?;

        check_alter_response(status, &text)
    }
}

#[async_trait]
impl SchemaAdmin for DgraphHttpAdmin {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn apply_schema(&self, schema: &str) -> Result<(), GraphError> {
        self.alter(schema.to_string()).await?;
        info!(endpoint = %self.base_url, "Schema applied");
        Ok(())
    }

    async fn drop_all(&self) -> Result<(), GraphError> {
        let body = serde_json::json!({ "drop_all": true }).to_string();
        self.alter(body).await?;
        info!(endpoint = %self.base_url, "All data dropped");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AlterResponse {
    #[serde(default)]
    errors: Vec<AlterError>,
}

#[derive(Debug, Deserialize)]
struct AlterError {
    message: String,
}

/// Dgraph can report failures with a 200 status and an `errors` array, so
/// both the status and the body are checked.
fn check_alter_response(status: u16, body: &str) -> Result<(), GraphError> {
    let parsed: Option<AlterResponse> = serde_json::from_str(body).ok();
    let messages: Vec<String> = parsed
        .map(|r| r.errors.into_iter().map(|e| e.message).collect())
        .unwrap_or_default();

    if (200..300).contains(&status) && messages.is_empty() {
        return Ok(());
    }

    let message = if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    };
    Err(GraphError::Alter {
        status_code: status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_every_predicate() {
        for predicate in [
            "action:", "actorID:", "acts_on:", "object:", "objectID:", "action_type:",
            "hostname:", "ppid:", "timestamp:", "pid:", "id:",
        ] {
            assert!(
                SCHEMA.lines().any(|l| l.starts_with(predicate)),
                "missing {predicate}"
            );
        }
        assert!(SCHEMA.lines().all(|l| l.ends_with(" .")));
    }

    #[test]
    fn identity_predicates_are_hash_indexed() {
        assert!(SCHEMA.contains("actorID: string @index(hash) ."));
        assert!(SCHEMA.contains("objectID: string @index(hash) ."));
        assert!(SCHEMA.contains("id: string @index(hash) ."));
    }

    #[test]
    fn success_response_accepted() {
        let body = r#"{"data":{"code":"Success","message":"Done"}}"#;
        assert!(check_alter_response(200, body).is_ok());
    }

    #[test]
    fn errors_array_rejected_even_with_200() {
        let body = r#"{"errors":[{"message":"line 1 column 7: Invalid type","extensions":{"code":"Error"}}]}"#;
        let err = check_alter_response(200, body).unwrap_err();
        assert!(matches!(err, GraphError::Alter { status_code: 200, .. }));
        assert!(err.to_string().contains("Invalid type"));
    }

    #[test]
    fn non_success_status_rejected() {
        let err = check_alter_response(503, "service unavailable").unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("service unavailable"));
    }

    #[test]
    fn alter_url_strips_trailing_slash() {
        let admin = DgraphHttpAdmin::new("http://alpha:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(admin.alter_url(), "http://alpha:8080/alter");
        assert_eq!(admin.endpoint(), "http://alpha:8080");
    }

    #[tokio::test]
    async fn unreachable_store_is_reported() {
        // Port 9 (discard) is essentially never served locally.
        let admin = DgraphHttpAdmin::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = admin.drop_all().await.unwrap_err();
        assert!(matches!(err, GraphError::Unreachable { .. }));
    }
}
