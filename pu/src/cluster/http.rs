//! HTTP cluster client
//!
//! Talks to the cluster's JSON API: one POST per RPC, named
//! `{base}/{service}/{method}`, with the auth token in the `authn-token`
//! header.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{ClusterClient, ClusterError, CreatePipelineRequest};
use crate::config::ClusterSettings;

const AUTH_HEADER: &str = "authn-token";
const GET_VERSION: &str = "versionpb_v2.API/GetVersion";
const WHO_AM_I: &str = "auth_v2.API/WhoAmI";
const CREATE_PIPELINE: &str = "pps_v2.API/CreatePipeline";

/// Cluster version as reported by the server
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub additional: String,
}

impl std::fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}{}", self.major, self.minor, self.micro, self.additional)
    }
}

#[derive(Debug, Deserialize)]
struct WhoAmIResponse {
    #[serde(default)]
    username: String,
}

/// Cluster client over HTTP
pub struct HttpClusterClient {
    base_url: String,
    http: Client,
}

impl HttpClusterClient {
    /// Build a client without contacting the cluster
    pub fn new(settings: &ClusterSettings) -> Result<Self, ClusterError> {
        debug!(?settings, "HttpClusterClient::new: called");
        let base_url = settings.endpoint.base_url();

        let mut headers = HeaderMap::new();
        if let Some(token) = &settings.token {
            let mut value = HeaderValue::from_str(token).map_err(|_| ClusterError::Connect {
                endpoint: base_url.clone(),
                message: "auth token contains characters not allowed in a header".to_string(),
            })?;
            value.set_sensitive(true);
            headers.insert(AUTH_HEADER, value);
        }

        let http = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { base_url, http })
    }

    /// Build a client and verify the cluster is reachable and the token valid
    pub async fn connect(settings: &ClusterSettings) -> Result<Self, ClusterError> {
        let client = Self::new(settings)?;

        let version: ClusterVersion = client.call(GET_VERSION).await?;
        info!(endpoint = %client.base_url, %version, "Connected to cluster");

        if settings.token.is_some() {
            let who: WhoAmIResponse = client.call(WHO_AM_I).await?;
            info!(username = %who.username, "Authenticated to cluster");
        }

        Ok(client)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Issue a connection-phase RPC with an empty request body
    async fn call<T: for<'de> Deserialize<'de>>(&self, method: &str) -> Result<T, ClusterError> {
        debug!(%method, "call: called");
        let connect_error = |message: String| ClusterError::Connect {
            endpoint: self.base_url.clone(),
            message,
        };

        let response = self
            .http
            .post(self.url(method))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| connect_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(%method, %status, "call: error response");
            return Err(connect_error(format!("{} returned HTTP {}: {}", method, status.as_u16(), text)));
        }

        response
            .json()
            .await
            .map_err(|e| connect_error(format!("{} returned an unreadable response: {}", method, e)))
    }
}

#[async_trait]
impl ClusterClient for HttpClusterClient {
    async fn create_pipeline(&self, request: &CreatePipelineRequest) -> Result<(), ClusterError> {
        debug!(pipeline = %request.pipeline(), update = request.update(), "create_pipeline: called");
        let apply_error = |status: Option<u16>, message: String| ClusterError::Apply {
            pipeline: request.pipeline().to_string(),
            status,
            message,
        };

        let response = self
            .http
            .post(self.url(CREATE_PIPELINE))
            .json(request.body())
            .send()
            .await
            .map_err(|e| apply_error(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            debug!(pipeline = %request.pipeline(), %status, "create_pipeline: rejected");
            return Err(apply_error(Some(status.as_u16()), message));
        }

        debug!(pipeline = %request.pipeline(), "create_pipeline: success");
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}

/// Pull the `message` out of a JSON error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoint;
    use std::time::Duration;

    fn settings(token: Option<&str>) -> ClusterSettings {
        ClusterSettings {
            endpoint: Endpoint::parse("grpcs://pachd.example.com:30650").unwrap(),
            token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_new_builds_base_url() {
        let client = HttpClusterClient::new(&settings(Some("token"))).unwrap();
        assert_eq!(client.endpoint(), "https://pachd.example.com:30650");
        assert_eq!(
            client.url(CREATE_PIPELINE),
            "https://pachd.example.com:30650/pps_v2.API/CreatePipeline"
        );
    }

    #[test]
    fn test_new_rejects_unprintable_token() {
        let err = HttpClusterClient::new(&settings(Some("bad\ntoken"))).err().unwrap();
        assert!(err.is_connect());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"code": 3, "message": "pipeline spec invalid"}"#),
            "pipeline spec invalid"
        );
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_version_display() {
        let version: ClusterVersion =
            serde_json::from_str(r#"{"major": 2, "minor": 9, "micro": 1, "additional": "-rc1"}"#).unwrap();
        assert_eq!(version.to_string(), "2.9.1-rc1");
    }
}
