//! Admin API client — the engine's view of the update administration server.
//!
//! The [`AdminApi`] trait is the seam the approval and promotion phases are
//! written against; [`HttpAdminApi`] implements it over the server's JSON
//! HTTP/1 endpoint. Each call opens a connection, sends one request with a
//! per-request timeout, and decodes the JSON body.

use std::time::Duration;

use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::types::{InstallationOutcome, UpdateSummary};

/// Operations the update administration server exposes to the engine.
#[allow(async_fn_in_trait)]
pub trait AdminApi {
    /// Updates not yet approved for any target group, filtered by
    /// classification. An empty filter means all classifications.
    async fn list_unapproved_updates(
        &self,
        classifications: &[String],
    ) -> ApiResult<Vec<UpdateSummary>>;

    /// Approve an update for a target group.
    async fn approve_update(&self, update_id: &str, target_group_id: &str) -> ApiResult<()>;

    /// Decline an update server-wide.
    async fn decline_update(&self, update_id: &str) -> ApiResult<()>;

    /// Installation counts for an update across the given target groups.
    async fn installation_outcome(
        &self,
        update_id: &str,
        target_group_ids: &[String],
    ) -> ApiResult<InstallationOutcome>;

    /// Whether a newer update has superseded this one.
    async fn is_superseded(&self, update_id: &str) -> ApiResult<bool>;
}

/// Connection parameters for the administration server.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address as `host:port`.
    pub address: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Config with the default 30-second request timeout.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-over-HTTP/1 implementation of [`AdminApi`].
#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    config: ConnectionConfig,
}

impl HttpAdminApi {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Issue a request and decode the JSON response body.
    async fn request<T: DeserializeOwned>(&self, method: &str, path: &str) -> ApiResult<T> {
        let body = self.request_raw(method, path).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Issue a request, ignoring the response body.
    async fn request_unit(&self, method: &str, path: &str) -> ApiResult<()> {
        self.request_raw(method, path).await.map(|_| ())
    }

    async fn request_raw(&self, method: &str, path: &str) -> ApiResult<Vec<u8>> {
        let address = self.config.address.clone();
        let uri = format!("http://{address}{path}");

        let call = async {
            let stream = tokio::net::TcpStream::connect(&address)
                .await
                .map_err(|e| ApiError::Connect(e.to_string()))?;

            let io = hyper_util::rt::TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| ApiError::Connect(e.to_string()))?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                let _ = conn.await;
            });

            let req = http::Request::builder()
                .method(method)
                .uri(&uri)
                .header("host", address.as_str())
                .header("accept", "application/json")
                .header("user-agent", "patchgate/0.1")
                .body(http_body_util::Empty::<bytes::Bytes>::new())
                .map_err(|e| ApiError::Request(e.to_string()))?;

            let resp = sender
                .send_request(req)
                .await
                .map_err(|e| ApiError::Request(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }

            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| ApiError::Request(e.to_string()))?
                .to_bytes();

            Ok(body.to_vec())
        };

        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(result) => {
                if let Err(ref e) = result {
                    debug!(%uri, error = %e, "admin API call failed");
                }
                result
            }
            Err(_) => {
                debug!(%uri, "admin API call timed out");
                Err(ApiError::Timeout(self.config.timeout))
            }
        }
    }
}

impl AdminApi for HttpAdminApi {
    async fn list_unapproved_updates(
        &self,
        classifications: &[String],
    ) -> ApiResult<Vec<UpdateSummary>> {
        let path = if classifications.is_empty() {
            "/api/updates/unapproved".to_string()
        } else {
            format!(
                "/api/updates/unapproved?classifications={}",
                classifications.join(",")
            )
        };
        self.request("GET", &path).await
    }

    async fn approve_update(&self, update_id: &str, target_group_id: &str) -> ApiResult<()> {
        self.request_unit(
            "POST",
            &format!("/api/updates/{update_id}/approve?group={target_group_id}"),
        )
        .await
    }

    async fn decline_update(&self, update_id: &str) -> ApiResult<()> {
        self.request_unit("POST", &format!("/api/updates/{update_id}/decline"))
            .await
    }

    async fn installation_outcome(
        &self,
        update_id: &str,
        target_group_ids: &[String],
    ) -> ApiResult<InstallationOutcome> {
        self.request(
            "GET",
            &format!(
                "/api/updates/{update_id}/outcome?groups={}",
                target_group_ids.join(",")
            ),
        )
        .await
    }

    async fn is_superseded(&self, update_id: &str) -> ApiResult<bool> {
        self.request("GET", &format!("/api/updates/{update_id}/superseded"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_config_defaults() {
        let config = ConnectionConfig::new("updates.internal:8530");
        assert_eq!(config.address, "updates.internal:8530");
        assert_eq!(config.timeout, Duration::from_secs(30));

        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn call_to_closed_port_is_a_connect_error() {
        // Port 1 won't be listening.
        let api = HttpAdminApi::new(
            ConnectionConfig::new("127.0.0.1:1").with_timeout(Duration::from_millis(200)),
        );
        let err = api.is_superseded("u-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Connect(_) | ApiError::Timeout(_)));
    }
}
