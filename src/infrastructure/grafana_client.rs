// Grafana HTTP client: render fetches and dashboard discovery
use crate::application::builder::PanelRequest;
use crate::application::renderer::ImageRenderer;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated client for the Grafana render and discovery APIs. A single
/// attempt per call, bounded by the client-wide timeout; failures are logged
/// and surface as "no image" / empty lists, never as errors.
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// One entry of the `/api/search` dashboard listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSearchResult {
    pub uid: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// One panel of a dashboard, from `/api/dashboards/uid/<uid>`.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct DashboardDetailResponse {
    #[serde(default)]
    dashboard: Option<DashboardDetail>,
}

#[derive(Debug, Deserialize)]
struct DashboardDetail {
    #[serde(default)]
    panels: Option<Vec<PanelSummary>>,
}

impl GrafanaClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build Grafana HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Option<reqwest::Response> {
        tracing::debug!(url, "begin GET");
        let response = match self
            .http
            .get(url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(url, error = %err, "an error occurred while accessing the url");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::error!(url, %status, "request returned non-200");
            return None;
        }
        tracing::debug!(url, %status, "request returned");
        Some(response)
    }

    /// Active dashboards from the discovery API; empty on any failure.
    pub async fn list_dashboards(&self) -> Vec<DashboardSearchResult> {
        let url = format!("{}/api/search", self.base_url);
        let query = [("type".to_string(), "dash-db".to_string())];
        let Some(response) = self.get(&url, &query).await else {
            return Vec::new();
        };
        match response.json().await {
            Ok(dashboards) => dashboards,
            Err(err) => {
                tracing::error!(url, error = %err, "failed to parse dashboard search response");
                Vec::new()
            }
        }
    }

    /// Panels of one dashboard from the discovery API; empty on any failure.
    pub async fn list_panels(&self, dashboard_uid: &str) -> Vec<PanelSummary> {
        let url = format!("{}/api/dashboards/uid/{}", self.base_url, dashboard_uid);
        let Some(response) = self.get(&url, &[]).await else {
            return Vec::new();
        };
        let detail: DashboardDetailResponse = match response.json().await {
            Ok(detail) => detail,
            Err(err) => {
                tracing::error!(url, error = %err, "failed to parse dashboard detail response");
                return Vec::new();
            }
        };
        let Some(dashboard) = detail.dashboard else {
            tracing::error!(url, "response does not contain `dashboard` key");
            return Vec::new();
        };
        let Some(panels) = dashboard.panels else {
            tracing::error!(url, "response does not contain `dashboard.panels` key");
            return Vec::new();
        };
        panels
    }
}

#[async_trait]
impl ImageRenderer for GrafanaClient {
    async fn fetch_panel_image(&self, request: &PanelRequest) -> Option<Bytes> {
        let response = self.get(&request.url, &request.params).await?;
        match response.bytes().await {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::error!(url = %request.url, error = %err, "failed to read image body");
                None
            }
        }
    }
}
