// Image rendering capability consumed by the dispatcher
use crate::application::builder::PanelRequest;
use async_trait::async_trait;
use bytes::Bytes;

/// Fetches the rendered PNG for a built panel request. Implemented by the
/// Grafana HTTP client; mocked in pipeline tests. A `None` result means
/// "no image" (failure already logged); callers never retry.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn fetch_panel_image(&self, request: &PanelRequest) -> Option<Bytes>;
}
