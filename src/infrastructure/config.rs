// Configuration loading for the Grafana server and the panels tree
use crate::domain::dashboard::PanelsConfig;
use crate::domain::options::{RenderOptions, Theme, Timespan};
use anyhow::Context;
use serde::Deserialize;

/// Grafana server settings plus the default render options every invocation
/// starts from.
#[derive(Debug, Clone, Deserialize)]
pub struct GrafanaSettings {
    pub grafana_url: String,
    pub grafana_api_key: String,
    pub grafana_org_id: i64,
    #[serde(default)]
    pub default_width: u32,
    #[serde(default)]
    pub default_height: u32,
    pub default_theme: Theme,
    /// ISO-8601 duration; empty means no from/to window.
    #[serde(default)]
    pub default_timespan: String,
    pub default_tz: String,
}

impl GrafanaSettings {
    /// Validated per-request starting options.
    pub fn default_options(&self) -> anyhow::Result<RenderOptions> {
        let timespan = Timespan::parse(&self.default_timespan)
            .with_context(|| format!("invalid default_timespan {:?}", self.default_timespan))?;
        RenderOptions::new(
            self.default_width,
            self.default_height,
            self.default_theme,
            timespan,
            self.default_tz.clone(),
        )
        .context("invalid default render options")
    }
}

pub fn load_grafana_settings() -> anyhow::Result<GrafanaSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/grafana"))
        .build()?;

    let settings: GrafanaSettings = settings.try_deserialize()?;
    if settings.grafana_url.is_empty() {
        anyhow::bail!("grafana_url must not be empty");
    }
    settings.default_options()?;
    Ok(settings)
}

/// Load the dashboards/panels/variables tree and run the schema validation
/// pass, so definition mistakes surface at startup rather than mid-chat.
pub fn load_panels_config() -> anyhow::Result<PanelsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/panels"))
        .build()?;

    let panels: PanelsConfig = settings.try_deserialize()?;
    panels.validate()?;
    Ok(panels)
}
