// Render request construction: a pure function of the resolved invocation
use crate::domain::dashboard::{DashboardDef, PanelDef};
use crate::domain::options::RenderOptions;
use crate::domain::resolution::ResolvedVariable;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A fully built image-rendering request: the `/render/d-solo` URL and the
/// ordered query payload. No network access happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// Build the render URL and payload for a resolved panel invocation.
///
/// `now` is the single per-request time snapshot; from/to are included only
/// for a non-zero timespan, width/height only when positive, and a
/// `var-<name>` parameter is added for every `includeinurl` variable with a
/// non-empty final value.
pub fn build_panel_request(
    base_url: &str,
    org_id: i64,
    dashboard: &DashboardDef,
    panel: &PanelDef,
    variables: &[ResolvedVariable],
    options: &RenderOptions,
    now: DateTime<Utc>,
) -> PanelRequest {
    let mut params = vec![
        ("orgId".to_string(), org_id.to_string()),
        ("panelId".to_string(), panel.panel_id.to_string()),
        (
            "tz".to_string(),
            urlencoding::encode(&options.timezone).into_owned(),
        ),
        ("theme".to_string(), options.theme.to_string()),
    ];

    if !options.timespan.is_zero() {
        let from = options.timespan.subtract_from(now);
        params.push(("from".to_string(), from.timestamp_millis().to_string()));
        params.push(("to".to_string(), now.timestamp_millis().to_string()));
    }
    if options.width > 0 {
        params.push(("width".to_string(), options.width.to_string()));
    }
    if options.height > 0 {
        params.push(("height".to_string(), options.height.to_string()));
    }

    let values: HashMap<&str, &str> = variables
        .iter()
        .map(|v| (v.name.as_str(), v.value.as_str()))
        .collect();
    for variable in &panel.variables {
        if !variable.includeinurl {
            continue;
        }
        if let Some(value) = values.get(variable.name.as_str()) {
            if !value.is_empty() {
                params.push((format!("var-{}", variable.name), value.to_string()));
            }
        }
    }

    let url = format!(
        "{}/render/d-solo/{}/{}",
        base_url.trim_end_matches('/'),
        dashboard.dashboard_uid,
        dashboard.dashboard_slug
    );
    PanelRequest { url, params }
}
