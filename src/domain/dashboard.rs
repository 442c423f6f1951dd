// Dashboard, panel and variable definitions (the panels configuration tree)
use serde::Deserialize;
use std::collections::BTreeMap;

/// A Grafana dashboard: a slug, an opaque uid, and the panels exposed to chat.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardDef {
    pub dashboard_slug: String,
    pub dashboard_uid: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub panels: Vec<PanelDef>,
}

/// A single panel inside a dashboard, bound to the chat subcommand
/// `get-<command_name>`.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelDef {
    pub command_name: String,
    pub panel_id: i64,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub variables: Vec<VariableDef>,
}

impl PanelDef {
    /// Chat subcommand name this panel answers to.
    pub fn subcommand(&self) -> String {
        format!("get-{}", self.command_name)
    }
}

/// A panel-scoped input: supplied by the user, hidden with a fixed default,
/// or resolved via an inventory query.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableDef {
    pub name: String,
    #[serde(default)]
    pub friendly_name: String,
    /// Inventory entity type to search, e.g. "Device". When set, `modelattr`
    /// names the record field compared against the user input and returned
    /// as the resolved value.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub modelattr: Option<String>,
    /// Static filter, field -> template string rendered against the
    /// variables resolved so far. Ordered for deterministic rendering.
    #[serde(default)]
    pub filter: BTreeMap<String, String>,
    /// Template producing the final value string; defaults to the resolved
    /// value itself.
    #[serde(default)]
    pub value: Option<String>,
    /// Default raw value used when the user omits this variable.
    #[serde(default)]
    pub response: String,
    #[serde(default = "default_true")]
    pub includeincmd: bool,
    #[serde(default = "default_true")]
    pub includeinurl: bool,
}

impl VariableDef {
    /// Display label used in menus and response headers.
    pub fn label(&self) -> &str {
        if self.friendly_name.is_empty() {
            &self.name
        } else {
            &self.friendly_name
        }
    }
}

fn default_true() -> bool {
    true
}

/// The full panels configuration tree: one snapshot of the configuration
/// store, immutable for the duration of a single chat invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelsConfig {
    #[serde(default)]
    pub dashboards: Vec<DashboardDef>,
}

impl PanelsConfig {
    /// Schema validation pass, run at load time so definition mistakes are
    /// caught before any chat request is served.
    pub fn validate(&self) -> Result<(), crate::domain::error::ConfigError> {
        use crate::domain::error::ConfigError;
        use std::collections::HashSet;

        let mut slugs = HashSet::new();
        let mut commands = HashSet::new();
        for dashboard in &self.dashboards {
            if dashboard.dashboard_slug.is_empty() || dashboard.dashboard_uid.is_empty() {
                return Err(ConfigError::IncompleteDashboard(
                    dashboard.friendly_name.clone(),
                ));
            }
            if !slugs.insert(&dashboard.dashboard_slug) {
                return Err(ConfigError::DuplicateSlug(dashboard.dashboard_slug.clone()));
            }
            for panel in &dashboard.panels {
                if !commands.insert(&panel.command_name) {
                    return Err(ConfigError::DuplicateCommand(panel.command_name.clone()));
                }
                for (index, variable) in panel.variables.iter().enumerate() {
                    if variable.name.is_empty() {
                        return Err(ConfigError::UnnamedVariable {
                            panel: panel.command_name.clone(),
                            variable: index,
                        });
                    }
                    if variable.query.is_some() && variable.modelattr.is_none() {
                        return Err(ConfigError::QueryWithoutModelAttr {
                            panel: panel.command_name.clone(),
                            variable: variable.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
