// Subcommand dispatch: ParseArgs -> ValidateArgs -> Resolve -> Build -> Fetch
use crate::application::args::parse_args;
use crate::application::builder::build_panel_request;
use crate::application::catalog::EntityCatalog;
use crate::application::renderer::ImageRenderer;
use crate::application::resolver::resolve_variables;
use crate::domain::dashboard::{DashboardDef, PanelDef, PanelsConfig};
use crate::domain::options::{RenderOptions, Timespan};
use crate::domain::resolution::{Choice, Resolution};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Out-of-scope chat platform collaborator: everything the user sees goes
/// through this seam.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn send_message(&self, text: &str);
    async fn send_error(&self, text: &str);
    async fn prompt_from_menu(&self, prompt: &str, choices: &[Choice]);
    async fn send_image(&self, filename: &str, image: &[u8]);
}

/// Shared handle on the panels configuration. Each invocation takes one
/// snapshot up front and never observes a different panel set mid-request;
/// `replace` swaps the snapshot for subsequent invocations.
pub struct ConfigHandle {
    inner: RwLock<Arc<PanelsConfig>>,
}

impl ConfigHandle {
    pub fn new(config: PanelsConfig) -> Self {
        Self {
            inner: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<PanelsConfig> {
        self.inner.read().expect("config lock poisoned").clone()
    }

    pub fn replace(&self, config: PanelsConfig) {
        *self.inner.write().expect("config lock poisoned") = Arc::new(config);
    }
}

/// Subcommand lookup table derived from one configuration snapshot. Rebuilt
/// per invocation, so dispatch is a map lookup rather than a scan over the
/// dashboards tree.
pub struct CommandRegistry<'a> {
    commands: HashMap<String, (&'a DashboardDef, &'a PanelDef)>,
}

impl<'a> CommandRegistry<'a> {
    pub fn from_config(config: &'a PanelsConfig) -> Self {
        let mut commands = HashMap::new();
        for dashboard in &config.dashboards {
            for panel in &dashboard.panels {
                commands.insert(panel.subcommand(), (dashboard, panel));
            }
        }
        Self { commands }
    }

    pub fn lookup(&self, subcommand: &str) -> Option<(&'a DashboardDef, &'a PanelDef)> {
        self.commands.get(subcommand).copied()
    }

    /// Registered subcommand names, sorted for stable listings.
    pub fn subcommands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Routes one chat invocation through the panel request pipeline. All state
/// is per-invocation: render options are built fresh from the defaults every
/// time and never stored back.
pub struct Dispatcher {
    config: Arc<ConfigHandle>,
    catalog: Arc<dyn EntityCatalog>,
    renderer: Arc<dyn ImageRenderer>,
    base_url: String,
    org_id: i64,
    defaults: RenderOptions,
}

impl Dispatcher {
    pub fn new(
        config: Arc<ConfigHandle>,
        catalog: Arc<dyn EntityCatalog>,
        renderer: Arc<dyn ImageRenderer>,
        base_url: String,
        org_id: i64,
        defaults: RenderOptions,
    ) -> Self {
        Self {
            config,
            catalog,
            renderer,
            base_url,
            org_id,
            defaults,
        }
    }

    /// Handle one `get-<panel>` invocation. Returns true only when an image
    /// was delivered; every other outcome (errors, a disambiguation menu)
    /// stops the pipeline after a single chat message.
    pub async fn handle(
        &self,
        subcommand: &str,
        tokens: &[String],
        responder: &dyn ChatResponder,
    ) -> bool {
        let snapshot = self.config.snapshot();
        let registry = CommandRegistry::from_config(&snapshot);
        let Some((dashboard, panel)) = registry.lookup(subcommand) else {
            responder
                .send_error(&format!("Command {subcommand} not found"))
                .await;
            return false;
        };

        let parsed = parse_args(panel, tokens);

        let mut options = self.defaults.clone();
        for (field, raw) in &parsed.overrides {
            if let Err(err) = options.set(*field, raw) {
                responder.send_error(&err.to_string()).await;
                return false;
            }
        }

        let resolution =
            match resolve_variables(panel, &parsed.variables, self.catalog.as_ref()).await {
                Ok(resolution) => resolution,
                Err(err) => {
                    tracing::error!(subcommand, error = %err, "panel definition error");
                    responder
                        .send_error(&format!(
                            "There was an error with your panel definition: {err}"
                        ))
                        .await;
                    return false;
                }
            };

        let variables = match resolution {
            Resolution::Complete(variables) => variables,
            Resolution::NeedsChoice {
                prompt, choices, ..
            } => {
                responder.prompt_from_menu(&prompt, &choices).await;
                return false;
            }
        };

        // Single consistent time snapshot for from/to and the filename.
        let now = Utc::now();
        let request = build_panel_request(
            &self.base_url,
            self.org_id,
            dashboard,
            panel,
            &variables,
            &options,
            now,
        );

        responder
            .send_message(&format!(
                "Standby, fetching {}. This can take up to 60 seconds.",
                panel.friendly_name
            ))
            .await;

        let Some(image) = self.renderer.fetch_panel_image(&request).await else {
            responder
                .send_error("An error occurred while accessing Grafana")
                .await;
            return false;
        };

        let filename = image_filename(subcommand, &options.timespan, now);
        responder.send_image(&filename, &image).await;
        true
    }
}

/// Image filename carrying the rendered time window. Uses '-' separators
/// throughout; Teams silently drops files with ':' in the name.
fn image_filename(subcommand: &str, timespan: &Timespan, now: DateTime<Utc>) -> String {
    let fmt = "%Y-%m-%d-%H-%M-%S";
    if timespan.is_zero() {
        format!("{}_{}.png", subcommand, now.format(fmt))
    } else {
        let from = timespan.subtract_from(now);
        format!(
            "{}_{}-to-{}.png",
            subcommand,
            from.format(fmt),
            now.format(fmt)
        )
    }
}
