// CLI entry point - one-shot panel fetches, discovery listing, validation
use std::sync::Arc;

use grafana_chatops::application::dispatcher::{CommandRegistry, ConfigHandle, Dispatcher};
use grafana_chatops::infrastructure::config::{load_grafana_settings, load_panels_config};
use grafana_chatops::infrastructure::grafana_client::GrafanaClient;
use grafana_chatops::infrastructure::static_catalog::StaticCatalog;
use grafana_chatops::presentation::cli::CliResponder;

const USAGE: &str = "usage: grafana-chatops <command>
  get-<panel> [args..] [width=N] [height=N] [theme=light|dark] [timespan=P1D] [timezone=TZ]
  commands     list the panel subcommands from the current configuration
  dashboards   list dashboards known to the Grafana API
  panels <uid> list panels of one dashboard
  validate     run the panels configuration schema check";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("commands") => {
            let panels = load_panels_config()?;
            let registry = CommandRegistry::from_config(&panels);
            for subcommand in registry.subcommands() {
                println!("{subcommand}");
            }
        }
        Some("dashboards") => {
            let settings = load_grafana_settings()?;
            let client = GrafanaClient::new(&settings.grafana_url, &settings.grafana_api_key)?;
            for dashboard in client.list_dashboards().await {
                println!("{}  {}  {}", dashboard.uid, dashboard.uri, dashboard.title);
            }
        }
        Some("panels") => {
            let uid = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("panels requires a dashboard uid"))?;
            let settings = load_grafana_settings()?;
            let client = GrafanaClient::new(&settings.grafana_url, &settings.grafana_api_key)?;
            for panel in client.list_panels(uid).await {
                println!("{}  {}", panel.id, panel.title);
            }
        }
        Some("validate") => {
            let panels = load_panels_config()?;
            let count: usize = panels.dashboards.iter().map(|d| d.panels.len()).sum();
            println!(
                "configuration is valid: {} dashboards, {} panels",
                panels.dashboards.len(),
                count
            );
        }
        Some(subcommand) if subcommand.starts_with("get-") => {
            let delivered = run_panel(subcommand, &args[1..]).await?;
            if !delivered {
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
    Ok(())
}

async fn run_panel(subcommand: &str, tokens: &[String]) -> anyhow::Result<bool> {
    let settings = load_grafana_settings()?;
    let panels = load_panels_config()?;
    let defaults = settings.default_options()?;

    let catalog = Arc::new(StaticCatalog::load()?);
    let renderer = Arc::new(GrafanaClient::new(
        &settings.grafana_url,
        &settings.grafana_api_key,
    )?);

    let dispatcher = Dispatcher::new(
        Arc::new(ConfigHandle::new(panels)),
        catalog,
        renderer,
        settings.grafana_url.clone(),
        settings.grafana_org_id,
        defaults,
    );
    Ok(dispatcher.handle(subcommand, tokens, &CliResponder).await)
}
