// Grafana chatops panel engine - chat subcommands to rendered panel images
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
