mod backend_bridge;
mod controller;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::DesktopGuiApp;

const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Parser, Debug)]
#[command(name = "skillchain-gui")]
struct Args {
    /// TOML settings file; defaults to ./skillchain.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    node_url: Option<String>,
    #[arg(long)]
    module_address: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();
    let args = Args::parse();

    let (mut settings, startup_error) = match load_settings(args.config.as_deref()) {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("failed to load settings: {err}");
            (
                ClientSettings::default(),
                Some(UiError::from_message(UiErrorContext::Settings, err.to_string())),
            )
        }
    };
    if let Some(node_url) = args.node_url {
        settings.node_url = node_url;
    }
    if let Some(module_address) = args.module_address {
        settings.module_address = module_address;
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    if let Some(err) = startup_error {
        let _ = ui_tx.try_send(UiEvent::Error(err));
    }
    backend_bridge::runtime::launch(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SkillChain")
            .with_inner_size([1100.0, 780.0])
            .with_min_inner_size([760.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "SkillChain",
        options,
        Box::new(|_cc| Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx, settings)))),
    )
}
