mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use auction_lens::{Dashboard, DashboardConfig};
use eframe::egui;

use app::AuctionLensApp;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let mut config = DashboardConfig::discover().context("loading configuration")?;
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_preferred_source(PathBuf::from(path));
    }

    // The dataset is read exactly once, before any window exists.
    let dashboard = Dashboard::open(config).context("loading auction data")?;
    let state = AppState::new(dashboard);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Auction Performance Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(AuctionLensApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
