//! topowiz Desktop — application entry.

mod app;

use anyhow::Context;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    app::install_logger();

    let (config, path) = topowiz::config::load_config(None)?;
    log::info!("config: {}", path.display());
    let client = topowiz::api::ApiClient::from_config(&config)
        .with_context(|| format!("building wizard client from {}", path.display()))?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "topowiz",
        options,
        Box::new(move |cc| Box::new(app::WizardApp::new(cc, runtime, client, &config))),
    )
    .map_err(|e| anyhow::anyhow!("desktop ui failed: {}", e))
}
