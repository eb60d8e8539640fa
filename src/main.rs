//! Marine Dashboard - Interactive view of marine distress incidents
//!
//! Loads the coast-guard incident CSV once and shows a per-region map,
//! monthly trend, cause breakdown and summary counters.

mod charts;
mod config;
mod dashboard;
mod data;
mod export;
mod gui;
mod stats;

use anyhow::{anyhow, Context};
use config::AppConfig;
use dashboard::{Dashboard, MapSettings};
use data::DataLoader;
use eframe::egui;
use gui::MarineApp;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::from_env();
    log::info!(
        "Loading {} ({})",
        config.data_path.display(),
        config.encoding.name()
    );

    let dataset = DataLoader::load(&config.data_path, config.encoding)
        .with_context(|| format!("Failed to load {}", config.data_path.display()))?;
    log::info!(
        "Loaded {} incidents across {} regions",
        dataset.len(),
        dataset.regions().len()
    );

    let years = dataset.years();
    if years.len() > 1 {
        log::warn!("Dataset spans years {years:?}; the monthly trend merges them by month");
    }

    let dashboard = Dashboard::new(
        Arc::new(dataset),
        &config.initial_region,
        MapSettings {
            zoom: config.map_zoom,
            style: config.map_style.clone(),
        },
    )?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 1000.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("marine"),
        ..Default::default()
    };

    eframe::run_native(
        "marine",
        options,
        Box::new(move |cc| Ok(Box::new(MarineApp::new(cc, dashboard, &config)))),
    )
    .map_err(|e| anyhow!("Failed to start window: {e}"))
}
