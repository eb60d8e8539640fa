//! Marine Dashboard Main Application
//! Main window with the control bar and the chart viewer.

use crate::charts::views::{BACKGROUND, FOREGROUND};
use crate::charts::{MapTile, MapTileClient, MapTileError, TileRequest};
use crate::config::{AppConfig, MAP_TOKEN_VAR};
use crate::dashboard::Dashboard;
use crate::export::SnapshotExporter;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::IncidentStats;
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

const FONT_NAME: &str = "hangul";

/// Outcome of polling the map tile channel once.
#[derive(Debug)]
enum TilePoll {
    Waiting,
    /// Tile for the request still pending; show it.
    Ready(MapTile),
    /// Tile answers a request that has been superseded.
    Stale,
    /// Fetch failed; the notice goes to the map panel only.
    Failed(String),
    /// Worker went away without answering.
    Abandoned,
}

fn poll_tile(
    pending: Option<&TileRequest>,
    received: Result<Result<MapTile, MapTileError>, TryRecvError>,
) -> TilePoll {
    match received {
        Ok(Ok(tile)) if pending == Some(&tile.request) => TilePoll::Ready(tile),
        Ok(Ok(_)) => TilePoll::Stale,
        Ok(Err(e)) => TilePoll::Failed(format!("Map background unavailable: {e}")),
        Err(TryRecvError::Empty) => TilePoll::Waiting,
        Err(TryRecvError::Disconnected) => TilePoll::Abandoned,
    }
}

/// Main application window.
pub struct MarineApp {
    dashboard: Dashboard,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async map tiles
    tile_client: Option<Arc<MapTileClient>>,
    tile_rx: Option<Receiver<Result<MapTile, MapTileError>>>,
    pending_tile: Option<TileRequest>,
}

impl MarineApp {
    pub fn new(cc: &eframe::CreationContext<'_>, dashboard: Dashboard, config: &AppConfig) -> Self {
        Self::apply_theme(&cc.egui_ctx);
        Self::install_font(&cc.egui_ctx, config.font_path.as_deref());

        let tile_client = match MapTileClient::new(config.map_token.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                log::warn!("Map tiles disabled: {e}");
                None
            }
        };

        let mut control_panel =
            ControlPanel::new(dashboard.regions().to_vec(), dashboard.selected());
        control_panel.set_status(
            &format!(
                "Loaded {} incidents, {} regions",
                dashboard.dataset().len(),
                dashboard.regions().len()
            ),
            false,
        );
        let mut app = Self {
            dashboard,
            control_panel,
            chart_viewer: ChartViewer::new(),
            tile_client,
            tile_rx: None,
            pending_tile: None,
        };
        app.request_map_tile();
        app
    }

    fn apply_theme(ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = BACKGROUND;
        visuals.window_fill = BACKGROUND;
        visuals.extreme_bg_color = BACKGROUND;
        visuals.override_text_color = Some(FOREGROUND);
        ctx.set_visuals(visuals);
    }

    /// Put the configured font first in both families so Hangul labels render.
    fn install_font(ctx: &egui::Context, path: Option<&Path>) {
        let Some(path) = path else {
            log::warn!("MARINE_FONT not set; Hangul labels may render as boxes");
            return;
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read font {}: {e}", path.display());
                return;
            }
        };

        let mut fonts = egui::FontDefinitions::default();
        fonts
            .font_data
            .insert(FONT_NAME.to_owned(), egui::FontData::from_owned(bytes).into());
        for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            fonts
                .families
                .entry(family)
                .or_default()
                .insert(0, FONT_NAME.to_owned());
        }
        ctx.set_fonts(fonts);
        log::info!("Loaded font {}", path.display());
    }

    /// Fetch the map background for the current view unless it is already
    /// on screen or in flight.
    fn request_map_tile(&mut self) {
        let map = &self.dashboard.views().map;
        let request = TileRequest::new(map.center, map.zoom, &map.style);

        if self.chart_viewer.map_request() == Some(&request)
            || self.pending_tile.as_ref() == Some(&request)
        {
            return;
        }

        let Some(client) = self.tile_client.as_ref().filter(|c| c.has_token()) else {
            self.chart_viewer.set_map_notice(Some(format!(
                "{MAP_TOKEN_VAR} not set; showing markers without a map background"
            )));
            return;
        };

        self.tile_rx = Some(MapTileClient::spawn_fetch(client, request.clone()));
        self.pending_tile = Some(request);
    }

    /// Check for map tile results
    fn check_tile_results(&mut self, ctx: &egui::Context) {
        let Some(rx) = self.tile_rx.take() else {
            return;
        };

        match poll_tile(self.pending_tile.as_ref(), rx.try_recv()) {
            TilePoll::Waiting => {
                self.tile_rx = Some(rx);
                return;
            }
            TilePoll::Ready(tile) => self.chart_viewer.set_map_tile(ctx, tile),
            TilePoll::Stale => log::debug!("Discarding map tile for a previous selection"),
            TilePoll::Failed(notice) => {
                log::warn!("{notice}");
                self.chart_viewer.set_map_notice(Some(notice));
            }
            TilePoll::Abandoned => {}
        }
        self.pending_tile = None;
    }

    fn handle_region_selected(&mut self, region: &str) {
        match self.dashboard.select_region(region) {
            Ok(true) => {
                self.control_panel.set_selected(region);
                self.control_panel.set_status(
                    &format!("Showing {}", self.dashboard.selected()),
                    false,
                );
                self.chart_viewer.recenter();
                self.request_map_tile();
            }
            Ok(false) => {}
            Err(e) => {
                log::error!("{e}");
                self.control_panel.set_status(&format!("Error: {e}"), true);
            }
        }
    }

    /// Handle snapshot export - PNG of the charts plus a JSON summary
    fn handle_export(&mut self) {
        let region = self.dashboard.selected().to_string();

        let output_path = match rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("marine_{region}.png"))
            .save_file()
        {
            Some(path) => path,
            None => return,
        };

        let summary = match IncidentStats::region_summary(self.dashboard.dataset(), &region) {
            Ok(summary) => summary,
            Err(e) => {
                self.control_panel.set_status(&format!("Error: {e}"), true);
                return;
            }
        };

        match SnapshotExporter::export(self.dashboard.views(), &summary, &output_path) {
            Ok(files) => {
                self.control_panel.set_status(
                    &format!(
                        "Exported {} and {}",
                        files.image.display(),
                        files.summary.display()
                    ),
                    false,
                );
                if let Err(e) = open::that(&files.image) {
                    log::warn!("Failed to open {}: {e}", files.image.display());
                }
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.control_panel.set_status(&format!("Error: {e}"), true);
            }
        }
    }
}

impl eframe::App for MarineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_tile_results(ctx);

        if self.tile_rx.is_some() {
            ctx.request_repaint();
        }

        let mut action = ControlPanelAction::None;
        egui::TopBottomPanel::top("control_panel")
            .frame(
                egui::Frame::none()
                    .fill(BACKGROUND)
                    .inner_margin(egui::Margin::symmetric(16.0, 8.0)),
            )
            .show(ctx, |ui| {
                action = self
                    .control_panel
                    .show(ui, &self.dashboard.views().counters);
            });

        match action {
            ControlPanelAction::RegionSelected(region) => self.handle_region_selected(&region),
            ControlPanelAction::Export => self.handle_export(),
            ControlPanelAction::None => {}
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(BACKGROUND).inner_margin(16.0))
            .show(ctx, |ui| {
                self.chart_viewer.show(ui, self.dashboard.views());
            });
    }
}
