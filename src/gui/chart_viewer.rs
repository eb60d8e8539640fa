//! Chart Viewer Widget
//! Scrollable central panel: trend and cause charts side by side, incident
//! map below.

use crate::charts::views::{DashboardViews, DIM_GRAY, FOREGROUND};
use crate::charts::{ChartPlotter, MapTile, TileRequest};
use egui::{RichText, ScrollArea, TextureHandle};

const CHART_SPACING: f32 = 15.0;
const CHART_HEIGHT: f32 = 360.0;
const MAP_HEIGHT: f32 = 560.0;

/// Displays the views of the selected region.
pub struct ChartViewer {
    /// Map background currently on screen and the request it answers.
    map_tile: Option<(TextureHandle, TileRequest)>,
    map_notice: Option<String>,
    /// Snap the map bounds to the view center on the next frame.
    recenter: bool,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            map_tile: None,
            map_notice: None,
            recenter: true,
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a fetched tile as the map background.
    pub fn set_map_tile(&mut self, ctx: &egui::Context, tile: MapTile) {
        let image = egui::ColorImage::from_rgba_unmultiplied(tile.size, &tile.rgba);
        let texture = ctx.load_texture("map_tile", image, egui::TextureOptions::LINEAR);
        self.map_tile = Some((texture, tile.request));
        self.map_notice = None;
    }

    /// Request of the tile on screen, if any.
    pub fn map_request(&self) -> Option<&TileRequest> {
        self.map_tile.as_ref().map(|(_, request)| request)
    }

    pub fn set_map_notice(&mut self, notice: Option<String>) {
        self.map_notice = notice;
    }

    pub fn recenter(&mut self) {
        self.recenter = true;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, views: &DashboardViews) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let half_width = (ui.available_width() - CHART_SPACING) / 2.0;

                ui.horizontal(|ui| {
                    Self::card(ui, half_width, |ui| {
                        ChartPlotter::draw_trend_chart(ui, &views.trend, CHART_HEIGHT);
                    });
                    ui.add_space(CHART_SPACING);
                    Self::card(ui, half_width, |ui| {
                        ChartPlotter::draw_cause_pie(ui, &views.causes, CHART_HEIGHT);
                    });
                });

                ui.add_space(CHART_SPACING);

                let full_width = ui.available_width();
                Self::card(ui, full_width, |ui| {
                    if let Some(notice) = &self.map_notice {
                        ui.label(RichText::new(notice).size(11.0).color(DIM_GRAY));
                    }
                    let tile = self
                        .map_tile
                        .as_ref()
                        .map(|(texture, request)| (texture, request));
                    ChartPlotter::draw_map(ui, &views.map, tile, &mut self.recenter, MAP_HEIGHT);
                });
            });
    }

    fn card(ui: &mut egui::Ui, width: f32, body: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, DIM_GRAY))
            .fill(ui.visuals().panel_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                // inner margin on both sides
                ui.set_width(width - 26.0);
                ui.visuals_mut().override_text_color = Some(FOREGROUND);
                body(ui);
            });
    }
}
