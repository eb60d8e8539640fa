//! Chart Plotter Module
//! Draws the dashboard views with egui / egui_plot.

use crate::charts::map_tiles::{plot_position, TileRequest};
use crate::charts::views::{CauseView, MapMarker, MapView, TrendView, BACKGROUND, FOREGROUND};
use egui::{Color32, Pos2, RichText, Shape, Stroke, TextureHandle};
use egui_plot::{GridMark, Line, MarkerShape, Plot, PlotBounds, PlotImage, PlotPoint, PlotPoints, Points};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// Widest arc drawn as one convex polygon.
const MAX_WEDGE_STEP: f64 = 0.1;
/// Hover pick distance on the map, in plot units (mercator pixels).
const MAP_PICK_DISTANCE: f64 = 12.0;

/// Start and end angle of each pie slice, in radians counterclockwise from
/// twelve o'clock, offset by the view's rotation.
pub fn slice_spans(view: &CauseView) -> Vec<(f64, f64)> {
    let mut start = view.rotation_deg.to_radians();
    view.slices
        .iter()
        .map(|slice| {
            let end = start + slice.fraction * TAU;
            let span = (start, end);
            start = end;
            span
        })
        .collect()
}

/// Index of the slice under `angle` (same convention as [`slice_spans`]).
pub fn slice_at_angle(spans: &[(f64, f64)], angle: f64) -> Option<usize> {
    let origin = spans.first()?.0;
    let offset = (angle - origin).rem_euclid(TAU) + origin;
    spans
        .iter()
        .position(|&(start, end)| end > start && offset >= start && offset < end)
}

fn polar(center: Pos2, radius: f32, angle: f64) -> Pos2 {
    Pos2::new(
        center.x - radius * angle.sin() as f32,
        center.y - radius * angle.cos() as f32,
    )
}

/// Creates the dashboard charts using egui_plot and the egui painter.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Monthly line chart: smoothed line with outlined markers.
    pub fn draw_trend_chart(ui: &mut egui::Ui, view: &TrendView, height: f32) {
        ui.label(RichText::new(&view.title).size(16.0).color(FOREGROUND));

        let curve = view.curve.clone();
        let points = view.points.clone();

        Plot::new("trend_chart")
            .height(height)
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label("month")
            .x_grid_spacer(|input| {
                let (lo, hi) = input.bounds;
                (lo.ceil().max(1.0) as i64..=hi.floor().min(12.0) as i64)
                    .map(|month| GridMark {
                        value: month as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .x_axis_formatter(|mark, _range| {
                if mark.value.fract() == 0.0 {
                    format!("{}", mark.value as i64)
                } else {
                    String::new()
                }
            })
            .label_formatter(|_name, value| format!("{:.0}월\n{:.0}", value.x, value.y))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::new(curve))
                        .color(view.line_color)
                        .width(view.line_width),
                );
                plot_ui.points(
                    Points::new(PlotPoints::new(points.clone()))
                        .shape(MarkerShape::Circle)
                        .radius(view.marker_radius + 2.0)
                        .color(view.marker_outline)
                        .filled(true),
                );
                plot_ui.points(
                    Points::new(PlotPoints::new(points))
                        .shape(MarkerShape::Circle)
                        .radius(view.marker_radius)
                        .color(view.marker_fill)
                        .filled(true),
                );
            });
    }

    /// Cause pie with slice labels, a legend and hover details.
    pub fn draw_cause_pie(ui: &mut egui::Ui, view: &CauseView, height: f32) {
        ui.label(RichText::new(&view.title).size(16.0).color(FOREGROUND));

        ui.horizontal(|ui| {
            let side = height.min(ui.available_width() * 0.65);
            let (rect, response) =
                ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());
            let painter = ui.painter_at(rect);
            let center = rect.center();
            let radius = side * 0.45;

            if view.total == 0 {
                painter.circle_stroke(center, radius, Stroke::new(1.0, Color32::DARK_GRAY));
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    "No Data",
                    egui::FontId::proportional(14.0),
                    FOREGROUND,
                );
            } else {
                let spans = slice_spans(view);
                for (slice, &(start, end)) in view.slices.iter().zip(&spans) {
                    if end <= start {
                        continue;
                    }
                    let steps = ((end - start) / MAX_WEDGE_STEP).ceil().max(1.0) as usize;
                    for k in 0..steps {
                        let a0 = start + (end - start) * k as f64 / steps as f64;
                        let a1 = start + (end - start) * (k + 1) as f64 / steps as f64;
                        painter.add(Shape::convex_polygon(
                            vec![center, polar(center, radius, a0), polar(center, radius, a1)],
                            slice.color,
                            Stroke::NONE,
                        ));
                    }
                    painter.line_segment(
                        [center, polar(center, radius, start)],
                        Stroke::new(1.0, BACKGROUND),
                    );
                }

                for (slice, &(start, end)) in view.slices.iter().zip(&spans) {
                    if slice.fraction < 0.04 {
                        continue;
                    }
                    let mid = (start + end) / 2.0;
                    painter.text(
                        polar(center, radius * 0.65, mid),
                        egui::Align2::CENTER_CENTER,
                        slice.text(),
                        egui::FontId::proportional(11.0),
                        Color32::BLACK,
                    );
                }

                if let Some(pointer) = response.hover_pos() {
                    let delta = pointer - center;
                    if delta.length() <= radius {
                        let angle = f64::from(-delta.x).atan2(f64::from(-delta.y));
                        if let Some(idx) = slice_at_angle(&spans, angle) {
                            response.on_hover_text_at_pointer(view.slices[idx].hover());
                        }
                    }
                }
            }

            ui.vertical(|ui| {
                for slice in &view.slices {
                    ui.horizontal(|ui| {
                        let (swatch, _) =
                            ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                        ui.painter().rect_filled(swatch, 2.0, slice.color);
                        ui.label(RichText::new(slice.label).size(12.0).color(FOREGROUND));
                    });
                }
            });
        });
    }

    /// Incident map: every location as a translucent marker over the provider
    /// tile. Bounds snap to the view center when `recenter` is set.
    pub fn draw_map(
        ui: &mut egui::Ui,
        view: &MapView,
        tile: Option<(&TextureHandle, &TileRequest)>,
        recenter: &mut bool,
        height: f32,
    ) {
        let zoom = view.zoom;
        let positioned: Vec<([f64; 2], &MapMarker)> = view
            .markers
            .iter()
            .map(|m| (plot_position(m.latitude, m.longitude, zoom), m))
            .collect();

        // One Points series per (radius, color) pair.
        let mut series: BTreeMap<(u32, [u8; 4]), Vec<[f64; 2]>> = BTreeMap::new();
        for (pos, marker) in &positioned {
            series
                .entry((marker.radius.to_bits(), marker.color.to_array()))
                .or_default()
                .push(*pos);
        }

        let hover_index: Vec<([f64; 2], String)> = positioned
            .iter()
            .map(|(pos, m)| (*pos, m.hover.clone()))
            .collect();

        let center = plot_position(view.center.0, view.center.1, zoom);
        let half_width = f64::from(ui.available_width()) / 2.0;
        let half_height = f64::from(height) / 2.0;
        let snap = std::mem::take(recenter);

        Plot::new("incident_map")
            .height(height)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .show_x(false)
            .show_y(false)
            .label_formatter(move |_name, value| {
                hover_index
                    .iter()
                    .map(|(pos, text)| ((pos[0] - value.x).hypot(pos[1] - value.y), text))
                    .filter(|(distance, _)| *distance <= MAP_PICK_DISTANCE)
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, text)| text.clone())
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                if snap {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [center[0] - half_width, center[1] - half_height],
                        [center[0] + half_width, center[1] + half_height],
                    ));
                }

                if let Some((texture, request)) = tile {
                    let tile_center = request.plot_center();
                    plot_ui.image(PlotImage::new(
                        texture.id(),
                        PlotPoint::new(tile_center[0], tile_center[1]),
                        egui::vec2(request.width as f32, request.height as f32),
                    ));
                }

                for ((radius_bits, [r, g, b, a]), positions) in series {
                    plot_ui.points(
                        Points::new(PlotPoints::new(positions))
                            .shape(MarkerShape::Circle)
                            .radius(f32::from_bits(radius_bits))
                            .color(Color32::from_rgba_premultiplied(r, g, b, a))
                            .filled(true),
                    );
                }
            });
    }
}
