//! Static Chart Renderer
//! Renders a snapshot of the selected region with plotters.
//!
//! Layout: monthly trend line chart on the left, cause pie on the right,
//! dashboard background and colors.

use crate::charts::views::{DashboardViews, PieSlice, BACKGROUND, FOREGROUND};
use egui::Color32;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const FONT: &str = "sans-serif";
const GRID: RGBColor = RGBColor(40, 48, 64);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart rendering failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn rgb(color: Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the trend and cause charts side by side to a PNG at `path`.
    pub fn render_png(
        views: &DashboardViews,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&rgb(BACKGROUND)).map_err(draw_err)?;

        let (left, right) = root.split_horizontally(width / 2);
        Self::draw_trend(&left, views)?;
        Self::draw_causes(&right, views)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    fn draw_trend<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        views: &DashboardViews,
    ) -> Result<(), RenderError> {
        let trend = &views.trend;
        let white = rgb(FOREGROUND);
        let line = rgb(trend.line_color);

        let y_max = trend
            .points
            .iter()
            .map(|p| p[1])
            .fold(0.0_f64, f64::max)
            .max(1.0)
            * 1.15;

        let mut chart = ChartBuilder::on(area)
            .caption(&trend.title, (FONT, 22).into_font().color(&white))
            .margin(20)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(0.5_f64..12.5_f64, 0.0_f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(12)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.0}", y))
            .axis_style(&white)
            .bold_line_style(&GRID)
            .light_line_style(&TRANSPARENT)
            .label_style((FONT, 14).into_font().color(&white))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                trend.curve.iter().map(|p| (p[0], p[1])),
                line.stroke_width(trend.line_width as u32),
            ))
            .map_err(draw_err)?;

        let radius = trend.marker_radius as i32;
        chart
            .draw_series(
                trend
                    .points
                    .iter()
                    .map(|p| {
                        Circle::new((p[0], p[1]), radius + 2, rgb(trend.marker_outline).filled())
                    }),
            )
            .map_err(draw_err)?;
        chart
            .draw_series(
                trend
                    .points
                    .iter()
                    .map(|p| Circle::new((p[0], p[1]), radius, rgb(trend.marker_fill).filled())),
            )
            .map_err(draw_err)?;

        Ok(())
    }

    fn draw_causes<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        views: &DashboardViews,
    ) -> Result<(), RenderError> {
        let causes = &views.causes;
        let white = rgb(FOREGROUND);

        let area = area
            .titled(&causes.title, (FONT, 22).into_font().color(&white))
            .map_err(draw_err)?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.35;

        if causes.total == 0 {
            area.draw_text(
                "No Data",
                &(FONT, 18).into_font().color(&white),
                (center.0 - 30, center.1),
            )
            .map_err(draw_err)?;
            return Ok(());
        }

        // plotters divides by the total; zero slices only clutter the labels
        let visible: Vec<&PieSlice> = causes.slices.iter().filter(|s| s.value > 0).collect();
        let sizes: Vec<f64> = visible.iter().map(|s| s.value as f64).collect();
        let colors: Vec<RGBColor> = visible.iter().map(|s| rgb(s.color)).collect();
        let labels: Vec<String> = visible.iter().map(|s| s.text()).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(causes.rotation_deg - 90.0);
        pie.label_style((FONT, 14).into_font().color(&white));
        pie.percentages((FONT, 12).into_font().color(&BLACK));
        area.draw(&pie).map_err(draw_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Dashboard, MapSettings};
    use crate::data::fixtures::record;
    use crate::data::Dataset;

    #[test]
    fn color_conversion_drops_alpha() {
        let color = rgb(BACKGROUND);
        assert_eq!((color.0, color.1, color.2), (1, 9, 21));
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn renders_png_snapshot() {
        let dataset = Dataset::from_records(vec![
            record("평택", 3, 1, 2, "기타"),
            record("평택", 7, 2, 3, "운항부주의"),
        ]);
        let map = MapSettings {
            zoom: 8,
            style: "dark-v11".to_string(),
        };
        let views = Dashboard::compute_views(&dataset, "평택", &map).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.png");
        StaticChartRenderer::render_png(&views, &path, 1200, 600).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (1200, 600));
    }
}
