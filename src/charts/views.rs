//! Dashboard View Payloads
//! Pure mapping from aggregation output to what each panel displays.
//! No drawing happens here; `plotter` and `renderer` consume these values.

use crate::stats::{CauseCount, LocationIncidents, MonthlyPoint};
use egui::ecolor::Hsva;
use egui::Color32;

/// Page and plot background (#010915).
pub const BACKGROUND: Color32 = Color32::from_rgb(1, 9, 21);
pub const FOREGROUND: Color32 = Color32::WHITE;
pub const DIM_GRAY: Color32 = Color32::from_rgb(105, 105, 105);

pub const PAGE_TITLE: &str = "2021년 해양조난사고 현황 🚢";
pub const SELECTOR_TITLE: &str = "관할해경서";
pub const INCIDENTS_TITLE: &str = "사고건수";
pub const PERSONS_TITLE: &str = "발생인원";
pub const CAUSE_CHART_TITLE: &str = "사고발생별 원인";

/// Pie colors, one per cause in `Cause::ALL` order.
pub const CAUSE_PALETTE: [Color32; 9] = [
    Color32::from_rgb(255, 255, 255), // white
    Color32::from_rgb(255, 165, 0),   // orange
    Color32::from_rgb(0, 128, 0),     // green
    Color32::from_rgb(255, 192, 203), // pink
    Color32::from_rgb(255, 215, 0),   // gold
    Color32::from_rgb(72, 209, 204),  // mediumturquoise
    Color32::from_rgb(255, 140, 0),   // darkorange
    Color32::from_rgb(144, 238, 144), // lightgreen
    Color32::from_rgb(135, 206, 250), // lightskyblue
];

pub const MARKER_OPACITY: f32 = 0.3;
/// Hue range of the marker colorscale; stops at magenta so the extremes differ.
const MARKER_HUE_SPAN: f32 = 5.0 / 6.0;
pub const PIE_ROTATION_DEG: f64 = 45.0;

/// Interpolated samples between two trend points.
const SPLINE_SAMPLES: usize = 12;

/// One scatter marker on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f32,
    pub color: Color32,
    pub hover: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Camera center as `(lat, lon)`.
    pub center: (f64, f64),
    pub zoom: u8,
    pub style: String,
    pub markers: Vec<MapMarker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub title: String,
    /// `[month, persons]` for each month present.
    pub points: Vec<[f64; 2]>,
    /// Smoothed polyline through `points`.
    pub curve: Vec<[f64; 2]>,
    pub line_color: Color32,
    pub line_width: f32,
    pub marker_fill: Color32,
    pub marker_outline: Color32,
    pub marker_radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: &'static str,
    pub value: u64,
    pub fraction: f64,
    pub color: Color32,
}

impl PieSlice {
    /// Text drawn on the slice (`label value`).
    pub fn text(&self) -> String {
        format!("{} {}", self.label, self.value)
    }

    /// Hover text (`label`, `value`, `percent`).
    pub fn hover(&self) -> String {
        format!("{}\n{}\n{:.1}%", self.label, self.value, self.fraction * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CauseView {
    pub title: String,
    pub slices: Vec<PieSlice>,
    pub total: u64,
    pub rotation_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counters {
    pub incidents: String,
    pub persons: String,
}

/// The four panel payloads for one selected region.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViews {
    pub region: String,
    pub map: MapView,
    pub trend: TrendView,
    pub causes: CauseView,
    pub counters: Counters,
}

/// Format a number with thousands separators and no decimals.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn build_counters(total_incidents: i64, total_persons: f64) -> Counters {
    Counters {
        incidents: format!("{total_incidents}건"),
        persons: format!("{}명", format_thousands(total_persons)),
    }
}

/// Map markers colored along an HSV scale over the vessel-count range.
pub fn build_map_view(locations: &[LocationIncidents], center: (f64, f64), zoom: u8, style: &str) -> MapView {
    let min = locations.iter().map(|l| l.vessel_count).min().unwrap_or(0);
    let max = locations.iter().map(|l| l.vessel_count).max().unwrap_or(0);
    let span = (max - min) as f32;

    let markers = locations
        .iter()
        .map(|l| {
            let t = if span > 0.0 {
                (l.vessel_count - min) as f32 / span
            } else {
                0.0
            };
            MapMarker {
                latitude: l.latitude,
                longitude: l.longitude,
                // sized by area
                radius: ((l.vessel_count.max(0) * 10) as f32).sqrt(),
                color: Color32::from(Hsva::new(t * MARKER_HUE_SPAN, 1.0, 1.0, MARKER_OPACITY)),
                hover: format!(
                    "사고선박수 : {}\n발생해역 : {}\n발생원인 : {}\n선종 : {}",
                    l.vessel_count, l.sea_area, l.cause, l.vessel_type
                ),
            }
        })
        .collect();

    MapView {
        center,
        zoom,
        style: style.to_string(),
        markers,
    }
}

pub fn build_trend_view(region: &str, trend: &[MonthlyPoint]) -> TrendView {
    let points: Vec<[f64; 2]> = trend
        .iter()
        .map(|p| [f64::from(p.month), p.persons_affected])
        .collect();

    TrendView {
        title: format!("월별 사고발생건수_{region}"),
        curve: smooth_curve(&points, SPLINE_SAMPLES),
        points,
        line_color: DIM_GRAY,
        line_width: 3.0,
        marker_fill: FOREGROUND,
        marker_outline: DIM_GRAY,
        marker_radius: 5.0,
    }
}

pub fn build_cause_view(causes: &[CauseCount]) -> CauseView {
    let total: u64 = causes.iter().map(|c| c.count).sum();

    let slices = causes
        .iter()
        .enumerate()
        .map(|(i, c)| PieSlice {
            label: c.cause.label(),
            value: c.count,
            fraction: if total > 0 {
                c.count as f64 / total as f64
            } else {
                0.0
            },
            color: CAUSE_PALETTE[i % CAUSE_PALETTE.len()],
        })
        .collect();

    CauseView {
        title: CAUSE_CHART_TITLE.to_string(),
        slices,
        total,
        rotation_deg: PIE_ROTATION_DEG,
    }
}

/// Catmull-Rom interpolation through `points`; passes through every input point.
pub fn smooth_curve(points: &[[f64; 2]], samples: usize) -> Vec<[f64; 2]> {
    if points.len() < 3 || samples == 0 {
        return points.to_vec();
    }

    let mut curve = Vec::with_capacity((points.len() - 1) * samples + 1);
    for i in 0..points.len() - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(points.len() - 1)];

        for step in 0..samples {
            let t = step as f64 / samples as f64;
            let t2 = t * t;
            let t3 = t2 * t;
            let blend = |a: f64, b: f64, c: f64, d: f64| {
                0.5 * (2.0 * b + (c - a) * t + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
                    + (3.0 * b - a - 3.0 * c + d) * t3)
            };
            curve.push([
                blend(p0[0], p1[0], p2[0], p3[0]),
                blend(p0[1], p1[1], p2[1], p3[1]),
            ]);
        }
    }
    curve.push(points[points.len() - 1]);
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cause;

    fn location(count: i64) -> LocationIncidents {
        LocationIncidents {
            region: "평택".to_string(),
            sea_area: "연안".to_string(),
            cause: "기상악화".to_string(),
            vessel_type: "어선".to_string(),
            latitude: 36.9,
            longitude: 126.8,
            vessel_count: count,
        }
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1_234_567.4), "1,234,567");
        assert_eq!(format_thousands(-45_000.0), "-45,000");
    }

    #[test]
    fn counter_text() {
        let counters = build_counters(42, 12_345.0);
        assert_eq!(counters.incidents, "42건");
        assert_eq!(counters.persons, "12,345명");
    }

    #[test]
    fn markers_scale_with_vessel_count() {
        let view = build_map_view(&[location(1), location(10)], (36.0, 127.0), 8, "dark-v11");
        assert_eq!(view.center, (36.0, 127.0));
        assert_eq!(view.markers.len(), 2);
        assert!(view.markers[1].radius > view.markers[0].radius);
        assert_ne!(view.markers[0].color, view.markers[1].color);
        assert!(view.markers[0].hover.starts_with("사고선박수 : 1\n"));
        assert!(view.markers[0].hover.ends_with("선종 : 어선"));
    }

    #[test]
    fn trend_view_uses_region_title() {
        let view = build_trend_view(
            "평택",
            &[
                MonthlyPoint { month: 3, persons_affected: 4.0 },
                MonthlyPoint { month: 7, persons_affected: 15.0 },
            ],
        );
        assert_eq!(view.title, "월별 사고발생건수_평택");
        assert_eq!(view.points, vec![[3.0, 4.0], [7.0, 15.0]]);
    }

    #[test]
    fn smooth_curve_passes_through_inputs() {
        let points = [[1.0, 2.0], [2.0, 8.0], [5.0, 3.0], [9.0, 9.0]];
        let curve = smooth_curve(&points, 4);
        assert_eq!(curve.len(), 13);
        for (k, p) in points.iter().enumerate() {
            let sample = curve[k * 4];
            assert!((sample[0] - p[0]).abs() < 1e-9 && (sample[1] - p[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn cause_view_covers_palette_and_fractions() {
        let causes: Vec<CauseCount> = Cause::ALL
            .into_iter()
            .enumerate()
            .map(|(i, cause)| CauseCount {
                cause,
                count: if i == 1 { 3 } else if i == 8 { 1 } else { 0 },
            })
            .collect();

        let view = build_cause_view(&causes);
        assert_eq!(view.total, 4);
        assert_eq!(view.slices.len(), 9);
        assert_eq!(view.slices[1].text(), "기상악화 3");
        assert_eq!(view.slices[1].fraction, 0.75);
        assert_eq!(view.slices[8].hover(), "기타\n1\n25.0%");
        assert_eq!(view.slices[0].fraction, 0.0);
    }

    #[test]
    fn every_cause_gets_its_own_color() {
        let colors: std::collections::HashSet<[u8; 4]> =
            CAUSE_PALETTE.iter().map(|c| c.to_array()).collect();
        assert_eq!(colors.len(), Cause::ALL.len());
    }

    #[test]
    fn empty_cause_view_has_zero_fractions() {
        let causes: Vec<CauseCount> = Cause::ALL
            .into_iter()
            .map(|cause| CauseCount { cause, count: 0 })
            .collect();
        let view = build_cause_view(&causes);
        assert_eq!(view.total, 0);
        assert!(view.slices.iter().all(|s| s.fraction == 0.0));
    }
}
