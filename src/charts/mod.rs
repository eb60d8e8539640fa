//! Charts module - View payloads, chart rendering and map tiles

pub mod map_tiles;
mod plotter;
mod renderer;
pub mod views;

pub use map_tiles::{MapTile, MapTileClient, MapTileError, TileRequest};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
pub use views::DashboardViews;
