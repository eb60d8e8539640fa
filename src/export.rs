//! Snapshot Export Module
//! Writes the selected region's charts as PNG and its aggregates as JSON.

use crate::charts::{DashboardViews, RenderError, StaticChartRenderer};
use crate::stats::RegionSummary;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SNAPSHOT_WIDTH: u32 = 1600;
pub const SNAPSHOT_HEIGHT: u32 = 700;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Files produced by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub image: PathBuf,
    pub summary: PathBuf,
}

pub struct SnapshotExporter;

impl SnapshotExporter {
    /// Render the PNG at `image_path` and write the summary next to it.
    pub fn export(
        views: &DashboardViews,
        summary: &RegionSummary,
        image_path: &Path,
    ) -> Result<ExportedFiles, ExportError> {
        let image = image_path.with_extension("png");
        StaticChartRenderer::render_png(views, &image, SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT)?;

        let summary_path = image.with_extension("json");
        Self::write_summary(summary, &summary_path)?;

        log::info!(
            "Exported snapshot for `{}` to {}",
            summary.region,
            image.display()
        );
        Ok(ExportedFiles {
            image,
            summary: summary_path,
        })
    }

    /// Write `summary` as pretty-printed JSON.
    pub fn write_summary(summary: &RegionSummary, path: &Path) -> Result<(), ExportError> {
        let io_err = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, summary)?;
        writer.flush().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::record;
    use crate::data::Dataset;
    use crate::stats::IncidentStats;

    #[test]
    fn summary_json_uses_cause_labels() {
        let dataset = Dataset::from_records(vec![
            record("평택", 3, 1, 2, "기상악화"),
            record("평택", 7, 2, 1_200, "배터리 방전"),
        ]);
        let summary = IncidentStats::region_summary(&dataset, "평택").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("평택.json");
        SnapshotExporter::write_summary(&summary, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["region"], "평택");
        assert_eq!(json["total_incidents"], 3);
        assert_eq!(json["total_persons_affected"], 1202.0);
        assert_eq!(json["monthly_trend"][1]["month"], 7);
        assert_eq!(json["causes"].as_array().unwrap().len(), 9);
        assert_eq!(json["causes"][1]["cause"], "기상악화");
        assert_eq!(json["causes"][2]["cause"], "배터리방전");
        assert_eq!(json["causes"][2]["count"], 1);
    }

    #[test]
    fn unwritable_summary_path_is_io_error() {
        let dataset = Dataset::from_records(vec![record("평택", 3, 1, 2, "기타")]);
        let summary = IncidentStats::region_summary(&dataset, "평택").unwrap();

        let err = SnapshotExporter::write_summary(&summary, Path::new("/nonexistent/dir/out.json"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
