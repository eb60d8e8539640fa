//! Dashboard State
//! Holds the selected region and the four derived views built from it.

use crate::charts::views::{self, DashboardViews};
use crate::data::Dataset;
use crate::stats::{AggregateError, IncidentStats};
use std::sync::Arc;

/// Map camera settings that do not depend on the selection.
#[derive(Debug, Clone)]
pub struct MapSettings {
    pub zoom: u8,
    pub style: String,
}

/// Selection state over an immutable dataset.
pub struct Dashboard {
    dataset: Arc<Dataset>,
    map: MapSettings,
    selected: String,
    views: DashboardViews,
}

impl Dashboard {
    /// Build the dashboard with `initial_region` selected.
    ///
    /// Falls back to the first region when `initial_region` is not in the
    /// dataset. Fails only for a dataset without regions.
    pub fn new(
        dataset: Arc<Dataset>,
        initial_region: &str,
        map: MapSettings,
    ) -> Result<Self, AggregateError> {
        let selected = if dataset.has_region(initial_region) {
            initial_region.to_string()
        } else {
            let fallback = dataset
                .regions()
                .first()
                .cloned()
                .ok_or_else(|| AggregateError::RegionNotFound(initial_region.to_string()))?;
            log::warn!("Initial region `{initial_region}` not in dataset, selecting `{fallback}`");
            fallback
        };

        let views = Self::compute_views(&dataset, &selected, &map)?;
        Ok(Self {
            dataset,
            map,
            selected,
            views,
        })
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn regions(&self) -> &[String] {
        self.dataset.regions()
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn views(&self) -> &DashboardViews {
        &self.views
    }

    /// Switch to `region`, recomputing every view.
    ///
    /// Returns `Ok(false)` when `region` is already selected. On error the
    /// previous selection and views are kept.
    pub fn select_region(&mut self, region: &str) -> Result<bool, AggregateError> {
        if region == self.selected {
            return Ok(false);
        }

        let views = Self::compute_views(&self.dataset, region, &self.map)?;
        log::debug!("Selected region `{region}`");
        self.selected = region.to_string();
        self.views = views;
        Ok(true)
    }

    /// Build all four views for `region`. The views are independent and are
    /// computed in parallel.
    pub fn compute_views(
        dataset: &Dataset,
        region: &str,
        map: &MapSettings,
    ) -> Result<DashboardViews, AggregateError> {
        let ((map_view, counters), (trend, causes)) = rayon::join(
            || {
                rayon::join(
                    || -> Result<_, AggregateError> {
                        let center = IncidentStats::region_centroid(dataset, region)?;
                        let locations = IncidentStats::incidents_by_location(dataset, None)?;
                        Ok(views::build_map_view(&locations, center, map.zoom, &map.style))
                    },
                    || -> Result<_, AggregateError> {
                        Ok(views::build_counters(
                            IncidentStats::total_incident_count(dataset, region)?,
                            IncidentStats::total_persons_affected(dataset, region)?,
                        ))
                    },
                )
            },
            || {
                rayon::join(
                    || {
                        IncidentStats::monthly_incident_trend(dataset, region)
                            .map(|trend| views::build_trend_view(region, &trend))
                    },
                    || {
                        IncidentStats::cause_breakdown(dataset, region)
                            .map(|causes| views::build_cause_view(&causes))
                    },
                )
            },
        );

        Ok(DashboardViews {
            region: region.to_string(),
            map: map_view?,
            trend: trend?,
            causes: causes?,
            counters: counters?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::record;
    use std::collections::HashSet;

    fn settings() -> MapSettings {
        MapSettings {
            zoom: 8,
            style: "dark-v11".to_string(),
        }
    }

    fn dataset() -> Arc<Dataset> {
        let mut incheon = record("인천", 2, 4, 1_500, "기상악화");
        incheon.latitude = 37.4;
        incheon.longitude = 126.6;
        Arc::new(Dataset::from_records(vec![
            record("평택", 3, 1, 2, "기타"),
            incheon,
            record("평택", 7, 2, 3, "운항부주의"),
        ]))
    }

    #[test]
    fn starts_on_initial_region() {
        let dashboard = Dashboard::new(dataset(), "평택", settings()).unwrap();
        assert_eq!(dashboard.selected(), "평택");
        assert_eq!(dashboard.views().region, "평택");
        assert_eq!(dashboard.views().counters.incidents, "3건");
        assert_eq!(dashboard.views().map.center, (36.0, 127.0));
    }

    #[test]
    fn unknown_initial_region_falls_back_to_first() {
        let dashboard = Dashboard::new(dataset(), "부산", settings()).unwrap();
        assert_eq!(dashboard.selected(), "평택");
    }

    #[test]
    fn empty_dataset_cannot_build() {
        let empty = Arc::new(Dataset::from_records(Vec::new()));
        assert!(Dashboard::new(empty, "평택", settings()).is_err());
    }

    #[test]
    fn selection_replaces_all_views() {
        let mut dashboard = Dashboard::new(dataset(), "평택", settings()).unwrap();
        assert_eq!(dashboard.select_region("인천"), Ok(true));

        let views = dashboard.views();
        assert_eq!(views.region, "인천");
        assert_eq!(views.counters.incidents, "4건");
        assert_eq!(views.counters.persons, "1,500명");
        assert_eq!(views.trend.title, "월별 사고발생건수_인천");
        assert_eq!(views.trend.points, vec![[2.0, 1500.0]]);
        assert_eq!(views.causes.total, 1);
        assert_eq!(views.map.center, (37.4, 126.6));
        // map shows every region regardless of selection
        assert_eq!(views.map.markers.len(), 3);
    }

    #[test]
    fn reselecting_is_a_no_op() {
        let mut dashboard = Dashboard::new(dataset(), "평택", settings()).unwrap();
        let before = dashboard.views().clone();
        assert_eq!(dashboard.select_region("평택"), Ok(false));
        assert_eq!(dashboard.views(), &before);
    }

    #[test]
    fn unknown_selection_keeps_state() {
        let mut dashboard = Dashboard::new(dataset(), "평택", settings()).unwrap();
        let before = dashboard.views().clone();
        assert_eq!(
            dashboard.select_region("부산"),
            Err(AggregateError::RegionNotFound("부산".to_string()))
        );
        assert_eq!(dashboard.selected(), "평택");
        assert_eq!(dashboard.views(), &before);
    }

    #[test]
    fn selector_offers_each_region_once() {
        let dashboard = Dashboard::new(dataset(), "평택", settings()).unwrap();
        let offered: HashSet<&String> = dashboard.regions().iter().collect();
        assert_eq!(offered.len(), dashboard.regions().len());
        assert_eq!(offered.len(), 2);
    }

    #[test]
    fn recomputing_is_identical() {
        let data = dataset();
        let first = Dashboard::compute_views(&data, "인천", &settings()).unwrap();
        let second = Dashboard::compute_views(&data, "인천", &settings()).unwrap();
        assert_eq!(first, second);
    }
}
