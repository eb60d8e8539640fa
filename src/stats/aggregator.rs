//! Incident Aggregation Module
//! Pure group-by transforms over the immutable dataset, keyed by region.

use crate::data::{Cause, Dataset, IncidentRecord};
use chrono::Datelike;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Region `{0}` is not present in the dataset")]
    RegionNotFound(String),
}

/// Summed vessel count for one (region, sea area, cause, vessel type, position).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationIncidents {
    pub region: String,
    pub sea_area: String,
    pub cause: String,
    pub vessel_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vessel_count: i64,
}

/// Persons affected in one calendar month (1..=12).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: u32,
    pub persons_affected: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CauseCount {
    pub cause: Cause,
    pub count: u64,
}

/// Everything the dashboard shows for one region, in one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub centroid: (f64, f64),
    pub total_incidents: i64,
    pub total_persons_affected: f64,
    pub monthly_trend: Vec<MonthlyPoint>,
    pub causes: Vec<CauseCount>,
}

/// Coordinate usable as an ordered grouping key.
#[derive(Debug, Clone, Copy)]
struct Coord(f64);

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

type LocationKey<'a> = (&'a str, &'a str, &'a str, &'a str, Coord, Coord);

/// Stateless aggregation over a borrowed `Dataset`.
pub struct IncidentStats;

impl IncidentStats {
    fn ensure_region(dataset: &Dataset, region: &str) -> Result<(), AggregateError> {
        if dataset.has_region(region) {
            Ok(())
        } else {
            Err(AggregateError::RegionNotFound(region.to_string()))
        }
    }

    /// First coordinate pair recorded for `region`, as `(lat, lon)`.
    pub fn region_centroid(dataset: &Dataset, region: &str) -> Result<(f64, f64), AggregateError> {
        dataset
            .records_for(region)
            .next()
            .map(|r| (r.latitude, r.longitude))
            .ok_or_else(|| AggregateError::RegionNotFound(region.to_string()))
    }

    /// Vessel counts grouped by location key, ordered by that key.
    ///
    /// `None` covers the whole dataset; the map shows every region.
    pub fn incidents_by_location(
        dataset: &Dataset,
        region: Option<&str>,
    ) -> Result<Vec<LocationIncidents>, AggregateError> {
        if let Some(region) = region {
            Self::ensure_region(dataset, region)?;
        }

        let mut groups: BTreeMap<LocationKey<'_>, i64> = BTreeMap::new();
        let rows = dataset
            .records()
            .iter()
            .filter(|r| region.map_or(true, |wanted| r.region == wanted));

        for r in rows {
            let key = (
                r.region.as_str(),
                r.sea_area.as_str(),
                r.cause_raw.as_str(),
                r.vessel_type.as_str(),
                Coord(r.latitude),
                Coord(r.longitude),
            );
            *groups.entry(key).or_insert(0) += r.vessel_count;
        }

        Ok(groups
            .into_iter()
            .map(
                |((region, sea_area, cause, vessel_type, lat, lon), vessel_count)| LocationIncidents {
                    region: region.to_string(),
                    sea_area: sea_area.to_string(),
                    cause: cause.to_string(),
                    vessel_type: vessel_type.to_string(),
                    latitude: lat.0,
                    longitude: lon.0,
                    vessel_count,
                },
            )
            .collect())
    }

    /// Sum of vessel counts over the region's rows.
    pub fn total_incident_count(dataset: &Dataset, region: &str) -> Result<i64, AggregateError> {
        Self::ensure_region(dataset, region)?;
        Ok(dataset.records_for(region).map(|r| r.vessel_count).sum())
    }

    /// Sum of persons affected over the region's rows.
    pub fn total_persons_affected(dataset: &Dataset, region: &str) -> Result<f64, AggregateError> {
        Self::ensure_region(dataset, region)?;
        Ok(dataset
            .records_for(region)
            .map(|r| r.persons_affected as f64)
            .sum())
    }

    /// Persons affected per month, ascending; months without rows are absent.
    ///
    /// Only the month number is kept, so the same month of different years
    /// falls into one bucket.
    pub fn monthly_incident_trend(
        dataset: &Dataset,
        region: &str,
    ) -> Result<Vec<MonthlyPoint>, AggregateError> {
        Self::ensure_region(dataset, region)?;

        let mut rows: Vec<&IncidentRecord> = dataset.records_for(region).collect();
        rows.sort_by_key(|r| r.occurred_at);

        let mut months: BTreeMap<u32, f64> = BTreeMap::new();
        for r in rows {
            *months.entry(r.occurred_at.date().month()).or_insert(0.0) += r.persons_affected as f64;
        }

        Ok(months
            .into_iter()
            .map(|(month, persons_affected)| MonthlyPoint {
                month,
                persons_affected,
            })
            .collect())
    }

    /// Incident count for each of the nine causes, in `Cause::ALL` order.
    ///
    /// Rows without an incident type are not counted. Causes with no rows
    /// are filled with zero.
    pub fn cause_breakdown(dataset: &Dataset, region: &str) -> Result<Vec<CauseCount>, AggregateError> {
        Self::ensure_region(dataset, region)?;

        let mut counts: HashMap<Cause, u64> = HashMap::new();
        for r in dataset.records_for(region).filter(|r| r.incident_type.is_some()) {
            if let Some(cause) = r.cause {
                *counts.entry(cause).or_insert(0) += 1;
            }
        }

        Ok(Cause::ALL
            .into_iter()
            .map(|cause| CauseCount {
                cause,
                count: counts.get(&cause).copied().unwrap_or(0),
            })
            .collect())
    }

    /// All per-region aggregates in one bundle.
    pub fn region_summary(dataset: &Dataset, region: &str) -> Result<RegionSummary, AggregateError> {
        Ok(RegionSummary {
            region: region.to_string(),
            centroid: Self::region_centroid(dataset, region)?,
            total_incidents: Self::total_incident_count(dataset, region)?,
            total_persons_affected: Self::total_persons_affected(dataset, region)?,
            monthly_trend: Self::monthly_incident_trend(dataset, region)?,
            causes: Self::cause_breakdown(dataset, region)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::record;
    use proptest::prelude::*;

    fn sample() -> Dataset {
        let mut first = record("평택", 3, 1, 4, "기상악화");
        first.latitude = 36.0;
        first.longitude = 127.0;
        let mut second = record("평택", 7, 2, 10, "배터리 방전");
        second.latitude = 36.9;
        second.longitude = 126.5;

        Dataset::from_records(vec![
            first,
            record("인천", 7, 5, 100, "기상악화"),
            second,
            record("평택", 7, 1, 5, "기상악화"),
            record("평택", 12, 3, 1, "충돌"),
        ])
    }

    #[test]
    fn centroid_is_first_pair_in_dataset_order() {
        let dataset = sample();
        assert_eq!(
            IncidentStats::region_centroid(&dataset, "평택").unwrap(),
            (36.0, 127.0)
        );
    }

    #[test]
    fn totals_do_not_leak_across_regions() {
        let dataset = sample();
        assert_eq!(IncidentStats::total_incident_count(&dataset, "평택").unwrap(), 7);
        assert_eq!(IncidentStats::total_incident_count(&dataset, "인천").unwrap(), 5);
        assert_eq!(IncidentStats::total_persons_affected(&dataset, "평택").unwrap(), 20.0);
        assert_eq!(IncidentStats::total_persons_affected(&dataset, "인천").unwrap(), 100.0);
    }

    #[test]
    fn monthly_trend_skips_empty_months_and_sums_duplicates() {
        let dataset = sample();
        let trend = IncidentStats::monthly_incident_trend(&dataset, "평택").unwrap();
        assert_eq!(
            trend,
            vec![
                MonthlyPoint { month: 3, persons_affected: 4.0 },
                MonthlyPoint { month: 7, persons_affected: 15.0 },
                MonthlyPoint { month: 12, persons_affected: 1.0 },
            ]
        );
    }

    #[test]
    fn monthly_trend_merges_years() {
        let mut late = record("평택", 5, 1, 2, "기타");
        late.occurred_at = late.occurred_at.with_year(2021).unwrap();
        let dataset = Dataset::from_records(vec![record("평택", 5, 1, 3, "기타"), late]);

        let trend = IncidentStats::monthly_incident_trend(&dataset, "평택").unwrap();
        assert_eq!(trend, vec![MonthlyPoint { month: 5, persons_affected: 5.0 }]);
    }

    #[test]
    fn cause_breakdown_zero_fills_all_nine() {
        let dataset = sample();
        let causes = IncidentStats::cause_breakdown(&dataset, "평택").unwrap();

        assert_eq!(causes.len(), 9);
        let as_map: HashMap<Cause, u64> = causes.iter().map(|c| (c.cause, c.count)).collect();
        assert_eq!(as_map[&Cause::Weather], 2);
        assert_eq!(as_map[&Cause::BatteryDischarge], 1);
        assert_eq!(as_map[&Cause::FireHandling], 0);
        assert_eq!(as_map[&Cause::Other], 0);
    }

    #[test]
    fn cause_breakdown_skips_rows_without_incident_type() {
        let mut untyped = record("평택", 1, 1, 1, "기타");
        untyped.incident_type = None;
        let dataset = Dataset::from_records(vec![untyped, record("평택", 1, 1, 1, "기타")]);

        let causes = IncidentStats::cause_breakdown(&dataset, "평택").unwrap();
        assert_eq!(causes[8], CauseCount { cause: Cause::Other, count: 1 });
    }

    #[test]
    fn locations_group_whole_dataset() {
        let mut dup = record("인천", 7, 4, 0, "기상악화");
        dup.sea_area = "연안".to_string();
        let dataset = Dataset::from_records(vec![
            record("인천", 7, 5, 100, "기상악화"),
            dup,
            record("평택", 1, 2, 0, "기상악화"),
        ]);

        let all = IncidentStats::incidents_by_location(&dataset, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].region, "인천");
        assert_eq!(all[0].vessel_count, 9);
        assert_eq!(all[1].region, "평택");

        let one = IncidentStats::incidents_by_location(&dataset, Some("평택")).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].vessel_count, 2);
    }

    #[test]
    fn unknown_region_is_not_found_everywhere() {
        let dataset = sample();
        let missing = AggregateError::RegionNotFound("부산".to_string());

        assert_eq!(IncidentStats::region_centroid(&dataset, "부산"), Err(missing.clone()));
        assert_eq!(IncidentStats::total_incident_count(&dataset, "부산"), Err(missing.clone()));
        assert_eq!(IncidentStats::total_persons_affected(&dataset, "부산"), Err(missing.clone()));
        assert_eq!(IncidentStats::monthly_incident_trend(&dataset, "부산"), Err(missing.clone()));
        assert_eq!(IncidentStats::cause_breakdown(&dataset, "부산"), Err(missing.clone()));
        assert_eq!(
            IncidentStats::incidents_by_location(&dataset, Some("부산")),
            Err(missing.clone())
        );
        assert_eq!(IncidentStats::region_summary(&dataset, "부산"), Err(missing));
    }

    const REGIONS: [&str; 3] = ["평택", "인천", "태안"];
    const CAUSES: [&str; 10] = [
        "관리소홀",
        "기상악화",
        "배터리 방전",
        "안전부주의",
        "운항부주의",
        "적재불량",
        "정비불량",
        "화기취급부주의",
        "기타 ",
        "충돌",
    ];

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        prop::collection::vec((0..3usize, 1..=12u32, 0..6i64, 0..50i64, 0..10usize), 1..60).prop_map(
            |rows| {
                Dataset::from_records(
                    rows.into_iter()
                        .map(|(r, m, v, p, c)| record(REGIONS[r], m, v, p, CAUSES[c]))
                        .collect(),
                )
            },
        )
    }

    proptest! {
        #[test]
        fn totals_match_filtered_rows(dataset in arb_dataset()) {
            for region in dataset.regions() {
                let expected: i64 = dataset
                    .records()
                    .iter()
                    .filter(|r| &r.region == region)
                    .map(|r| r.vessel_count)
                    .sum();
                prop_assert_eq!(IncidentStats::total_incident_count(&dataset, region).unwrap(), expected);
            }
        }

        #[test]
        fn breakdown_always_lists_nine_causes(dataset in arb_dataset()) {
            for region in dataset.regions() {
                let causes = IncidentStats::cause_breakdown(&dataset, region).unwrap();
                let rows = dataset.records_for(region).count() as u64;
                prop_assert_eq!(causes.len(), 9);
                prop_assert!(causes.iter().zip(Cause::ALL).all(|(c, expected)| c.cause == expected));
                prop_assert!(causes.iter().map(|c| c.count).sum::<u64>() <= rows);
            }
        }

        #[test]
        fn trend_is_ascending_and_sums_to_total(dataset in arb_dataset()) {
            for region in dataset.regions() {
                let trend = IncidentStats::monthly_incident_trend(&dataset, region).unwrap();
                prop_assert!(trend.windows(2).all(|w| w[0].month < w[1].month));
                let total: f64 = trend.iter().map(|p| p.persons_affected).sum();
                prop_assert_eq!(total, IncidentStats::total_persons_affected(&dataset, region).unwrap());
            }
        }

        #[test]
        fn aggregation_is_idempotent(dataset in arb_dataset()) {
            for region in dataset.regions() {
                let first = IncidentStats::region_summary(&dataset, region).unwrap();
                let second = IncidentStats::region_summary(&dataset, region).unwrap();
                prop_assert_eq!(first, second);
            }
            prop_assert_eq!(
                IncidentStats::incidents_by_location(&dataset, None).unwrap(),
                IncidentStats::incidents_by_location(&dataset, None).unwrap()
            );
        }
    }
}
