//! Incident Record Module
//! Typed rows of the distress-incident dataset and the fixed cause set.

use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Root-cause category of an incident.
///
/// The set is closed: every pie chart and breakdown lists all nine labels,
/// in this order, even when a region has no rows for some of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cause {
    /// 관리소홀
    Negligence,
    /// 기상악화
    Weather,
    /// 배터리방전
    BatteryDischarge,
    /// 안전부주의
    SafetyCarelessness,
    /// 운항부주의
    NavigationCarelessness,
    /// 적재불량
    ImproperLoading,
    /// 정비불량
    PoorMaintenance,
    /// 화기취급부주의
    FireHandling,
    /// 기타
    Other,
}

impl Cause {
    pub const ALL: [Cause; 9] = [
        Cause::Negligence,
        Cause::Weather,
        Cause::BatteryDischarge,
        Cause::SafetyCarelessness,
        Cause::NavigationCarelessness,
        Cause::ImproperLoading,
        Cause::PoorMaintenance,
        Cause::FireHandling,
        Cause::Other,
    ];

    /// Display label used on charts.
    pub fn label(self) -> &'static str {
        match self {
            Cause::Negligence => "관리소홀",
            Cause::Weather => "기상악화",
            Cause::BatteryDischarge => "배터리방전",
            Cause::SafetyCarelessness => "안전부주의",
            Cause::NavigationCarelessness => "운항부주의",
            Cause::ImproperLoading => "적재불량",
            Cause::PoorMaintenance => "정비불량",
            Cause::FireHandling => "화기취급부주의",
            Cause::Other => "기타",
        }
    }

    /// Match a raw cause cell against the fixed set.
    ///
    /// Whitespace is ignored: the source file spells `배터리 방전` and `기타 `.
    pub fn parse(raw: &str) -> Option<Cause> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL.into_iter().find(|cause| cause.label() == compact)
    }
}

impl Serialize for Cause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded marine distress event.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub region: String,
    pub sea_area: String,
    /// Cause cell as written in the source file (trimmed).
    pub cause_raw: String,
    pub cause: Option<Cause>,
    pub vessel_type: String,
    pub vessel_count: i64,
    pub persons_affected: i64,
    pub occurred_at: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub incident_type: Option<String>,
}

/// Immutable, fully parsed dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<IncidentRecord>,
    regions: Vec<String>,
}

impl Dataset {
    /// Build a dataset from parsed records.
    ///
    /// Regions are collected in first-appearance order.
    pub fn from_records(records: Vec<IncidentRecord>) -> Self {
        let mut seen = HashSet::new();
        let regions = records
            .iter()
            .filter(|r| seen.insert(r.region.as_str()))
            .map(|r| r.region.clone())
            .collect();

        Self { records, regions }
    }

    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Distinct region authorities, used to populate the selector.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    /// Records belonging to one region, in dataset order.
    pub fn records_for<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a IncidentRecord> {
        self.records.iter().filter(move |r| r.region == region)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct calendar years covered by the occurrence column, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.occurred_at.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    /// Build a record with sensible defaults for aggregation tests.
    pub fn record(region: &str, month: u32, vessels: i64, persons: i64, cause: &str) -> IncidentRecord {
        IncidentRecord {
            region: region.to_string(),
            sea_area: "연안".to_string(),
            cause_raw: cause.to_string(),
            cause: Cause::parse(cause),
            vessel_type: "어선".to_string(),
            vessel_count: vessels,
            persons_affected: persons,
            occurred_at: NaiveDate::from_ymd_opt(2020, month, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
            latitude: 36.0,
            longitude: 127.0,
            incident_type: Some("좌초".to_string()),
        }
    }
}
