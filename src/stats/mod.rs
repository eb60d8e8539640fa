//! Stats module - Region-keyed aggregation over the incident table

mod aggregator;

pub use aggregator::{
    AggregateError, CauseCount, IncidentStats, LocationIncidents, MonthlyPoint, RegionSummary,
};
