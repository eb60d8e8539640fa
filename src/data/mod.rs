//! Data module - CSV loading and the typed incident table

mod loader;
mod record;

pub use loader::{columns, parse_datetime, parse_dms, DataLoader, LoaderError};
pub use record::{Cause, Dataset, IncidentRecord};

#[cfg(test)]
pub(crate) use record::fixtures;
