//! Loading records from a YAML file
//!
//! The file is a list of records in the order they were taken, a record cannot have an earlier
//! timestamp than the record before it:
//!
//! ```yaml
//! - timestamp: { year: 2024, month: 5, day: 14, hour: 7, minute: 30, second: 0 }
//!   measurement:
//!     concentration:
//!       value: 0.00095
//!       unit: KilogramPerLiter
//!       sample_type: CapillaryWholeBlood
//!       sample_location: Finger
//!   context:
//!     meal: Preprandial
//!   deleted: false
//! ```

use anyhow::Context;
use racp::glucose::{GlucoseContext, GlucoseMeasurement};
use racp::{ArrayRecordStore, CalendarTime, RecordStatus, RecordStore};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct RecordEntry {
    timestamp: CalendarTime,
    #[serde(default)]
    measurement: GlucoseMeasurement,
    #[serde(default)]
    context: Option<GlucoseContext>,
    #[serde(default)]
    deleted: bool,
}

pub fn load(path: &Path) -> anyhow::Result<ArrayRecordStore> {
    let file = std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;

    let entries: Vec<RecordEntry> =
        serde_yaml::from_reader(file).with_context(|| format!("invalid record file {}", path.display()))?;

    from_entries(entries)
}

fn from_entries(entries: Vec<RecordEntry>) -> anyhow::Result<ArrayRecordStore> {
    let mut store = ArrayRecordStore::new();

    for (position, entry) in entries.into_iter().enumerate() {
        let t = entry.timestamp;

        if CalendarTime::new(t.year, t.month, t.day, t.hour, t.minute, t.second).is_none() {
            anyhow::bail!("invalid timestamp {t}");
        }

        store
            .push(entry.timestamp, entry.measurement, entry.context)
            .with_context(|| format!("cannot add record {position}"))?;

        if entry.deleted {
            store.set_status(store.len() - 1, RecordStatus::Deleted);
        }
    }

    log::info!("loaded {} records from file", store.len());

    Ok(store)
}
