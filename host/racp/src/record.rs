//! Record storage
//!
//! A record is created once and never destroyed. Deleting a record only changes its
//! [`RecordStatus`], the slot and sequence number of a deleted record are never reused.

use crate::glucose::{
    Concentration, ConcentrationUnit, ContextFrame, GlucoseContext, GlucoseMeasurement, MeasurementFrame, Meal,
    SampleLocation, SampleType,
};
use alloc::vec::Vec;
use racp_util::{CalendarTime, SFloat};

/// A stored measurement record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub sequence_number: u16,
    /// The base time of the measurement
    pub timestamp: CalendarTime,
    pub measurement: GlucoseMeasurement,
    pub context: Option<GlucoseContext>,
}

impl Record {
    /// Get the *Glucose Measurement* notification for this record
    pub fn measurement_frame(&self) -> MeasurementFrame<'_> {
        MeasurementFrame::new(self)
    }

    /// Get the *Glucose Measurement Context* notification for this record
    ///
    /// `None` is returned if the record has no context.
    pub fn context_frame(&self) -> Option<ContextFrame<'_>> {
        self.context
            .as_ref()
            .map(|context| ContextFrame::new(self.sequence_number, context))
    }
}

/// Status of a stored record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted,
}

/// A store of records
///
/// Records are accessed by their index within the store. Indexes are in the order the records were
/// created, so ascending index order is also ascending sequence number order.
///
/// # Panic
/// Methods `status` and `set_status` may panic if `index` is not less than `len()`. The engine
/// never uses an index outside of the store.
pub trait RecordStore {
    /// Get the number of records, including the deleted ones
    fn len(&self) -> usize;

    /// Get the record at `index`
    fn get(&self, index: usize) -> Option<&Record>;

    /// Get the status of the record at `index`
    fn status(&self, index: usize) -> RecordStatus;

    /// Set the status of the record at `index`
    fn set_status(&mut self, index: usize, status: RecordStatus);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the record at `index` is active
    fn is_active(&self, index: usize) -> bool {
        self.status(index) == RecordStatus::Active
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<&Record> {
        (**self).get(index)
    }

    fn status(&self, index: usize) -> RecordStatus {
        (**self).status(index)
    }

    fn set_status(&mut self, index: usize, status: RecordStatus) {
        (**self).set_status(index, status)
    }
}

/// Error for adding a record to an [`ArrayRecordStore`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushError {
    /// Every sequence number is in use
    StoreFull,
    /// The timestamp is before the timestamp of the newest record
    OutOfOrder { newest: CalendarTime, timestamp: CalendarTime },
}

impl core::fmt::Display for PushError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            PushError::StoreFull => f.write_str("every record sequence number is in use"),
            PushError::OutOfOrder { newest, timestamp } => write!(
                f,
                "record time {} is before the newest record time {}",
                timestamp, newest
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PushError {}

/// A record store backed by a contiguous list
///
/// The sequence number of every record is equal to its index, and the timestamps never decrease
/// from one index to the next.
#[derive(Clone, Debug, Default)]
pub struct ArrayRecordStore {
    records: Vec<Record>,
    status: Vec<RecordStatus>,
}

impl ArrayRecordStore {
    /// The timestamp of the first simulated record, each following record is a minute later
    pub const SIMULATED_BASE_TIME: CalendarTime = CalendarTime {
        year: 2019,
        month: 1,
        day: 1,
        hour: 8,
        minute: 0,
        second: 0,
    };

    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store of simulated measurements
    ///
    /// The records are one minute apart starting from a fixed base time and have concentrations
    /// that cycle between 80 and 175 mg/dL. Every fourth record has a context.
    ///
    /// An error is returned if `count` is larger than the number of sequence numbers.
    pub fn simulated(count: usize) -> Result<Self, PushError> {
        if count > u16::MAX as usize + 1 {
            return Err(PushError::StoreFull);
        }

        let mut store = Self::new();

        let mut timestamp = Self::SIMULATED_BASE_TIME;

        for index in 0..count {
            let milligrams_per_deciliter = (80 + (index * 7) % 96) as i16;

            let measurement = GlucoseMeasurement {
                time_offset: None,
                concentration: SFloat::new(milligrams_per_deciliter, -5).map(|value| Concentration {
                    value,
                    unit: ConcentrationUnit::KilogramPerLiter,
                    sample_type: SampleType::CapillaryWholeBlood,
                    sample_location: SampleLocation::Finger,
                }),
                sensor_status: None,
            };

            let context = (index % 4 == 3).then(|| GlucoseContext {
                meal: Some(Meal::Casual),
                ..Default::default()
            });

            store.push(timestamp, measurement, context)?;

            timestamp = timestamp.add_minutes(1).unwrap_or(timestamp);
        }

        Ok(store)
    }

    /// Add a new record to the store
    ///
    /// The record is given the next sequence number, which is returned. The timestamp cannot be
    /// before the timestamp of the newest record.
    pub fn push(
        &mut self,
        timestamp: CalendarTime,
        measurement: GlucoseMeasurement,
        context: Option<GlucoseContext>,
    ) -> Result<u16, PushError> {
        let sequence_number = u16::try_from(self.records.len()).map_err(|_| PushError::StoreFull)?;

        if let Some(newest) = self.records.last().map(|record| record.timestamp) {
            if timestamp < newest {
                return Err(PushError::OutOfOrder { newest, timestamp });
            }
        }

        self.records.push(Record {
            sequence_number,
            timestamp,
            measurement,
            context,
        });

        self.status.push(RecordStatus::Active);

        log::debug!("(RACP) stored record {} at {}", sequence_number, timestamp);

        Ok(sequence_number)
    }

    /// Get an iterator over the records and their status
    pub fn iter(&self) -> impl Iterator<Item = (&Record, RecordStatus)> + '_ {
        self.records.iter().zip(self.status.iter().copied())
    }

    /// Get the number of active records
    pub fn active_count(&self) -> usize {
        self.status.iter().filter(|status| **status == RecordStatus::Active).count()
    }
}

impl RecordStore for ArrayRecordStore {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    fn status(&self, index: usize) -> RecordStatus {
        self.status[index]
    }

    fn set_status(&mut self, index: usize, status: RecordStatus) {
        self.status[index] = status
    }
}
