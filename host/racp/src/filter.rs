//! Record selection
//!
//! Selection produces the indexes of the active records matching an operator and operand. The
//! indexes are always in ascending order, which is also the order the opcode's action is applied.

use crate::operand::{FilterValue, Operand};
use crate::pdu::{Operator, ResponseCode};
use crate::record::{Record, RecordStore};
use alloc::vec::Vec;
use core::cmp::Ordering;
use racp_util::time::compare;

/// Inclusive bounds of a comparison operator
///
/// A missing bound is unbounded on that side.
struct Bounds<T> {
    low: Option<T>,
    high: Option<T>,
}

impl<T> Bounds<T> {
    fn contains(&self, value: &T, cmp: fn(&T, &T) -> Ordering) -> bool {
        self.low.as_ref().map_or(true, |low| cmp(value, low) != Ordering::Less)
            && self.high.as_ref().map_or(true, |high| cmp(value, high) != Ordering::Greater)
    }

    fn from_filter(operator: Operator, value: FilterValue<T>) -> Result<Self, ResponseCode> {
        match (operator, value) {
            (Operator::LessOrEqual, FilterValue::Single(high)) => Ok(Bounds {
                low: None,
                high: Some(high),
            }),
            (Operator::GreaterOrEqual, FilterValue::Single(low)) => Ok(Bounds {
                low: Some(low),
                high: None,
            }),
            (Operator::WithinRangeInclusive, FilterValue::Range(low, high)) => Ok(Bounds {
                low: Some(low),
                high: Some(high),
            }),
            _ => Err(ResponseCode::InvalidOperand),
        }
    }

    /// Clamp the high bound of a range to `newest` and check that the range is not inverted
    ///
    /// The high bound is only clamped when it is not before `newest`, so a range that ends after
    /// the last record is cut down to end at the last record.
    fn clamp_range(mut self, newest: Option<T>, cmp: fn(&T, &T) -> Ordering) -> Result<Self, ResponseCode> {
        if let (Some(high), Some(newest)) = (self.high.as_mut(), newest) {
            if cmp(&newest, high) != Ordering::Greater {
                *high = newest;
            }
        }

        match (&self.low, &self.high) {
            (Some(low), Some(high)) if cmp(low, high) == Ordering::Greater => Err(ResponseCode::InvalidOperand),
            _ => Ok(self),
        }
    }
}

fn newest<S, T>(store: &S, field: fn(&Record) -> T) -> Option<T>
where
    S: RecordStore + ?Sized,
{
    store.len().checked_sub(1).and_then(|last| store.get(last)).map(field)
}

fn matching<S, F>(store: &S, mut predicate: F) -> Vec<usize>
where
    S: RecordStore + ?Sized,
    F: FnMut(&Record) -> bool,
{
    (0..store.len())
        .filter(|index| store.is_active(*index))
        .filter(|index| store.get(*index).map_or(false, &mut predicate))
        .collect()
}

/// Select the records for `operator` and `operand`
///
/// `FirstRecord` and `LastRecord` select the oldest and newest stored record. Nothing is selected
/// when that record is deleted, the operators do not move on to the next active record.
///
/// # Errors
/// * [`InvalidOperator`] for the `Null` operator
/// * [`InvalidOperand`] if the operand is missing or unexpected for `operator`, or the range is
///   inverted after clamping its high bound to the newest record
///
/// [`InvalidOperator`]: ResponseCode::InvalidOperator
/// [`InvalidOperand`]: ResponseCode::InvalidOperand
pub fn select<S>(store: &S, operator: Operator, operand: Option<&Operand>) -> Result<Vec<usize>, ResponseCode>
where
    S: RecordStore + ?Sized,
{
    let first = 0..store.len().min(1);

    let last = store.len().saturating_sub(1)..store.len();

    match (operator, operand) {
        (Operator::Null, _) => Err(ResponseCode::InvalidOperator),
        (Operator::AllRecords | Operator::FirstRecord | Operator::LastRecord, Some(_)) => {
            Err(ResponseCode::InvalidOperand)
        }
        (Operator::AllRecords, None) => Ok(matching(store, |_| true)),
        (Operator::FirstRecord, None) => Ok(first.filter(|index| store.is_active(*index)).collect()),
        (Operator::LastRecord, None) => Ok(last.filter(|index| store.is_active(*index)).collect()),
        (_, None) => Err(ResponseCode::InvalidOperand),
        (_, Some(Operand::SequenceNumber(value))) => {
            let mut bounds = Bounds::from_filter(operator, *value)?;

            if operator == Operator::WithinRangeInclusive {
                bounds = bounds.clamp_range(newest(store, |record| record.sequence_number), u16::cmp)?;
            }

            Ok(matching(store, |record| bounds.contains(&record.sequence_number, u16::cmp)))
        }
        (_, Some(Operand::CalendarTime(value))) => {
            let mut bounds = Bounds::from_filter(operator, *value)?;

            if operator == Operator::WithinRangeInclusive {
                bounds = bounds.clamp_range(newest(store, |record| record.timestamp), compare)?;
            }

            Ok(matching(store, |record| bounds.contains(&record.timestamp, compare)))
        }
    }
}
