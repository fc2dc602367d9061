//! Operand parsing
//!
//! The operand of the comparison operators starts with a [`FilterType`] byte followed by either one
//! value (`LessOrEqual` and `GreaterOrEqual`) or two values (`WithinRangeInclusive`) of the filter
//! type.

use crate::pdu::{FilterType, Opcode, Operator, ResponseCode};
use crate::RacpConfig;
use racp_util::{CalendarTime, TransferFormatTryFrom};

/// The value(s) of an operand
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterValue<T> {
    /// The bound of `LessOrEqual` or `GreaterOrEqual`
    Single(T),
    /// The low and high bound of `WithinRangeInclusive`
    Range(T, T),
}

impl<T: core::fmt::Display> core::fmt::Display for FilterValue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            FilterValue::Single(val) => write!(f, "{}", val),
            FilterValue::Range(low, high) => write!(f, "[{}, {}]", low, high),
        }
    }
}

/// A decoded operand
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    SequenceNumber(FilterValue<u16>),
    CalendarTime(FilterValue<CalendarTime>),
}

impl Operand {
    /// Get the filter type of this operand
    pub fn filter_type(&self) -> FilterType {
        match self {
            Operand::SequenceNumber(_) => FilterType::SequenceNumber,
            Operand::CalendarTime(_) => FilterType::UserFacingTime,
        }
    }
}

impl core::fmt::Display for Operand {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Operand::SequenceNumber(value) => write!(f, "sequence number {}", value),
            Operand::CalendarTime(value) => write!(f, "user facing time {}", value),
        }
    }
}

/// Decode the value(s) after the filter type
fn parse_values<T: TransferFormatTryFrom>(
    operator: Operator,
    raw: &[u8],
    size: usize,
) -> Result<FilterValue<T>, ResponseCode> {
    let decode = |bytes: &[u8]| {
        <T as TransferFormatTryFrom>::try_from(bytes).map_err(|_| ResponseCode::InvalidOperand)
    };

    match operator {
        Operator::WithinRangeInclusive if raw.len() == 2 * size => {
            Ok(FilterValue::Range(decode(&raw[..size])?, decode(&raw[size..])?))
        }
        Operator::LessOrEqual | Operator::GreaterOrEqual if raw.len() == size => {
            Ok(FilterValue::Single(decode(raw)?))
        }
        _ => Err(ResponseCode::InvalidOperand),
    }
}

/// Parse the operand of a command
///
/// Input `raw` is everything after the operator byte. The operand is `None` for the operators that
/// do not take one, for these operators `raw` must be empty.
///
/// # Errors
/// * [`InvalidOperand`] is returned if an operand is missing, has the wrong size, has an unknown
///   filter type, or is a sequence number range where the low bound is greater than the high bound.
/// * [`OperandNotSupported`] is returned if the filter type is known but `config` does not allow it
///   for `opcode`.
///
/// [`InvalidOperand`]: ResponseCode::InvalidOperand
/// [`OperandNotSupported`]: ResponseCode::OperandNotSupported
pub fn parse(
    opcode: Opcode,
    operator: Operator,
    raw: &[u8],
    config: &RacpConfig,
) -> Result<Option<Operand>, ResponseCode> {
    if !operator.requires_operand() {
        return if raw.is_empty() {
            Ok(None)
        } else {
            Err(ResponseCode::InvalidOperand)
        };
    }

    let (tag, values) = raw.split_first().ok_or(ResponseCode::InvalidOperand)?;

    let filter_type = FilterType::try_from(*tag).map_err(|_| ResponseCode::InvalidOperand)?;

    if !config.is_filter_supported(opcode, filter_type) {
        return Err(ResponseCode::OperandNotSupported);
    }

    let operand = match filter_type {
        FilterType::SequenceNumber => match parse_values::<u16>(operator, values, 2)? {
            FilterValue::Range(low, high) if low > high => return Err(ResponseCode::InvalidOperand),
            value => Operand::SequenceNumber(value),
        },
        FilterType::UserFacingTime => {
            Operand::CalendarTime(parse_values::<CalendarTime>(operator, values, CalendarTime::SIZE)?)
        }
    };

    Ok(Some(operand))
}
