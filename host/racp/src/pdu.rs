//! Record Access Control Point PDUs
//!
//! A write to the RACP characteristic has the layout `[opcode, operator, operand...]`. This module
//! contains the enumerations for the opcode, operator, filter type, and response code fields along
//! with the decoding of a written value into a [`Command`].

use crate::operand::{self, Operand};
use crate::RacpConfig;

/// The opcode of a RACP write
///
/// These are the requests a client can make. The two response opcodes (`0x05` and `0x06`) are only
/// ever sent by the server, a client writing them gets [`ResponseCode::OpCodeNotSupported`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    ReportRecords,
    DeleteRecords,
    Abort,
    ReportNumberOfRecords,
}

impl Opcode {
    /// Opcode of the *number of stored records* response
    pub const NUMBER_OF_RECORDS_RESPONSE: u8 = 0x05;

    /// Opcode of the *response code* response
    pub const RESPONSE_CODE: u8 = 0x06;

    /// Opcodes that select records
    pub(crate) const SELECTING: [Opcode; 3] = [
        Opcode::ReportRecords,
        Opcode::DeleteRecords,
        Opcode::ReportNumberOfRecords,
    ];
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(val: u8) -> Result<Self, ()> {
        match val {
            0x01 => Ok(Opcode::ReportRecords),
            0x02 => Ok(Opcode::DeleteRecords),
            0x03 => Ok(Opcode::Abort),
            0x04 => Ok(Opcode::ReportNumberOfRecords),
            _ => Err(()),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        match opcode {
            Opcode::ReportRecords => 0x01,
            Opcode::DeleteRecords => 0x02,
            Opcode::Abort => 0x03,
            Opcode::ReportNumberOfRecords => 0x04,
        }
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Opcode::ReportRecords => f.write_str("Report Stored Records"),
            Opcode::DeleteRecords => f.write_str("Delete Stored Records"),
            Opcode::Abort => f.write_str("Abort Operation"),
            Opcode::ReportNumberOfRecords => f.write_str("Report Number of Stored Records"),
        }
    }
}

/// The operator of a RACP write
///
/// The operator is the strategy used for selecting records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Null,
    AllRecords,
    LessOrEqual,
    GreaterOrEqual,
    WithinRangeInclusive,
    FirstRecord,
    LastRecord,
}

impl Operator {
    /// Check if the operator requires an operand
    pub fn requires_operand(&self) -> bool {
        match self {
            Operator::LessOrEqual | Operator::GreaterOrEqual | Operator::WithinRangeInclusive => true,
            Operator::Null | Operator::AllRecords | Operator::FirstRecord | Operator::LastRecord => false,
        }
    }
}

impl TryFrom<u8> for Operator {
    type Error = ();

    fn try_from(val: u8) -> Result<Self, ()> {
        match val {
            0x00 => Ok(Operator::Null),
            0x01 => Ok(Operator::AllRecords),
            0x02 => Ok(Operator::LessOrEqual),
            0x03 => Ok(Operator::GreaterOrEqual),
            0x04 => Ok(Operator::WithinRangeInclusive),
            0x05 => Ok(Operator::FirstRecord),
            0x06 => Ok(Operator::LastRecord),
            _ => Err(()),
        }
    }
}

impl From<Operator> for u8 {
    fn from(operator: Operator) -> u8 {
        match operator {
            Operator::Null => 0x00,
            Operator::AllRecords => 0x01,
            Operator::LessOrEqual => 0x02,
            Operator::GreaterOrEqual => 0x03,
            Operator::WithinRangeInclusive => 0x04,
            Operator::FirstRecord => 0x05,
            Operator::LastRecord => 0x06,
        }
    }
}

impl core::fmt::Display for Operator {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Operator::Null => f.write_str("Null"),
            Operator::AllRecords => f.write_str("All records"),
            Operator::LessOrEqual => f.write_str("Less than or equal to"),
            Operator::GreaterOrEqual => f.write_str("Greater than or equal to"),
            Operator::WithinRangeInclusive => f.write_str("Within range of (inclusive)"),
            Operator::FirstRecord => f.write_str("First record"),
            Operator::LastRecord => f.write_str("Last record"),
        }
    }
}

/// The filter type of an operand
///
/// This is the first byte of the operand for the comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Filter by the record sequence number
    SequenceNumber,
    /// Filter by the (calendar) base time of the record
    UserFacingTime,
}

impl FilterType {
    pub(crate) fn bit(&self) -> u8 {
        match self {
            FilterType::SequenceNumber => 1 << 0,
            FilterType::UserFacingTime => 1 << 1,
        }
    }
}

impl TryFrom<u8> for FilterType {
    type Error = ();

    fn try_from(val: u8) -> Result<Self, ()> {
        match val {
            0x01 => Ok(FilterType::SequenceNumber),
            0x02 => Ok(FilterType::UserFacingTime),
            _ => Err(()),
        }
    }
}

impl From<FilterType> for u8 {
    fn from(filter_type: FilterType) -> u8 {
        match filter_type {
            FilterType::SequenceNumber => 0x01,
            FilterType::UserFacingTime => 0x02,
        }
    }
}

/// The response code of a *response code* response
///
/// Except for `Success`, these are also the reasons a command fails. They are used as the error
/// type by the command decoding and record selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Success,
    OpCodeNotSupported,
    InvalidOperator,
    OperatorNotSupported,
    InvalidOperand,
    NoRecordsFound,
    AbortUnsuccessful,
    ProcedureNotCompleted,
    OperandNotSupported,
}

impl TryFrom<u8> for ResponseCode {
    type Error = ();

    fn try_from(val: u8) -> Result<Self, ()> {
        match val {
            0x01 => Ok(ResponseCode::Success),
            0x02 => Ok(ResponseCode::OpCodeNotSupported),
            0x03 => Ok(ResponseCode::InvalidOperator),
            0x04 => Ok(ResponseCode::OperatorNotSupported),
            0x05 => Ok(ResponseCode::InvalidOperand),
            0x06 => Ok(ResponseCode::NoRecordsFound),
            0x07 => Ok(ResponseCode::AbortUnsuccessful),
            0x08 => Ok(ResponseCode::ProcedureNotCompleted),
            0x09 => Ok(ResponseCode::OperandNotSupported),
            _ => Err(()),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> u8 {
        match code {
            ResponseCode::Success => 0x01,
            ResponseCode::OpCodeNotSupported => 0x02,
            ResponseCode::InvalidOperator => 0x03,
            ResponseCode::OperatorNotSupported => 0x04,
            ResponseCode::InvalidOperand => 0x05,
            ResponseCode::NoRecordsFound => 0x06,
            ResponseCode::AbortUnsuccessful => 0x07,
            ResponseCode::ProcedureNotCompleted => 0x08,
            ResponseCode::OperandNotSupported => 0x09,
        }
    }
}

impl core::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            ResponseCode::Success => f.write_str("Success"),
            ResponseCode::OpCodeNotSupported => f.write_str("Op code not supported"),
            ResponseCode::InvalidOperator => f.write_str("Invalid operator"),
            ResponseCode::OperatorNotSupported => f.write_str("Operator not supported"),
            ResponseCode::InvalidOperand => f.write_str("Invalid operand"),
            ResponseCode::NoRecordsFound => f.write_str("No records found"),
            ResponseCode::AbortUnsuccessful => f.write_str("Abort unsuccessful"),
            ResponseCode::ProcedureNotCompleted => f.write_str("Procedure not completed"),
            ResponseCode::OperandNotSupported => f.write_str("Operand not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ResponseCode {}

/// A decoded RACP write
///
/// A `Command` is always grammatically valid: `Null` is only used with `Abort`, and `operand` is
/// present exactly when the operator requires one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub opcode: Opcode,
    pub operator: Operator,
    pub operand: Option<Operand>,
}

/// Error from decoding a [`Command`]
///
/// This contains the raw opcode of the write so that the response can echo it back, even when
/// the opcode itself is not supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandError {
    pub requested_opcode: u8,
    pub code: ResponseCode,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "request with opcode {:#04x} failed: {}", self.requested_opcode, self.code)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

impl Command {
    /// Decode a RACP write
    ///
    /// The fields are checked in the order they appear in the write, the first failure determines
    /// the response code:
    /// 1) an unknown opcode is [`OpCodeNotSupported`]
    /// 2) a missing operator is [`InvalidOperator`], an unknown operator is
    ///    [`OperatorNotSupported`]
    /// 3) `Null` with anything but `Abort`, or `Abort` with anything but `Null`, is
    ///    [`InvalidOperator`]
    /// 4) the operand is decoded by [`operand::parse`]
    ///
    /// [`OpCodeNotSupported`]: ResponseCode::OpCodeNotSupported
    /// [`InvalidOperator`]: ResponseCode::InvalidOperator
    /// [`OperatorNotSupported`]: ResponseCode::OperatorNotSupported
    pub fn decode(raw: &[u8], config: &RacpConfig) -> Result<Self, CommandError> {
        let requested_opcode = raw.first().copied().unwrap_or_default();

        let fail = |code| CommandError { requested_opcode, code };

        let opcode = Opcode::try_from(requested_opcode).map_err(|_| fail(ResponseCode::OpCodeNotSupported))?;

        let operator = raw
            .get(1)
            .ok_or(fail(ResponseCode::InvalidOperator))
            .and_then(|val| Operator::try_from(*val).map_err(|_| fail(ResponseCode::OperatorNotSupported)))?;

        match (opcode, operator) {
            (Opcode::Abort, Operator::Null) => (),
            (Opcode::Abort, _) | (_, Operator::Null) => return Err(fail(ResponseCode::InvalidOperator)),
            _ => (),
        }

        let operand = operand::parse(opcode, operator, &raw[2..], config).map_err(fail)?;

        Ok(Command {
            opcode,
            operator,
            operand,
        })
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} {{ operator: {}", self.opcode, self.operator)?;

        if let Some(operand) = &self.operand {
            write!(f, ", operand: {}", operand)?;
        }

        f.write_str(" }")
    }
}
