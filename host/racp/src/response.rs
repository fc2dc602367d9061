//! RACP responses
//!
//! Every accepted command produces exactly one response, indicated to the client through the RACP
//! characteristic. There are two shapes of response:
//!
//! * number of records: `[0x05, count (u16, little endian)]`
//! * response code: `[0x06, 0x00 (Null operator), request opcode, response code]`

use crate::pdu::{Opcode, Operator, ResponseCode};
use racp_util::{TransferFormatError, TransferFormatInto, TransferFormatTryFrom};

/// A response to a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Response to [`ReportNumberOfRecords`](Opcode::ReportNumberOfRecords)
    Count { count: u16 },
    /// Response to every other command
    ///
    /// The request opcode is kept raw as a response can be for an opcode that is not supported.
    Generic { requested_opcode: u8, code: ResponseCode },
}

impl Response {
    /// Create a response code response
    pub fn generic(opcode: Opcode, code: ResponseCode) -> Self {
        Response::Generic {
            requested_opcode: opcode.into(),
            code,
        }
    }

    /// Build the response for the outcome of a command
    ///
    /// The outcome is either the number of records the command acted upon, or the reason the
    /// command failed. A failure always takes precedence over the result of the opcode. Otherwise
    /// `ReportNumberOfRecords` gets the count (zero included) and the opcodes that act on records
    /// get `Success` if at least one record was acted upon or `NoRecordsFound` if none were.
    pub fn for_outcome(opcode: Opcode, outcome: Result<usize, ResponseCode>) -> Self {
        match (opcode, outcome) {
            (_, Err(code)) => Response::generic(opcode, code),
            (Opcode::ReportNumberOfRecords, Ok(count)) => Response::Count {
                count: count.try_into().unwrap_or(u16::MAX),
            },
            (Opcode::Abort, Ok(_)) => Response::generic(opcode, ResponseCode::Success),
            (_, Ok(0)) => Response::generic(opcode, ResponseCode::NoRecordsFound),
            (_, Ok(_)) => Response::generic(opcode, ResponseCode::Success),
        }
    }

    /// Get the raw opcode of the request this is the response for
    pub fn requested_opcode(&self) -> u8 {
        match self {
            Response::Count { .. } => Opcode::ReportNumberOfRecords.into(),
            Response::Generic { requested_opcode, .. } => *requested_opcode,
        }
    }

    /// Get the response code
    ///
    /// A count response is always a success.
    pub fn code(&self) -> ResponseCode {
        match self {
            Response::Count { .. } => ResponseCode::Success,
            Response::Generic { code, .. } => *code,
        }
    }
}

impl core::fmt::Display for Response {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Response::Count { count } => write!(f, "number of stored records: {}", count),
            Response::Generic { requested_opcode, code } => match Opcode::try_from(*requested_opcode) {
                Ok(opcode) => write!(f, "{}: {}", opcode, code),
                Err(_) => write!(f, "opcode {:#04x}: {}", requested_opcode, code),
            },
        }
    }
}

impl TransferFormatInto for Response {
    fn len_of_into(&self) -> usize {
        match self {
            Response::Count { .. } => 3,
            Response::Generic { .. } => 4,
        }
    }

    fn build_into_ret(&self, into_ret: &mut [u8]) {
        match self {
            Response::Count { count } => {
                into_ret[0] = Opcode::NUMBER_OF_RECORDS_RESPONSE;

                count.build_into_ret(&mut into_ret[1..]);
            }
            Response::Generic { requested_opcode, code } => {
                into_ret[0] = Opcode::RESPONSE_CODE;
                into_ret[1] = Operator::Null.into();
                into_ret[2] = *requested_opcode;
                into_ret[3] = (*code).into();
            }
        }
    }
}

impl TransferFormatTryFrom for Response {
    fn try_from(raw: &[u8]) -> Result<Self, TransferFormatError> {
        match raw {
            // form with the Null operator used by the Glucose Service
            [Opcode::NUMBER_OF_RECORDS_RESPONSE, 0x00, low, high] => Ok(Response::Count {
                count: u16::from_le_bytes([*low, *high]),
            }),
            [Opcode::NUMBER_OF_RECORDS_RESPONSE, count @ ..] => Ok(Response::Count {
                count: <u16 as TransferFormatTryFrom>::try_from(count)?,
            }),
            [Opcode::RESPONSE_CODE, 0x00, requested_opcode, code] => Ok(Response::Generic {
                requested_opcode: *requested_opcode,
                code: ResponseCode::try_from(*code)
                    .map_err(|_| TransferFormatError::out_of_range(stringify!(Response), "response code", code))?,
            }),
            [Opcode::RESPONSE_CODE, ..] => Err(TransferFormatError::bad_size(stringify!(Response), 4, raw.len())),
            _ => Err(TransferFormatError::from("not a RACP response")),
        }
    }
}
