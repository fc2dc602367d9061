//! Record Access Control Point
//!
//! This is the Record Access Control Point (RACP) of the Glucose Service. A client writes commands
//! to the RACP characteristic to have the server report, delete, or count the records it has
//! stored. The server answers each accepted command with a single indication of a [`Response`].
//!
//! # The Engine
//! A [`RacpEngine`] owns the [`RecordStore`] and processes the values written to the RACP
//! characteristic. Records and responses are handed to a [`RacpTransport`] which is responsible
//! for turning them into notifications and indications on a connection.
//!
//! ```
//! use racp::{ArrayRecordStore, ConnectionHandle, RacpEngine, RacpTransport, Record, SendError};
//! use racp::response::Response;
//!
//! # struct Print;
//! # impl RacpTransport for Print {
//! #     fn send_record(&mut self, _: ConnectionHandle, record: &Record) -> Result<(), SendError> {
//! #         println!("record {}", record.sequence_number);
//! #         Ok(())
//! #     }
//! #     fn send_response(&mut self, _: ConnectionHandle, pdu: &[u8]) -> Result<(), SendError> {
//! #         println!("response {:x?}", pdu);
//! #         Ok(())
//! #     }
//! # }
//! let mut engine = RacpEngine::new(ArrayRecordStore::simulated(11).unwrap());
//!
//! let connection = ConnectionHandle::new(0x40);
//!
//! // report the number of stored records
//! let outcome = engine.process(connection, &[0x04, 0x01], &mut Print);
//!
//! assert_eq!(outcome.response(), Some(&Response::Count { count: 11 }));
//! ```
//!
//! # One Command at a Time
//! Only one command can be in progress. When the transport cannot accept a record or response
//! right away it returns [`SendError::Busy`], and the engine holds the remaining work until
//! [`RacpEngine::resume`] is called. While the engine is busy any command other than an *abort* is
//! dropped (see [`BusyPolicy`]).
//!
//! # Features
//! * `std` (default): implementations of `std::error::Error`
//! * `tokio`: the async [`service`] task built on `tokio` channels
//! * `serde`: `Serialize` and `Deserialize` for records and their payloads

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod engine;
pub mod filter;
pub mod glucose;
pub mod operand;
pub mod pdu;
pub mod record;
pub mod response;
#[cfg(feature = "tokio")]
pub mod service;

pub use engine::{EngineState, Outcome, RacpEngine};
pub use pdu::{Command, FilterType, Opcode, Operator, ResponseCode};
pub use racp_util::{CalendarTime, SFloat};
pub use record::{ArrayRecordStore, PushError, Record, RecordStatus, RecordStore};
pub use response::Response;

/// Assigned numbers of the Glucose Service
pub mod assigned {
    /// UUID of the Glucose Service
    pub const GLUCOSE_SERVICE: u16 = 0x1808;

    /// UUID of the Glucose Measurement characteristic
    pub const GLUCOSE_MEASUREMENT: u16 = 0x2A18;

    /// UUID of the Glucose Measurement Context characteristic
    pub const GLUCOSE_MEASUREMENT_CONTEXT: u16 = 0x2A34;

    /// UUID of the Record Access Control Point characteristic
    pub const RECORD_ACCESS_CONTROL_POINT: u16 = 0x2A52;
}

/// Identifier of the connection a command was written on
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionHandle(u16);

impl ConnectionHandle {
    pub const fn new(handle: u16) -> Self {
        ConnectionHandle(handle)
    }

    pub fn get_raw_handle(&self) -> u16 {
        self.0
    }
}

impl core::fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Error returned by a [`RacpTransport`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendError {
    /// The transport cannot take the data right now
    ///
    /// The engine keeps the data and tries again on the next call to [`RacpEngine::resume`].
    Busy,
    /// The data could not be sent
    Failed,
}

impl core::fmt::Display for SendError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            SendError::Busy => f.write_str("transport is busy"),
            SendError::Failed => f.write_str("failed to send"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SendError {}

/// The transport for records and responses
///
/// A `RacpTransport` is the link between the engine and the lower protocol layers. Methods of this
/// trait must not block, if the data cannot be sent immediately then [`SendError::Busy`] is
/// returned.
pub trait RacpTransport {
    /// Notify the client of a record
    ///
    /// This sends the glucose measurement of the record, followed by its context when it has one.
    fn send_record(&mut self, connection: ConnectionHandle, record: &Record) -> Result<(), SendError>;

    /// Indicate a response to the client
    ///
    /// Input `response` is the complete value of the RACP characteristic.
    fn send_response(&mut self, connection: ConnectionHandle, response: &[u8]) -> Result<(), SendError>;
}

impl<T: RacpTransport + ?Sized> RacpTransport for &mut T {
    fn send_record(&mut self, connection: ConnectionHandle, record: &Record) -> Result<(), SendError> {
        (**self).send_record(connection, record)
    }

    fn send_response(&mut self, connection: ConnectionHandle, response: &[u8]) -> Result<(), SendError> {
        (**self).send_response(connection, response)
    }
}

/// What to do with a command received while another is in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BusyPolicy {
    /// Silently drop the command
    #[default]
    Drop,
    /// Respond to the command with [`ProcedureNotCompleted`](ResponseCode::ProcedureNotCompleted)
    ///
    /// The command in progress is not affected.
    ProcedureNotCompleted,
}

/// The response to an abort when no command is in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdleAbortPolicy {
    #[default]
    Success,
    AbortUnsuccessful,
}

impl IdleAbortPolicy {
    fn response_code(&self) -> ResponseCode {
        match self {
            IdleAbortPolicy::Success => ResponseCode::Success,
            IdleAbortPolicy::AbortUnsuccessful => ResponseCode::AbortUnsuccessful,
        }
    }
}

/// Configuration of a [`RacpEngine`]
///
/// ```
/// use racp::{BusyPolicy, FilterType, Opcode, RacpConfig};
///
/// let config = RacpConfig::new()
///     .set_busy_policy(BusyPolicy::ProcedureNotCompleted)
///     .disable_filter(Opcode::DeleteRecords, FilterType::UserFacingTime);
///
/// assert!(!config.is_filter_supported(Opcode::DeleteRecords, FilterType::UserFacingTime));
/// assert!(config.is_filter_supported(Opcode::ReportRecords, FilterType::UserFacingTime));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RacpConfig {
    busy_policy: BusyPolicy,
    idle_abort: IdleAbortPolicy,
    /// bit field of filter types supported by report, delete, and report number of records
    supported_filters: [u8; 3],
}

impl RacpConfig {
    const ALL_FILTERS: u8 = 0b11;

    /// Create the default configuration
    ///
    /// Commands received while busy are dropped, an abort while idle is successful, and both filter
    /// types are supported for every opcode.
    pub fn new() -> Self {
        RacpConfig {
            busy_policy: BusyPolicy::default(),
            idle_abort: IdleAbortPolicy::default(),
            supported_filters: [Self::ALL_FILTERS; 3],
        }
    }

    pub fn set_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = policy;
        self
    }

    pub fn set_idle_abort_policy(mut self, policy: IdleAbortPolicy) -> Self {
        self.idle_abort = policy;
        self
    }

    /// Enable a filter type for an opcode
    pub fn enable_filter(mut self, opcode: Opcode, filter_type: FilterType) -> Self {
        if let Some(filters) = self.filters_mut(opcode) {
            *filters |= filter_type.bit();
        }

        self
    }

    /// Disable a filter type for an opcode
    ///
    /// Commands with `opcode` using this filter type get the response code
    /// [`OperandNotSupported`](ResponseCode::OperandNotSupported).
    pub fn disable_filter(mut self, opcode: Opcode, filter_type: FilterType) -> Self {
        if let Some(filters) = self.filters_mut(opcode) {
            *filters &= !filter_type.bit();
        }

        self
    }

    pub fn get_busy_policy(&self) -> BusyPolicy {
        self.busy_policy
    }

    pub fn get_idle_abort_policy(&self) -> IdleAbortPolicy {
        self.idle_abort
    }

    /// Check if `filter_type` is supported for `opcode`
    ///
    /// This is always false for `Abort` as it never takes an operand.
    pub fn is_filter_supported(&self, opcode: Opcode, filter_type: FilterType) -> bool {
        Opcode::SELECTING
            .iter()
            .position(|selecting| *selecting == opcode)
            .map_or(false, |index| self.supported_filters[index] & filter_type.bit() != 0)
    }

    fn filters_mut(&mut self, opcode: Opcode) -> Option<&mut u8> {
        Opcode::SELECTING
            .iter()
            .position(|selecting| *selecting == opcode)
            .map(|index| &mut self.supported_filters[index])
    }
}

impl Default for RacpConfig {
    fn default() -> Self {
        Self::new()
    }
}
