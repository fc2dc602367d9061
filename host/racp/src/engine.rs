//! The command state machine
//!
//! A [`RacpEngine`] is either idle or busy with a single command. Commands are processed
//! synchronously, the only time the engine stays busy after a call to [`process`] is when the
//! transport returned [`SendError::Busy`]. The work that is left is then continued by calls to
//! [`resume`].
//!
//! ```text
//!             process(command)
//!    Idle ----------------------> Busy(opcode) --+
//!     ^                              |   ^       | resume
//!     |   response sent / abort      |   +-------+
//!     +------------------------------+
//! ```
//!
//! [`process`]: RacpEngine::process
//! [`resume`]: RacpEngine::resume

use crate::filter;
use crate::pdu::{Command, Opcode, ResponseCode};
use crate::record::{RecordStatus, RecordStore};
use crate::response::Response;
use crate::{BusyPolicy, ConnectionHandle, RacpConfig, RacpTransport, SendError};
use alloc::vec::Vec;
use racp_util::TransferFormatInto;

/// The state of a [`RacpEngine`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// No command is in progress
    Idle,
    /// The action of a command is in progress
    Busy(Opcode),
    /// The action of a command is done but the transport has not yet accepted the response
    Responding,
}

/// The result of a call to [`RacpEngine::process`] or [`RacpEngine::resume`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The command is complete and the response was sent
    Completed(Response),
    /// The engine is waiting for the transport, call [`resume`](RacpEngine::resume) to continue
    Pending,
    /// The command was dropped as another command is in progress
    Dropped,
    /// The command was answered without interrupting the command in progress
    ///
    /// This is either `ProcedureNotCompleted` or, for a malformed abort, the reason the abort
    /// could not be decoded.
    Rejected(Response),
    /// The command is complete but the transport failed to send the response
    Undelivered(Response),
}

impl Outcome {
    /// Get the response that was produced (whether or not it was delivered)
    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Completed(response) | Outcome::Rejected(response) | Outcome::Undelivered(response) => {
                Some(response)
            }
            Outcome::Pending | Outcome::Dropped => None,
        }
    }
}

/// An in progress report of stored records
#[derive(Debug)]
struct Report {
    connection: ConnectionHandle,
    selected: Vec<usize>,
    next: usize,
    reported: usize,
}

#[derive(Debug)]
enum Procedure {
    Reporting(Report),
    Responding {
        connection: ConnectionHandle,
        response: Response,
    },
}

impl Procedure {
    fn connection(&self) -> ConnectionHandle {
        match self {
            Procedure::Reporting(report) => report.connection,
            Procedure::Responding { connection, .. } => *connection,
        }
    }
}

/// The Record Access Control Point engine
///
/// The engine owns the record store and the state of the command in progress.
#[derive(Debug)]
pub struct RacpEngine<S> {
    store: S,
    config: RacpConfig,
    procedure: Option<Procedure>,
}

impl<S: RecordStore> RacpEngine<S> {
    /// Create a new `RacpEngine` with the default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, RacpConfig::default())
    }

    pub fn with_config(store: S, config: RacpConfig) -> Self {
        RacpEngine {
            store,
            config,
            procedure: None,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.procedure {
            None => EngineState::Idle,
            Some(Procedure::Reporting(_)) => EngineState::Busy(Opcode::ReportRecords),
            Some(Procedure::Responding { .. }) => EngineState::Responding,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.procedure.is_none()
    }

    pub fn get_config(&self) -> &RacpConfig {
        &self.config
    }

    pub fn get_store(&self) -> &S {
        &self.store
    }

    /// Get a mutable reference to the record store
    ///
    /// This is for adding new records. A record added while a report is in progress is not part
    /// of that report.
    pub fn get_mut_store(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Process a value written to the RACP characteristic
    ///
    /// If the engine is idle, the command is decoded and executed. If the engine is busy the
    /// command is dropped unless it is an abort, which ends the command in progress without it
    /// getting a response of its own. The response to the abort is always `Success`. An abort
    /// that cannot be decoded is answered with the decode error and the command in progress
    /// continues.
    pub fn process<T>(&mut self, connection: ConnectionHandle, raw: &[u8], transport: &mut T) -> Outcome
    where
        T: RacpTransport + ?Sized,
    {
        if self.procedure.is_some() {
            return self.process_while_busy(connection, raw, transport);
        }

        match Command::decode(raw, &self.config) {
            Ok(command) => {
                log::info!("(RACP) processing {} from connection {}", command, connection);

                self.execute(connection, command, transport)
            }
            Err(error) => {
                log::info!("(RACP) invalid request from connection {}: {}", connection, error);

                let response = Response::Generic {
                    requested_opcode: error.requested_opcode,
                    code: error.code,
                };

                self.respond(connection, response, transport)
            }
        }
    }

    /// Continue the command in progress
    ///
    /// This should be called when the transport is able to send again after it returned
    /// [`SendError::Busy`]. `None` is returned if the engine is idle.
    pub fn resume<T>(&mut self, transport: &mut T) -> Option<Outcome>
    where
        T: RacpTransport + ?Sized,
    {
        let outcome = match self.procedure.take()? {
            Procedure::Reporting(report) => self.report(report, transport),
            Procedure::Responding { connection, response } => self.respond(connection, response, transport),
        };

        Some(outcome)
    }

    /// Inform the engine that a connection was lost
    ///
    /// A command in progress for `connection` is dropped.
    pub fn disconnected(&mut self, connection: ConnectionHandle) {
        if self.procedure.as_ref().map(Procedure::connection) == Some(connection) {
            log::debug!("(RACP) connection {} lost, dropping {:?}", connection, self.state());

            self.procedure = None;
        }
    }

    fn process_while_busy<T>(&mut self, connection: ConnectionHandle, raw: &[u8], transport: &mut T) -> Outcome
    where
        T: RacpTransport + ?Sized,
    {
        if raw.first().copied() == Some(u8::from(Opcode::Abort)) {
            return match Command::decode(raw, &self.config) {
                Ok(_) => {
                    log::info!("(RACP) connection {} aborted {:?}", connection, self.state());

                    self.procedure = None;

                    self.respond(connection, Response::generic(Opcode::Abort, ResponseCode::Success), transport)
                }
                Err(error) => {
                    log::info!("(RACP) invalid abort from connection {}: {}", connection, error);

                    let response = Response::Generic {
                        requested_opcode: error.requested_opcode,
                        code: error.code,
                    };

                    self.reject(connection, response, transport)
                }
            };
        }

        match self.config.get_busy_policy() {
            BusyPolicy::Drop => {
                log::warn!("(RACP) dropped request from connection {}, a command is in progress", connection);

                Outcome::Dropped
            }
            BusyPolicy::ProcedureNotCompleted => {
                let response = Response::Generic {
                    requested_opcode: raw.first().copied().unwrap_or_default(),
                    code: ResponseCode::ProcedureNotCompleted,
                };

                self.reject(connection, response, transport)
            }
        }
    }

    /// Answer a command received while busy without changing the command in progress
    fn reject<T>(&self, connection: ConnectionHandle, response: Response, transport: &mut T) -> Outcome
    where
        T: RacpTransport + ?Sized,
    {
        match transport.send_response(connection, &TransferFormatInto::into(&response)) {
            Ok(()) => Outcome::Rejected(response),
            Err(e) => {
                log::warn!("(RACP) cannot reject request from connection {}: {}", connection, e);

                Outcome::Dropped
            }
        }
    }

    fn execute<T>(&mut self, connection: ConnectionHandle, command: Command, transport: &mut T) -> Outcome
    where
        T: RacpTransport + ?Sized,
    {
        let (operator, operand) = (command.operator, command.operand.as_ref());

        match command.opcode {
            Opcode::Abort => {
                let code = self.config.get_idle_abort_policy().response_code();

                self.respond(connection, Response::generic(Opcode::Abort, code), transport)
            }
            Opcode::ReportNumberOfRecords => {
                let outcome = filter::select(&self.store, operator, operand).map(|s| s.len());

                self.respond(connection, Response::for_outcome(command.opcode, outcome), transport)
            }
            Opcode::DeleteRecords => {
                let outcome = filter::select(&self.store, operator, operand).map(|selected| {
                    for index in selected.iter().copied() {
                        self.store.set_status(index, RecordStatus::Deleted);

                        log::debug!("(RACP) deleted record at index {}", index);
                    }

                    selected.len()
                });

                self.respond(connection, Response::for_outcome(command.opcode, outcome), transport)
            }
            Opcode::ReportRecords => match filter::select(&self.store, operator, operand) {
                Ok(selected) => {
                    let report = Report {
                        connection,
                        selected,
                        next: 0,
                        reported: 0,
                    };

                    self.report(report, transport)
                }
                Err(code) => self.respond(connection, Response::generic(command.opcode, code), transport),
            },
        }
    }

    fn report<T>(&mut self, mut report: Report, transport: &mut T) -> Outcome
    where
        T: RacpTransport + ?Sized,
    {
        while let Some(index) = report.selected.get(report.next).copied() {
            let record = match self.store.get(index) {
                Some(record) if self.store.is_active(index) => record,
                _ => {
                    report.next += 1;
                    continue;
                }
            };

            match transport.send_record(report.connection, record) {
                Ok(()) => {
                    log::debug!("(RACP) reported record {}", record.sequence_number);

                    report.next += 1;
                    report.reported += 1;
                }
                Err(SendError::Busy) => {
                    log::debug!(
                        "(RACP) transport busy, {} records left to report",
                        report.selected.len() - report.next
                    );

                    self.procedure = Some(Procedure::Reporting(report));

                    return Outcome::Pending;
                }
                Err(SendError::Failed) => {
                    log::warn!("(RACP) failed to report record {}", record.sequence_number);

                    let response = Response::generic(Opcode::ReportRecords, ResponseCode::ProcedureNotCompleted);

                    return self.respond(report.connection, response, transport);
                }
            }
        }

        let response = Response::for_outcome(Opcode::ReportRecords, Ok(report.reported));

        self.respond(report.connection, response, transport)
    }

    fn respond<T>(&mut self, connection: ConnectionHandle, response: Response, transport: &mut T) -> Outcome
    where
        T: RacpTransport + ?Sized,
    {
        match transport.send_response(connection, &TransferFormatInto::into(&response)) {
            Ok(()) => {
                log::info!("(RACP) sent response to connection {}: {}", connection, response);

                self.procedure = None;

                Outcome::Completed(response)
            }
            Err(SendError::Busy) => {
                log::debug!("(RACP) transport busy, holding response {}", response);

                self.procedure = Some(Procedure::Responding { connection, response });

                Outcome::Pending
            }
            Err(SendError::Failed) => {
                log::warn!("(RACP) failed to send response to connection {}: {}", connection, response);

                self.procedure = None;

                Outcome::Undelivered(response)
            }
        }
    }
}
