//! An async RACP service
//!
//! [`RacpService`] runs a [`RacpEngine`] as a task. Writes to the RACP characteristic and lost
//! connections are delivered to the task as [`ServiceEvent`]s, and records and responses come out
//! of it as [`Outgoing`] messages through a bounded channel. A full channel is the transport being
//! busy, the service continues the command in progress once the channel has room again.

use crate::engine::RacpEngine;
use crate::record::{Record, RecordStore};
use crate::{ConnectionHandle, RacpTransport, SendError};
use alloc::vec::Vec;
use racp_util::TransferFormatInto;
use tokio::sync::mpsc;

/// A message to be sent to a client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outgoing {
    /// A glucose measurement notification with its optional measurement context notification
    Record {
        connection: ConnectionHandle,
        measurement: Vec<u8>,
        context: Option<Vec<u8>>,
    },
    /// A RACP indication
    Response { connection: ConnectionHandle, pdu: Vec<u8> },
}

impl Outgoing {
    pub fn get_connection(&self) -> ConnectionHandle {
        match self {
            Outgoing::Record { connection, .. } | Outgoing::Response { connection, .. } => *connection,
        }
    }
}

/// A [`RacpTransport`] over a bounded `tokio` channel
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    sender: mpsc::Sender<Outgoing>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::Sender<Outgoing>) -> Self {
        ChannelTransport { sender }
    }

    /// Wait until the channel has room for another message
    ///
    /// The return is `false` if the receiver was dropped.
    pub async fn ready(&self) -> bool {
        self.sender.reserve().await.is_ok()
    }

    fn send(&self, outgoing: Outgoing) -> Result<(), SendError> {
        self.sender.try_send(outgoing).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Busy,
            mpsc::error::TrySendError::Closed(_) => SendError::Failed,
        })
    }
}

impl RacpTransport for ChannelTransport {
    fn send_record(&mut self, connection: ConnectionHandle, record: &Record) -> Result<(), SendError> {
        let measurement = TransferFormatInto::into(&record.measurement_frame());

        let context = record.context_frame().map(|frame| TransferFormatInto::into(&frame));

        self.send(Outgoing::Record {
            connection,
            measurement,
            context,
        })
    }

    fn send_response(&mut self, connection: ConnectionHandle, pdu: &[u8]) -> Result<(), SendError> {
        self.send(Outgoing::Response {
            connection,
            pdu: pdu.to_vec(),
        })
    }
}

/// An event for the RACP service task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A client wrote `data` to the RACP characteristic
    Write { connection: ConnectionHandle, data: Vec<u8> },
    /// The connection was lost
    Disconnected(ConnectionHandle),
}

/// A task running a [`RacpEngine`]
pub struct RacpService<S> {
    engine: RacpEngine<S>,
    transport: ChannelTransport,
}

impl<S: RecordStore> RacpService<S> {
    /// Create a new `RacpService`
    ///
    /// The returned receiver is for the outgoing messages, it holds at most `capacity` messages.
    ///
    /// # Panic
    /// `capacity` must not be zero.
    pub fn new(engine: RacpEngine<S>, capacity: usize) -> (Self, mpsc::Receiver<Outgoing>) {
        let (sender, receiver) = mpsc::channel(capacity);

        let service = RacpService {
            engine,
            transport: ChannelTransport::new(sender),
        };

        (service, receiver)
    }

    /// Run the service until the sender of `events` is dropped
    ///
    /// Events are given priority over continuing a command in progress so that an abort is
    /// processed as soon as it is received. The engine is returned once the service stops, a
    /// command can still be in progress at that point.
    pub async fn run(mut self, mut events: mpsc::Receiver<ServiceEvent>) -> RacpEngine<S> {
        loop {
            tokio::select! {
                biased;

                event = events.recv() => match event {
                    Some(ServiceEvent::Write { connection, data }) => {
                        let outcome = self.engine.process(connection, &data, &mut self.transport);

                        log::trace!("(RACP) write from connection {}: {:?}", connection, outcome);
                    }
                    Some(ServiceEvent::Disconnected(connection)) => self.engine.disconnected(connection),
                    None => break,
                },

                _ = self.transport.ready(), if !self.engine.is_idle() => {
                    let outcome = self.engine.resume(&mut self.transport);

                    log::trace!("(RACP) resumed: {:?}", outcome);
                }
            }
        }

        log::debug!("(RACP) service stopped in state {:?}", self.engine.state());

        self.engine
    }
}
