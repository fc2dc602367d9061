//! Tests for a transport that is busy or failing

use racp::pdu::{Opcode, Operator, ResponseCode};
use racp::{ArrayRecordStore, ConnectionHandle, EngineState, Outcome, RacpEngine, Response, SendError};
use racp_tests::{abort, command, RecordingTransport, CONNECTION};

fn report_all() -> Vec<u8> {
    command(Opcode::ReportRecords, Operator::AllRecords)
}

#[test]
fn busy_on_every_record() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.script([Err(SendError::Busy)]);

    let mut outcome = engine.process(CONNECTION, &report_all(), &mut transport);

    let mut resumed = 0;

    while outcome == Outcome::Pending {
        transport.script([Ok(()), Err(SendError::Busy)]);

        outcome = engine.resume(&mut transport).unwrap();

        resumed += 1;
    }

    assert_eq!(resumed, 6);

    assert_eq!(transport.records(), [0, 1, 2, 3, 4]);

    assert_eq!(
        outcome,
        Outcome::Completed(Response::generic(Opcode::ReportRecords, ResponseCode::Success))
    );
}

#[test]
fn busy_response_is_held() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.script([Err(SendError::Busy)]);

    let raw = command(Opcode::ReportNumberOfRecords, Operator::AllRecords);

    assert_eq!(engine.process(CONNECTION, &raw, &mut transport), Outcome::Pending);

    assert_eq!(engine.state(), EngineState::Responding);

    assert_eq!(engine.process(CONNECTION, &raw, &mut transport), Outcome::Dropped);

    assert_eq!(
        engine.resume(&mut transport),
        Some(Outcome::Completed(Response::Count { count: 5 }))
    );

    assert_eq!(transport.responses(), [Response::Count { count: 5 }]);
}

#[test]
fn abort_replaces_held_response() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.script([Err(SendError::Busy)]);

    engine.process(CONNECTION, &command(Opcode::DeleteRecords, Operator::LastRecord), &mut transport);

    engine.process(CONNECTION, &abort(), &mut transport);

    assert_eq!(
        transport.responses(),
        [Response::generic(Opcode::Abort, ResponseCode::Success)]
    );

    // the delete itself was done before the response was held
    assert_eq!(engine.get_store().active_count(), 4);

    assert_eq!(engine.resume(&mut transport), None);
}

#[test]
fn busy_abort_response() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.busy_after(1);

    engine.process(CONNECTION, &report_all(), &mut transport);

    transport.script([Err(SendError::Busy)]);

    assert_eq!(engine.process(CONNECTION, &abort(), &mut transport), Outcome::Pending);

    assert_eq!(engine.state(), EngineState::Responding);

    assert_eq!(
        engine.resume(&mut transport),
        Some(Outcome::Completed(Response::generic(Opcode::Abort, ResponseCode::Success)))
    );

    assert_eq!(transport.records(), [0]);
}

#[test]
fn malformed_abort_while_busy() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.busy_after(2);

    assert_eq!(engine.process(CONNECTION, &report_all(), &mut transport), Outcome::Pending);

    let invalid_operator = Response::generic(Opcode::Abort, ResponseCode::InvalidOperator);

    let invalid_operand = Response::generic(Opcode::Abort, ResponseCode::InvalidOperand);

    assert_eq!(
        engine.process(CONNECTION, &[0x03, 0x01], &mut transport),
        Outcome::Rejected(invalid_operator)
    );

    assert_eq!(
        engine.process(CONNECTION, &[0x03, 0x00, 0x01], &mut transport),
        Outcome::Rejected(invalid_operand)
    );

    assert_eq!(engine.state(), EngineState::Busy(Opcode::ReportRecords));

    let success = Response::generic(Opcode::ReportRecords, ResponseCode::Success);

    assert_eq!(engine.resume(&mut transport), Some(Outcome::Completed(success)));

    assert_eq!(transport.records(), [0, 1, 2, 3, 4]);

    assert_eq!(transport.responses(), [invalid_operator, invalid_operand, success]);
}

#[test]
fn failed_record_ends_report() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.script([Ok(()), Ok(()), Err(SendError::Failed)]);

    let outcome = engine.process(CONNECTION, &report_all(), &mut transport);

    assert_eq!(
        outcome,
        Outcome::Completed(Response::generic(
            Opcode::ReportRecords,
            ResponseCode::ProcedureNotCompleted
        ))
    );

    assert_eq!(transport.records(), [0, 1]);

    assert!(engine.is_idle());
}

#[test]
fn failed_response_is_undelivered() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.script([Err(SendError::Failed)]);

    let raw = command(Opcode::ReportNumberOfRecords, Operator::AllRecords);

    let outcome = engine.process(CONNECTION, &raw, &mut transport);

    assert_eq!(outcome, Outcome::Undelivered(Response::Count { count: 5 }));

    assert!(transport.get_sent().is_empty());

    assert!(engine.is_idle());
}

#[test]
fn disconnect_during_report() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(5).unwrap());

    let mut transport = RecordingTransport::new();

    transport.busy_after(2);

    engine.process(CONNECTION, &report_all(), &mut transport);

    engine.disconnected(ConnectionHandle::new(0x99));

    assert_eq!(engine.state(), EngineState::Busy(Opcode::ReportRecords));

    engine.disconnected(CONNECTION);

    assert!(engine.is_idle());

    assert_eq!(engine.resume(&mut transport), None);

    // a new command starts from scratch
    engine.process(CONNECTION, &report_all(), &mut transport);

    assert_eq!(transport.records(), [0, 1, 0, 1, 2, 3, 4]);
}
