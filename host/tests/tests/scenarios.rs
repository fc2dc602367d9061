//! Command scenarios against a store of eleven records

use racp::pdu::{Opcode, Operator, ResponseCode};
use racp::{ArrayRecordStore, EngineState, Outcome, RacpEngine, RecordStore, Response};
use racp_tests::{command, sequence_command, store_with_deleted, RecordingTransport, Sent, CONNECTION};

#[test]
fn report_all_skips_deleted_records() {
    let mut engine = RacpEngine::new(store_with_deleted(11, &[0, 3]));

    let mut transport = RecordingTransport::new();

    engine.process(CONNECTION, &command(Opcode::ReportRecords, Operator::AllRecords), &mut transport);

    assert_eq!(transport.records(), [1, 2, 4, 5, 6, 7, 8, 9, 10]);

    assert_eq!(
        transport.get_sent().last(),
        Some(&Sent::Response(Response::generic(
            Opcode::ReportRecords,
            ResponseCode::Success
        )))
    );

    assert_eq!(transport.responses().len(), 1);
}

#[test]
fn report_less_or_equal_to_deleted_record() {
    let mut engine = RacpEngine::new(store_with_deleted(11, &[0]));

    let mut transport = RecordingTransport::new();

    let raw = sequence_command(Opcode::ReportRecords, Operator::LessOrEqual, &[0]);

    engine.process(CONNECTION, &raw, &mut transport);

    assert!(transport.records().is_empty());

    assert_eq!(
        transport.responses(),
        [Response::generic(Opcode::ReportRecords, ResponseCode::NoRecordsFound)]
    );
}

#[test]
fn count_single_record_range() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(11).unwrap());

    let mut transport = RecordingTransport::new();

    let raw = sequence_command(Opcode::ReportNumberOfRecords, Operator::WithinRangeInclusive, &[2, 2]);

    let outcome = engine.process(CONNECTION, &raw, &mut transport);

    assert_eq!(outcome, Outcome::Completed(Response::Count { count: 1 }));

    assert_eq!(transport.responses(), [Response::Count { count: 1 }]);
}

#[test]
fn delete_first_record_twice() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(11).unwrap());

    let mut transport = RecordingTransport::new();

    let raw = command(Opcode::DeleteRecords, Operator::FirstRecord);

    engine.process(CONNECTION, &raw, &mut transport);

    assert!(!engine.get_store().is_active(0));

    assert!((1..11).all(|index| engine.get_store().is_active(index)));

    engine.process(CONNECTION, &raw, &mut transport);

    assert_eq!(
        transport.responses(),
        [
            Response::generic(Opcode::DeleteRecords, ResponseCode::Success),
            Response::generic(Opcode::DeleteRecords, ResponseCode::NoRecordsFound),
        ]
    );

    assert_eq!(engine.get_store().active_count(), 10);
}

#[test]
fn report_while_reporting_is_dropped() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(11).unwrap());

    let mut transport = RecordingTransport::new();

    transport.busy_after(3);

    let raw = command(Opcode::ReportRecords, Operator::AllRecords);

    assert_eq!(engine.process(CONNECTION, &raw, &mut transport), Outcome::Pending);

    assert_eq!(engine.state(), EngineState::Busy(Opcode::ReportRecords));

    assert_eq!(engine.process(CONNECTION, &raw, &mut transport), Outcome::Dropped);

    assert!(transport.responses().is_empty());

    assert_eq!(
        engine.resume(&mut transport),
        Some(Outcome::Completed(Response::generic(
            Opcode::ReportRecords,
            ResponseCode::Success
        )))
    );

    assert_eq!(transport.records(), (0..11).collect::<Vec<u16>>());

    assert_eq!(transport.responses().len(), 1);

    assert_eq!(engine.state(), EngineState::Idle);
}
