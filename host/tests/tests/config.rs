//! Tests for the configuration of the RACP engine

use racp::pdu::{FilterType, Opcode, Operator, ResponseCode};
use racp::{
    ArrayRecordStore, BusyPolicy, CalendarTime, IdleAbortPolicy, Outcome, RacpConfig, RacpEngine, Response,
};
use racp_tests::{abort, command, sequence_command, time_command, RecordingTransport, CONNECTION};

fn time(hour: u8, minute: u8) -> CalendarTime {
    CalendarTime::new(2019, 1, 1, hour, minute, 0).unwrap()
}

#[test]
fn default_config() {
    let config = RacpConfig::default();

    assert_eq!(config.get_busy_policy(), BusyPolicy::Drop);

    assert_eq!(config.get_idle_abort_policy(), IdleAbortPolicy::Success);

    for opcode in [Opcode::ReportRecords, Opcode::DeleteRecords, Opcode::ReportNumberOfRecords] {
        assert!(config.is_filter_supported(opcode, FilterType::SequenceNumber));

        assert!(config.is_filter_supported(opcode, FilterType::UserFacingTime));
    }

    assert!(!config.is_filter_supported(Opcode::Abort, FilterType::SequenceNumber));
}

#[test]
fn disabled_filter_is_not_supported() {
    let config = RacpConfig::new().disable_filter(Opcode::DeleteRecords, FilterType::SequenceNumber);

    let mut engine = RacpEngine::with_config(ArrayRecordStore::simulated(11).unwrap(), config);

    let mut transport = RecordingTransport::new();

    let delete = sequence_command(Opcode::DeleteRecords, Operator::LessOrEqual, &[4]);

    let count = sequence_command(Opcode::ReportNumberOfRecords, Operator::LessOrEqual, &[4]);

    engine.process(CONNECTION, &delete, &mut transport);

    engine.process(CONNECTION, &count, &mut transport);

    assert_eq!(
        transport.responses(),
        [
            Response::generic(Opcode::DeleteRecords, ResponseCode::OperandNotSupported),
            Response::Count { count: 5 },
        ]
    );

    assert_eq!(engine.get_store().active_count(), 11);
}

#[test]
fn reenabled_filter() {
    let config = RacpConfig::new()
        .disable_filter(Opcode::ReportRecords, FilterType::UserFacingTime)
        .enable_filter(Opcode::ReportRecords, FilterType::UserFacingTime);

    assert_eq!(config, RacpConfig::default());
}

#[test]
fn report_by_time() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(11).unwrap());

    let mut transport = RecordingTransport::new();

    let raw = time_command(
        Opcode::ReportRecords,
        Operator::WithinRangeInclusive,
        &[time(8, 3), time(23, 0)],
    );

    engine.process(CONNECTION, &raw, &mut transport);

    assert_eq!(transport.records(), [3, 4, 5, 6, 7, 8, 9, 10]);

    transport.clear();

    let raw = time_command(Opcode::ReportRecords, Operator::LessOrEqual, &[time(8, 1)]);

    engine.process(CONNECTION, &raw, &mut transport);

    assert_eq!(transport.records(), [0, 1]);
}

#[test]
fn time_range_after_last_record() {
    let mut engine = RacpEngine::new(ArrayRecordStore::simulated(11).unwrap());

    let mut transport = RecordingTransport::new();

    let raw = time_command(
        Opcode::ReportNumberOfRecords,
        Operator::WithinRangeInclusive,
        &[time(9, 0), time(10, 0)],
    );

    engine.process(CONNECTION, &raw, &mut transport);

    assert_eq!(
        transport.responses(),
        [Response::generic(Opcode::ReportNumberOfRecords, ResponseCode::InvalidOperand)]
    );
}

#[test]
fn busy_commands_get_procedure_not_completed() {
    let config = RacpConfig::new().set_busy_policy(BusyPolicy::ProcedureNotCompleted);

    let mut engine = RacpEngine::with_config(ArrayRecordStore::simulated(11).unwrap(), config);

    let mut transport = RecordingTransport::new();

    transport.busy_after(4);

    engine.process(CONNECTION, &command(Opcode::ReportRecords, Operator::AllRecords), &mut transport);

    let delete = command(Opcode::DeleteRecords, Operator::AllRecords);

    let outcome = engine.process(CONNECTION, &delete, &mut transport);

    assert_eq!(
        outcome,
        Outcome::Rejected(Response::generic(
            Opcode::DeleteRecords,
            ResponseCode::ProcedureNotCompleted
        ))
    );

    // unknown opcodes are rejected the same way
    let outcome = engine.process(CONNECTION, &[0x7F], &mut transport);

    assert_eq!(
        outcome.response(),
        Some(&Response::Generic {
            requested_opcode: 0x7F,
            code: ResponseCode::ProcedureNotCompleted
        })
    );

    engine.resume(&mut transport);

    assert_eq!(transport.records(), (0..11).collect::<Vec<u16>>());

    assert_eq!(
        transport.responses().last(),
        Some(&Response::generic(Opcode::ReportRecords, ResponseCode::Success))
    );

    assert_eq!(engine.get_store().active_count(), 11);
}

#[test]
fn idle_abort() {
    let mut transport = RecordingTransport::new();

    RacpEngine::new(ArrayRecordStore::new()).process(CONNECTION, &abort(), &mut transport);

    let config = RacpConfig::new().set_idle_abort_policy(IdleAbortPolicy::AbortUnsuccessful);

    RacpEngine::with_config(ArrayRecordStore::new(), config).process(CONNECTION, &abort(), &mut transport);

    assert_eq!(
        transport.responses(),
        [
            Response::generic(Opcode::Abort, ResponseCode::Success),
            Response::generic(Opcode::Abort, ResponseCode::AbortUnsuccessful),
        ]
    );
}
