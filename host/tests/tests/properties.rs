//! Randomized checks of the RACP engine
//!
//! Every test uses a seeded `ChaCha8Rng` so a failure can be reproduced from the printed seed.

use racp::filter::select;
use racp::pdu::{Opcode, Operator, ResponseCode};
use racp::{ArrayRecordStore, CalendarTime, RacpEngine, RecordStore, Response, SendError};
use racp_tests::{
    abort, active_indexes, command, sequence_command, time_command, RecordingTransport, CONNECTION,
};
use racp_util::time::compare;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;

const ITERATIONS: usize = 200;

const SELECTING: [Opcode; 3] = [
    Opcode::ReportRecords,
    Opcode::DeleteRecords,
    Opcode::ReportNumberOfRecords,
];

const OPERATORS: [Operator; 7] = [
    Operator::Null,
    Operator::AllRecords,
    Operator::LessOrEqual,
    Operator::GreaterOrEqual,
    Operator::WithinRangeInclusive,
    Operator::FirstRecord,
    Operator::LastRecord,
];

fn rng() -> ChaCha8Rng {
    let seed: u64 = rand::random();

    println!("seed: {seed:#x}");

    ChaCha8Rng::seed_from_u64(seed)
}

fn random_store(rng: &mut ChaCha8Rng) -> ArrayRecordStore {
    let mut store = ArrayRecordStore::simulated(rng.gen_range(0..40)).unwrap();

    for index in 0..store.len() {
        if rng.gen_bool(0.3) {
            store.set_status(index, racp::RecordStatus::Deleted);
        }
    }

    store
}

fn random_time(rng: &mut ChaCha8Rng) -> CalendarTime {
    ArrayRecordStore::SIMULATED_BASE_TIME
        .add_minutes(rng.gen_range(0..50))
        .unwrap()
}

/// Create a command for `opcode` with a random operator and a random, mostly well formed, operand
fn random_command(rng: &mut ChaCha8Rng, opcode: Opcode) -> Vec<u8> {
    let operator = OPERATORS[rng.gen_range(0..OPERATORS.len())];

    let values = match operator {
        Operator::WithinRangeInclusive => 2,
        Operator::LessOrEqual | Operator::GreaterOrEqual => 1,
        _ => 0,
    };

    match rng.gen_range(0..10) {
        0 => {
            let mut raw = command(opcode, operator);

            raw.extend((0..rng.gen_range(1..5)).map(|_| rng.gen::<u8>()));

            raw
        }
        1..=5 if values != 0 => {
            let values: Vec<u16> = (0..values).map(|_| rng.gen_range(0..45)).collect();

            sequence_command(opcode, operator, &values)
        }
        6..=9 if values != 0 => {
            let times: Vec<CalendarTime> = (0..values).map(|_| random_time(rng)).collect();

            time_command(opcode, operator, &times)
        }
        _ => command(opcode, operator),
    }
}

/// Commands delivered while a command is in progress never get a response unless they abort, and
/// every other accepted command gets exactly one response once the transport drains
#[test]
fn single_response_per_accepted_command() {
    let mut rng = rng();

    for _ in 0..ITERATIONS {
        let mut engine = RacpEngine::new(random_store(&mut rng));

        let mut transport = RecordingTransport::new();

        let mut accepted = 0;

        let mut interrupted = 0;

        for _ in 0..20 {
            let script: Vec<_> = (0..rng.gen_range(0..4))
                .map(|_| if rng.gen_bool(0.5) { Ok(()) } else { Err(SendError::Busy) })
                .collect();

            transport.script(script);

            let responses = transport.responses().len();

            if rng.gen_bool(0.3) {
                engine.resume(&mut transport);

                assert!(transport.responses().len() <= responses + 1);

                continue;
            }

            let raw = if rng.gen_bool(0.2) {
                abort()
            } else {
                let opcode = SELECTING[rng.gen_range(0..SELECTING.len())];

                random_command(&mut rng, opcode)
            };

            let was_idle = engine.is_idle();

            engine.process(CONNECTION, &raw, &mut transport);

            if was_idle || raw == abort() {
                accepted += 1;

                if !was_idle {
                    interrupted += 1;
                }
            } else {
                assert_eq!(transport.responses().len(), responses, "response to dropped {raw:x?}");
            }

            assert!(transport.responses().len() <= accepted);
        }

        while !engine.is_idle() {
            engine.resume(&mut transport);
        }

        assert_eq!(transport.responses().len(), accepted - interrupted);
    }
}

/// The count of a filter equals the number of records reported for the same filter
#[test]
fn count_matches_report() {
    let mut rng = rng();

    for _ in 0..ITERATIONS {
        let store = random_store(&mut rng);

        let raw = random_command(&mut rng, Opcode::ReportRecords);

        let mut count_raw = raw.clone();

        count_raw[0] = Opcode::ReportNumberOfRecords.into();

        let mut report_transport = RecordingTransport::new();

        let mut count_transport = RecordingTransport::new();

        RacpEngine::new(store.clone()).process(CONNECTION, &raw, &mut report_transport);

        RacpEngine::new(store).process(CONNECTION, &count_raw, &mut count_transport);

        let reported = report_transport.records().len();

        match (report_transport.responses()[0], count_transport.responses()[0]) {
            (_, Response::Count { count }) => assert_eq!(usize::from(count), reported, "{raw:x?}"),
            (report, count) => {
                assert_eq!(report.code(), count.code(), "{raw:x?}");

                assert_eq!(reported, 0);
            }
        }
    }
}

/// Deleting with the same command twice changes nothing the second time
#[test]
fn delete_is_idempotent() {
    let mut rng = rng();

    for _ in 0..ITERATIONS {
        let mut engine = RacpEngine::new(random_store(&mut rng));

        let mut transport = RecordingTransport::new();

        let raw = random_command(&mut rng, Opcode::DeleteRecords);

        engine.process(CONNECTION, &raw, &mut transport);

        let after_first = active_indexes(engine.get_store());

        engine.process(CONNECTION, &raw, &mut transport);

        assert_eq!(active_indexes(engine.get_store()), after_first);

        let responses = transport.responses();

        match responses[0].code() {
            ResponseCode::Success | ResponseCode::NoRecordsFound => {
                assert_eq!(responses[1].code(), ResponseCode::NoRecordsFound, "{raw:x?}")
            }
            code => assert_eq!(responses[1].code(), code, "{raw:x?}"),
        }
    }
}

/// A sequence number range selects the active records within the range clamped to the last record
#[test]
fn sequence_range_selection() {
    let mut rng = rng();

    for _ in 0..ITERATIONS {
        let mut store = random_store(&mut rng);

        if store.is_empty() {
            store = ArrayRecordStore::simulated(1).unwrap();
        }

        let low: u16 = rng.gen_range(0..50);

        let high: u16 = rng.gen_range(0..50);

        let mut transport = RecordingTransport::new();

        let raw = sequence_command(Opcode::ReportRecords, Operator::WithinRangeInclusive, &[low, high]);

        let last = u16::try_from(store.len() - 1).unwrap();

        let expected: Vec<usize> = active_indexes(&store)
            .into_iter()
            .filter(|index| (usize::from(low)..=usize::from(high)).contains(index))
            .collect();

        RacpEngine::new(store).process(CONNECTION, &raw, &mut transport);

        let response = transport.responses()[0];

        if low > high.min(last) {
            assert_eq!(response.code(), ResponseCode::InvalidOperand);
        } else {
            let reported: Vec<usize> = transport.records().into_iter().map(usize::from).collect();

            assert_eq!(reported, expected);
        }
    }
}

/// Selection by time agrees with comparing the timestamps of the records
#[test]
fn time_range_selection() {
    let mut rng = rng();

    for _ in 0..ITERATIONS {
        let store = random_store(&mut rng);

        let low = random_time(&mut rng);

        let high = random_time(&mut rng);

        let operand = racp::operand::Operand::CalendarTime(racp::operand::FilterValue::Range(low, high));

        let newest = store.len().checked_sub(1).map(|last| store.get(last).unwrap().timestamp);

        let clamped = match newest {
            Some(newest) if compare(&newest, &high) != Ordering::Greater => newest,
            _ => high,
        };

        let selection = select(&store, Operator::WithinRangeInclusive, Some(&operand));

        if compare(&low, &clamped) == Ordering::Greater {
            assert_eq!(selection, Err(ResponseCode::InvalidOperand));
        } else {
            let expected: Vec<usize> = active_indexes(&store)
                .into_iter()
                .filter(|index| {
                    let timestamp = store.get(*index).unwrap().timestamp;

                    timestamp >= low && timestamp <= clamped
                })
                .collect();

            assert_eq!(selection, Ok(expected));
        }
    }
}

/// Comparing times is a total order
#[test]
fn time_comparison_is_total_order() {
    let mut rng = rng();

    let mut time = || {
        CalendarTime::new(
            2019,
            rng.gen_range(1..=2),
            rng.gen_range(1..=2),
            rng.gen_range(0..2),
            rng.gen_range(0..2),
            rng.gen_range(0..2),
        )
        .unwrap()
    };

    for _ in 0..ITERATIONS * 10 {
        let (a, b, c) = (time(), time(), time());

        assert_eq!(compare(&a, &b), compare(&b, &a).reverse());

        assert_eq!(compare(&a, &b) == Ordering::Equal, a == b);

        if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
            assert_ne!(compare(&a, &c), Ordering::Greater, "{a} {b} {c}");
        }

        if compare(&a, &b) == Ordering::Less && compare(&b, &c) == Ordering::Less {
            assert_eq!(compare(&a, &c), Ordering::Less, "{a} {b} {c}");
        }
    }
}
