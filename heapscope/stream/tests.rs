use crate::{
    common::time::ManualClock,
    engine::{
        replay::{ReplayEngine, Trace, TraceEvent},
        AbstractValue,
    },
    error::SessionError,
    graph::Snapshot,
    OptionsBuilder,
};

use super::{SnapshotStream, StopHandle, Tick};

const INTERVAL: u64 = 100;

fn stream(trace: &Trace, clock: &ManualClock) -> SnapshotStream<ReplayEngine, ManualClock> {
    stream_from_source(&trace.to_json().unwrap(), clock)
}

fn stream_from_source(
    source: &str,
    clock: &ManualClock,
) -> SnapshotStream<ReplayEngine, ManualClock> {
    let options = OptionsBuilder::new()
        .batch_size(1)
        .snapshot_interval(INTERVAL)
        .build();
    SnapshotStream::with_clock(&mut ReplayEngine::new(), source, &options, clock.clone())
}

/// One step per created object
fn creating_trace(count: u64) -> Trace {
    (1..=count).fold(Trace::new(), |trace, value| {
        trace.step(vec![TraceEvent::create(AbstractValue::object(value))])
    })
}

fn expect_snapshot(tick: Tick) -> Snapshot {
    match tick {
        Tick::Snapshot(snapshot) => snapshot,
        other => panic!("expected a snapshot, got {other:?}"),
    }
}

#[test]
fn test_snapshots_are_rate_limited() {
    let clock = ManualClock::new();
    let mut stream = stream(&creating_trace(5), &clock);

    let first = expect_snapshot(stream.tick());
    assert_eq!(first.vertices.len(), 3);
    assert!(!first.is_final());

    assert_eq!(stream.tick(), Tick::Pending);
    clock.set(INTERVAL - 1);
    assert_eq!(stream.tick(), Tick::Pending);
    clock.set(INTERVAL);
    let second = expect_snapshot(stream.tick());
    assert_eq!(second.vertices.len(), 6);
    assert_eq!(stream.tick(), Tick::Pending);

    match stream.tick() {
        Tick::Finished(last) => {
            assert!(last.is_final());
            assert_eq!(last.vertices.len(), 7);
        }
        other => panic!("expected the final snapshot, got {other:?}"),
    }
    assert_eq!(stream.tick(), Tick::Closed);
    assert_eq!(stream.emitted(), 3);
}

#[test]
fn test_unchanged_graph_emits_nothing_until_final() {
    let clock = ManualClock::new();
    let mut stream = stream(&Trace::new().idle_steps(3), &clock);

    for _ in 0..3 {
        clock.advance(INTERVAL);
        assert_eq!(stream.tick(), Tick::Pending);
    }
    assert!(matches!(stream.tick(), Tick::Finished(_)));
    assert!(stream.is_closed());
}

#[test]
fn test_final_snapshot_carries_builtins_and_root() {
    let trace = Trace::new()
        .bootstrap(TraceEvent::create(
            AbstractValue::object(1).with_class("Object.prototype"),
        ))
        .bootstrap(TraceEvent::create(
            AbstractValue::object(2).with_class("Array.prototype"),
        ))
        .idle_steps(1);
    let items: Vec<_> = stream(&trace, &ManualClock::new()).collect();

    // Bootstrap changes are reported by the first batch
    assert_eq!(items.len(), 2);
    let first = items[0].as_ref().unwrap();
    assert!(!first.is_final());
    assert_eq!(first.vertices.len(), 2);

    let last = items[1].as_ref().unwrap();
    let builtins = last.builtins.as_ref().unwrap();
    assert_eq!(builtins.len(), 2);
    assert_eq!(last.root.as_ref().unwrap().label, "Root");
    assert_eq!(last.vertices.len(), 2);
}

#[test]
fn test_stop_is_idempotent() {
    let clock = ManualClock::new();
    let mut stream = stream(&creating_trace(5), &clock);
    expect_snapshot(stream.tick());

    stream.stop();
    stream.stop();

    assert_eq!(stream.tick(), Tick::Closed);
    assert_eq!(stream.tick(), Tick::Closed);
    assert_eq!(stream.next(), None);
    assert_eq!(stream.stepper().steps(), 1);
}

#[test]
fn test_stop_from_consumer_loop() {
    let clock = ManualClock::new();
    let mut stream = stream(&creating_trace(10), &clock);
    let handle: StopHandle = stream.stop_handle();

    let mut received = 0;
    for item in &mut stream {
        assert!(item.is_ok());
        received += 1;
        clock.advance(INTERVAL);
        handle.stop();
    }

    assert_eq!(received, 1);
    assert!(handle.is_stopped());
    assert!(stream.is_closed());
}

#[test]
fn test_parse_error_is_the_only_item() {
    let items: Vec<_> = stream_from_source("[1, 2", &ManualClock::new()).collect();

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(SessionError::Parse(_))));
}

#[test]
fn test_error_follows_earlier_snapshots() {
    let trace = Trace::new()
        .step(vec![TraceEvent::create(AbstractValue::object(1))])
        .step(vec![TraceEvent::throw("boom")])
        .idle_steps(1);
    let items: Vec<_> = stream(&trace, &ManualClock::new()).collect();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    match &items[1] {
        Err(SessionError::Execution(error)) => assert_eq!(error.message, "boom"),
        other => panic!("expected an execution error, got {other:?}"),
    }
}

#[test]
fn test_snapshot_clears_pending_changes() {
    let clock = ManualClock::new();
    let mut stream = stream(&creating_trace(2).idle_steps(2), &clock);

    expect_snapshot(stream.tick());
    clock.advance(INTERVAL);
    expect_snapshot(stream.tick());
    clock.advance(INTERVAL);

    // Idle steps leave nothing to report
    assert_eq!(stream.tick(), Tick::Pending);
    assert!(!stream.graph().has_changes());
}

/// Final snapshot labels of a batch-per-step session emitting at most every `interval` ms
fn final_labels(trace: &Trace, interval: u64) -> Vec<String> {
    let options = OptionsBuilder::new()
        .batch_size(1)
        .snapshot_interval(interval)
        .build();
    let source = trace.to_json().unwrap();
    let items: Vec<_> =
        SnapshotStream::with_clock(&mut ReplayEngine::new(), &source, &options, ManualClock::new())
            .collect();

    let last = match items.last() {
        Some(Ok(snapshot)) if snapshot.is_final() => snapshot,
        other => panic!("expected the final snapshot, got {other:?}"),
    };
    let mut labels: Vec<String> = last.vertices.iter().map(|vertex| vertex.label.clone()).collect();
    labels.sort();
    labels
}

#[test]
fn test_collection_does_not_depend_on_emission() {
    let trace = Trace::new()
        .step(vec![
            TraceEvent::create(AbstractValue::object(1).with_class("Point")),
            TraceEvent::link(None, Some(1), "a"),
        ])
        .step(vec![TraceEvent::unlink(None, None, "a")])
        .step(vec![TraceEvent::CallBoundary]);

    let eager = final_labels(&trace, 0);
    let throttled = final_labels(&trace, u64::MAX);

    assert_eq!(eager, throttled);
    assert!(!eager.iter().any(|label| label == "Point"));
}
