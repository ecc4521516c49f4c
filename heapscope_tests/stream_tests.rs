//! Snapshot stream properties: rate limiting, cancellation and async draining.

mod scripted;

use heapscope::{
    common::time::{Clock, ManualClock},
    OptionsBuilder, SnapshotStream, Tick,
};

use scripted::{stream, ScriptedEngine};

/// One step per created object
fn creating_script(count: u64) -> String {
    (1..=count)
        .map(|id| format!("create {id} object\n---\n"))
        .collect()
}

#[test]
fn at_most_one_snapshot_per_interval() {
    let options = OptionsBuilder::new()
        .batch_size(1)
        .snapshot_interval(10)
        .build();
    let clock = ManualClock::new();
    let mut stream = SnapshotStream::with_clock(
        &mut ScriptedEngine,
        &creating_script(30),
        &options,
        clock.clone(),
    );

    let mut emitted_at = Vec::new();
    loop {
        match stream.tick() {
            Tick::Snapshot(_) => emitted_at.push(clock.now_millis()),
            Tick::Pending => {}
            Tick::Finished(snapshot) => {
                assert!(snapshot.is_final());
                break;
            }
            other => panic!("unexpected tick {other:?}"),
        }
        clock.advance(3);
    }

    assert_eq!(emitted_at[0], 0);
    assert!(emitted_at.len() > 1);
    assert!(emitted_at.windows(2).all(|pair| pair[1] - pair[0] >= 10));
    assert_eq!(stream.tick(), Tick::Closed);
}

#[test]
fn final_snapshot_ignores_interval() {
    let options = OptionsBuilder::new().snapshot_interval(u64::MAX).build();
    let items: Vec<_> = stream(&creating_script(3), &options).collect();

    assert_eq!(items.len(), 1);
    let last = items[0].as_ref().unwrap();
    assert!(last.is_final());
    assert_eq!(last.vertices.len(), 5);
}

#[test]
fn stop_suppresses_later_snapshots() {
    let options = OptionsBuilder::new()
        .batch_size(1)
        .snapshot_interval(0)
        .build();
    let mut stream = stream(&creating_script(10), &options);
    let handle = stream.stop_handle();

    let first = stream.next();
    assert!(matches!(first, Some(Ok(_))));

    handle.stop();
    stream.stop();
    handle.stop();

    assert_eq!(stream.next(), None);
    assert_eq!(stream.next(), None);
    assert_eq!(stream.tick(), Tick::Closed);
    assert_eq!(stream.emitted(), 1);
    assert_eq!(stream.stepper().steps(), 1);
}

#[test]
fn stop_before_first_tick_emits_nothing() {
    let options = OptionsBuilder::new().build();
    let mut stream = stream(&creating_script(2), &options);

    stream.stop();

    assert_eq!(stream.next(), None);
    assert_eq!(stream.stepper().steps(), 0);
}

#[tokio::test]
async fn next_async_drains_stream() {
    let options = OptionsBuilder::new()
        .batch_size(2)
        .snapshot_interval(0)
        .build();
    let mut stream = stream(&format!("{}{}", creating_script(2), "---\n".repeat(6)), &options);

    let mut items = Vec::new();
    while let Some(item) = stream.next_async().await {
        items.push(item.unwrap());
    }

    // One snapshot for the created objects, then the final one
    assert_eq!(items.len(), 2);
    assert!(!items[0].is_final());
    assert!(items[1].is_final());
    assert_eq!(stream.stepper().yields(), 4);
    assert!(stream.next_async().await.is_none());
}

#[tokio::test]
async fn next_async_reports_errors() {
    let options = OptionsBuilder::new().build();
    let mut stream = stream("create 1\npop 1\n", &options);

    let item = stream.next_async().await;

    assert!(matches!(item, Some(Err(error)) if error.is_internal()));
    assert!(stream.next_async().await.is_none());
}
