//! SnapshotStream - rate-limited, cancellable snapshots of a stepping session
//!
//! Each `tick` resumes the instrumented stepper for one batch and then reads the graph at the
//! batch boundary. While the session runs, a snapshot is emitted only if the graph changed and
//! at least `snapshot_interval` milliseconds passed since the previous emission. The session
//! ends with exactly one terminal item: the final snapshot (carrying the builtins and the
//! root) or the error that ended it.

use std::{cell::Cell, rc::Rc};

use tracing::{debug, trace};

use crate::{
    common::{
        options::Options,
        time::{Clock, SystemClock},
    },
    engine::Engine,
    error::SessionError,
    graph::{ObjectGraph, Snapshot},
    stepper::{Batch, GraphStepper},
};

/// Result of resuming the stream for one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// A batch ran and nothing was emitted
    Pending,
    Snapshot(Snapshot),
    /// The terminal snapshot. Nothing follows it.
    Finished(Snapshot),
    /// The session failed. Nothing follows it.
    Failed(SessionError),
    /// The stream ended or was stopped
    Closed,
}

/// Cancellation flag shared between a stream and its consumers.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn new() -> StopHandle {
        StopHandle::default()
    }

    /// Request that the stream emits nothing further. Repeated calls have no further effect.
    pub fn stop(&self) {
        self.0.set(true);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

pub struct SnapshotStream<E: Engine, C: Clock = SystemClock> {
    stepper: GraphStepper<E>,
    clock: C,

    /// Minimum time between emitted snapshots, in milliseconds
    interval: u64,
    last_emit: Option<u64>,

    stop: StopHandle,
    closed: bool,

    /// Number of snapshots emitted, including the terminal one
    emitted: usize,
}

impl<E: Engine> SnapshotStream<E, SystemClock> {
    pub fn new(engine: &mut E, source: &str, options: &Options) -> Self {
        SnapshotStream::with_clock(engine, source, options, SystemClock::new())
    }
}

impl<E: Engine, C: Clock> SnapshotStream<E, C> {
    pub fn with_clock(engine: &mut E, source: &str, options: &Options, clock: C) -> Self {
        SnapshotStream {
            stepper: GraphStepper::instrumented(engine, source, options),
            clock,
            interval: options.snapshot_interval,
            last_emit: None,
            stop: StopHandle::new(),
            closed: false,
            emitted: 0,
        }
    }

    /// Resume the session for one batch.
    pub fn tick(&mut self) -> Tick {
        if self.closed {
            return Tick::Closed;
        }

        if self.stop.is_stopped() {
            debug!(emitted = self.emitted, "snapshot stream stopped");
            self.closed = true;
            return Tick::Closed;
        }

        match self.stepper.run_batch() {
            Batch::Yielded => self.emit_if_due(),
            Batch::Done => {
                self.closed = true;
                self.emitted += 1;
                debug!(emitted = self.emitted, "snapshot stream finished");
                Tick::Finished(self.stepper.graph().final_snapshot())
            }
            Batch::Failed(error) => {
                self.closed = true;
                debug!(%error, emitted = self.emitted, "snapshot stream failed");
                Tick::Failed(error)
            }
        }
    }

    fn emit_if_due(&mut self) -> Tick {
        if !self.stepper.graph().has_changes() {
            return Tick::Pending;
        }

        let now = self.clock.now_millis();
        let due = self
            .last_emit
            .map_or(true, |last| now.saturating_sub(last) >= self.interval);
        if !due {
            return Tick::Pending;
        }

        self.last_emit = Some(now);
        self.emitted += 1;
        let snapshot = self.stepper.graph_mut().take_snapshot();
        trace!(
            vertices = snapshot.vertices.len(),
            edges = snapshot.edges.len(),
            "emitting snapshot"
        );
        Tick::Snapshot(snapshot)
    }

    /// Stop the stream. Nothing is emitted after the current batch.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn graph(&self) -> &ObjectGraph {
        self.stepper.graph()
    }

    pub fn stepper(&self) -> &GraphStepper<E> {
        &self.stepper
    }

    /// Next emitted item, yielding to the tokio scheduler between batches that emit nothing.
    #[cfg(feature = "tokio")]
    pub async fn next_async(&mut self) -> Option<Result<Snapshot, SessionError>> {
        loop {
            match self.tick() {
                Tick::Pending => tokio::task::yield_now().await,
                Tick::Snapshot(snapshot) | Tick::Finished(snapshot) => return Some(Ok(snapshot)),
                Tick::Failed(error) => return Some(Err(error)),
                Tick::Closed => return None,
            }
        }
    }
}

impl<E: Engine, C: Clock> Iterator for SnapshotStream<E, C> {
    type Item = Result<Snapshot, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.tick() {
                Tick::Pending => continue,
                Tick::Snapshot(snapshot) | Tick::Finished(snapshot) => return Some(Ok(snapshot)),
                Tick::Failed(error) => return Some(Err(error)),
                Tick::Closed => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests;
