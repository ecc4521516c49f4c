//! heapscope
//!
//! Tracks the abstract object graph of a program while an abstract execution engine steps
//! through it. The engine reports value creation, stack pushes and pops, property links and
//! call boundaries through `EngineHooks`; the `ObjectGraph` keeps the live vertex and edge
//! sets, the explicit stack chain and the builtin partition, and simulates garbage collection
//! with a mark-sweep pass at call boundaries. A `Stepper` drives the engine in bounded batches
//! and a `SnapshotStream` emits rate-limited snapshots of the graph.

pub mod common;
pub mod engine;
pub mod error;
pub mod graph;
pub mod stepper;
pub mod stream;

pub use common::options::{Options, OptionsBuilder};
pub use engine::{AbstractValue, Engine, EngineHooks, Machine, NoopHooks, ValueId};
pub use error::{EngineError, ExecutionError, GraphError, ParseError, SessionError};
pub use graph::{ObjectGraph, Snapshot};
pub use heapscope_gc::VertexId;
pub use stepper::{Batch, FlowStepper, GraphStepper, StepHooks, Stepper, StepperStatus};
pub use stream::{SnapshotStream, StopHandle, Tick};
