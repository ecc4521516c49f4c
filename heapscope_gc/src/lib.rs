//! heapscope Reachability Collector
//!
//! A mark-sweep collector over an abstract object graph.
//! This crate provides the marking and sweeping machinery without depending on the graph types.
//!
//! Key types:
//! - `VertexId`: A stable handle to a vertex in the graph's arena
//! - `Collector`: Drives root scanning, marking and sweeping
//!
//! Key traits:
//! - `GcVisitor`: Implemented by the collector, used by the graph to report reachable vertices
//! - `GcContext`: Implemented by the graph, provides roots, tracing and release of swept vertices

#![no_std]
extern crate alloc;

mod collector;
mod color;
mod gray_queue;
mod vertex_id;
mod visitor;

pub use collector::{CollectStats, Collector, Marker};
pub use color::{CollectPhase, GcColor};
pub use vertex_id::VertexId;
pub use visitor::{GcContext, GcVisitor};

#[cfg(test)]
mod tests;
