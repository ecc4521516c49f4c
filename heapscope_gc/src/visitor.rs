//! GC Visitor and Context traits
//!
//! These traits allow the collector to be decoupled from the graph types.
//! - `GcVisitor`: Implemented by the collector's Marker, used by the graph to report reachable vertices
//! - `GcContext`: Implemented by the graph, provides roots, vertex tracing and release of swept vertices

use alloc::vec::Vec;

use crate::VertexId;

/// GC Visitor trait - implemented by the collector's marking logic
///
/// The graph calls methods on this trait to report vertices it can reach.
///
/// # Example
/// ```ignore
/// fn trace_vertex(&self, vertex: VertexId, visitor: &mut impl GcVisitor) {
///     for child in self.named_children(vertex) {
///         visitor.visit(child);
///     }
/// }
/// ```
pub trait GcVisitor {
    /// Visit a reachable vertex
    ///
    /// Marks the vertex gray if it has not been visited yet, so that its own children are
    /// traced later.
    fn visit(&mut self, vertex: VertexId);

    /// Mark a vertex as live without tracing it
    ///
    /// Used for structural vertices (the root sentinel, stack frames) that must survive a
    /// collection but whose outgoing edges are not part of the reachability walk.
    fn pin(&mut self, vertex: VertexId);

    /// Visit an optional vertex
    #[inline]
    fn visit_opt(&mut self, vertex: Option<VertexId>) {
        if let Some(vertex) = vertex {
            self.visit(vertex);
        }
    }

    /// Visit every vertex in a slice
    #[inline]
    fn visit_all(&mut self, vertices: &[VertexId]) {
        for vertex in vertices {
            self.visit(*vertex);
        }
    }
}

/// GC Context trait - implemented by the graph
///
/// Provides the collector with access to roots and vertex tracing logic.
/// This separates the collection algorithm from the graph's vertex model.
pub trait GcContext {
    /// Visit all roots
    ///
    /// Called at the start of a collection. Roots typically include:
    /// - The root sentinel and the values it names
    /// - Every frame in the stack chain (pinned) and the value each frame wraps
    fn visit_roots(&self, visitor: &mut impl GcVisitor);

    /// Trace a vertex's children
    ///
    /// Called once for each gray vertex during marking. Implementations report every child
    /// the vertex can reach through its name enumeration.
    fn trace_vertex(&self, vertex: VertexId, visitor: &mut impl GcVisitor);

    /// Vertices that may be released if they are left unmarked
    ///
    /// Structural vertices (sentinels, stack frames) must never be returned here.
    fn sweep_candidates(&self) -> Vec<VertexId>;

    /// Release a vertex that survived marking as white
    fn release(&mut self, vertex: VertexId);
}
