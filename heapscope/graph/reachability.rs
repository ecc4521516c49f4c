//! Reachability walk over the object graph
//!
//! The root and the value wrapped by each stack frame are traced through their named
//! children. A named child that is a union is never marked itself: its outcomes are visited
//! in its place, expanding nested unions the same way. Frames and the stack sentinel are
//! pinned so they are never swept.

use hashbrown::HashSet;
use heapscope_gc::{GcContext, GcVisitor, VertexId};

use super::{
    object_graph::{ObjectGraph, ROOT, STACK},
    vertex::Vertex,
};

impl ObjectGraph {
    /// Visit a named child, substituting the outcomes of union values.
    fn visit_named_child(&self, child: VertexId, visitor: &mut impl GcVisitor) {
        if !matches!(self.vertex(child), Some(Vertex::Union(_))) {
            visitor.visit(child);
            return;
        }

        let mut pending = vec![child];
        let mut expanded = HashSet::new();
        while let Some(vertex) = pending.pop() {
            if !expanded.insert(vertex) {
                continue;
            }

            match self.vertex(vertex).and_then(Vertex::outcomes) {
                Some(outcomes) => pending.extend_from_slice(outcomes),
                None => visitor.visit(vertex),
            }
        }
    }
}

impl GcContext for ObjectGraph {
    fn visit_roots(&self, visitor: &mut impl GcVisitor) {
        visitor.visit(ROOT);
        visitor.visit_opt(self.global());

        visitor.pin(STACK);
        for (frame_id, frame) in self.frames() {
            visitor.pin(frame_id);
            visitor.visit(frame.value);
        }
    }

    fn trace_vertex(&self, vertex: VertexId, visitor: &mut impl GcVisitor) {
        let Some(traced) = self.vertex(vertex) else {
            return;
        };

        // A union reached directly (as a root or a frame's value) reaches its outcomes
        if let Some(outcomes) = traced.outcomes() {
            for outcome in outcomes {
                self.visit_named_child(*outcome, visitor);
            }
        }

        if traced.is_enumerable() {
            for child in self.named_children(vertex) {
                self.visit_named_child(child, visitor);
            }
        }
    }

    fn sweep_candidates(&self) -> Vec<VertexId> {
        self.collectable_vertices()
    }

    fn release(&mut self, vertex: VertexId) {
        self.remove_from_live_set(vertex)
    }
}
