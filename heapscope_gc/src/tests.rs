//! Collector Tests
//!
//! Tests for common reachability scenarios: unreachable values, cycles, pinned structural
//! vertices and incremental stepping.

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::visitor::{GcContext, GcVisitor};
use crate::{CollectPhase, Collector, GcColor, VertexId};

fn v(index: u32) -> VertexId {
    VertexId::from_index(index)
}

/// Simple test context implementing GcContext.
/// Children are stored as an adjacency map; `pinned` vertices are structural and never swept.
struct TestContext {
    roots: Vec<VertexId>,
    pinned: Vec<VertexId>,
    children: HashMap<VertexId, Vec<VertexId>>,
    live: HashSet<VertexId>,
}

impl TestContext {
    fn new() -> Self {
        TestContext {
            roots: Vec::new(),
            pinned: Vec::new(),
            children: HashMap::new(),
            live: HashSet::new(),
        }
    }

    fn add_vertices(&mut self, count: u32) {
        for i in 0..count {
            self.live.insert(v(i));
        }
    }

    fn link(&mut self, from: VertexId, to: VertexId) {
        self.children.entry(from).or_default().push(to);
    }

    fn add_root(&mut self, vertex: VertexId) {
        self.roots.push(vertex);
    }
}

impl GcContext for TestContext {
    fn visit_roots(&self, visitor: &mut impl GcVisitor) {
        for root in &self.roots {
            visitor.visit(*root);
        }
        for pinned in &self.pinned {
            visitor.pin(*pinned);
        }
    }

    fn trace_vertex(&self, vertex: VertexId, visitor: &mut impl GcVisitor) {
        if let Some(children) = self.children.get(&vertex) {
            visitor.visit_all(children);
        }
    }

    fn sweep_candidates(&self) -> Vec<VertexId> {
        let mut candidates: Vec<VertexId> = self
            .live
            .iter()
            .copied()
            .filter(|vertex| !self.pinned.contains(vertex))
            .collect();
        candidates.sort();
        candidates
    }

    fn release(&mut self, vertex: VertexId) {
        self.live.remove(&vertex);
    }
}

// ============================================================================
// Basic collection tests
// ============================================================================

#[test]
fn test_collect_unreachable() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(10);

    // No roots - everything should be swept
    let removed = collector.collect(&mut ctx);

    assert_eq!(removed.len(), 10);
    assert!(ctx.live.is_empty());
    assert_eq!(collector.last_stats().swept, 10);
    assert_eq!(collector.last_stats().marked, 0);
    assert_eq!(collector.phase(), CollectPhase::Idle);
}

#[test]
fn test_collect_rooted() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(11);
    ctx.add_root(v(0));

    let removed = collector.collect(&mut ctx);

    assert_eq!(removed.len(), 10);
    assert!(ctx.live.contains(&v(0)));
    assert!(collector.is_marked(v(0)));
    assert!(!collector.is_marked(v(5)));
}

#[test]
fn test_finish_step_count() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(10);
    ctx.add_root(v(0));

    collector.start(&mut ctx);
    assert_eq!(collector.phase(), CollectPhase::Marking);
    let steps = collector.finish(&mut ctx);

    // Steps: 1 (marking: 1 root, then empty -> Sweeping) + 1 (sweeping: 9 vertices -> Idle)
    assert_eq!(steps, 2, "small collection should take 2 steps");
    assert_eq!(collector.take_removed().len(), 9);
}

#[test]
fn test_large_graph_takes_several_steps() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(250);
    ctx.add_root(v(0));
    for i in 1..250 {
        ctx.link(v(0), v(i));
    }

    collector.start(&mut ctx);
    let steps = collector.finish(&mut ctx);

    // Marking: 250 gray vertices at 100 per step, draining on the third step.
    // Sweeping: 250 candidates at 100 per step.
    assert_eq!(steps, 6);
    assert!(collector.take_removed().is_empty());
    assert_eq!(ctx.live.len(), 250);
}

#[test]
fn test_gray_queue_high_water() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(6);
    ctx.add_root(v(0));
    for i in 1..6 {
        ctx.link(v(0), v(i));
    }

    collector.start(&mut ctx);
    assert_eq!(collector.pending(), 1);
    collector.finish(&mut ctx);

    assert_eq!(collector.pending(), 0);
    assert_eq!(collector.last_stats().max_gray, 5);
}

// ============================================================================
// Linked structure tests
// ============================================================================

#[test]
fn test_linked_list_reachable() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(4);
    ctx.link(v(0), v(1));
    ctx.link(v(1), v(2));
    ctx.link(v(2), v(3));
    ctx.add_root(v(0));

    let removed = collector.collect(&mut ctx);

    assert!(removed.is_empty());
    assert_eq!(ctx.live.len(), 4);
    assert_eq!(collector.color(v(3)), GcColor::Black);
}

#[test]
fn test_partial_list_unreachable() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(3);
    ctx.link(v(0), v(1));
    ctx.add_root(v(0));

    let removed = collector.collect(&mut ctx);

    // v2 was never linked
    assert_eq!(removed, vec![v(2)]);
    assert_eq!(ctx.live.len(), 2);
}

// ============================================================================
// Cycle tests
// ============================================================================

#[test]
fn test_simple_cycle_collected() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(2);
    ctx.link(v(0), v(1));
    ctx.link(v(1), v(0));

    let removed = collector.collect(&mut ctx);

    assert_eq!(removed.len(), 2);
    assert!(ctx.live.is_empty());
}

#[test]
fn test_self_reference_collected() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(1);
    ctx.link(v(0), v(0));

    let removed = collector.collect(&mut ctx);

    assert_eq!(removed, vec![v(0)]);
}

#[test]
fn test_rooted_cycle_survives() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(3);
    ctx.link(v(0), v(1));
    ctx.link(v(1), v(2));
    ctx.link(v(2), v(0));
    ctx.add_root(v(1));

    let removed = collector.collect(&mut ctx);

    assert!(removed.is_empty());
    assert_eq!(collector.last_stats().marked, 3);
}

// ============================================================================
// Pinning tests
// ============================================================================

#[test]
fn test_pinned_vertex_is_not_traced() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(3);
    ctx.pinned.push(v(0));
    // Edges out of a pinned vertex are not part of the walk
    ctx.link(v(0), v(1));
    ctx.add_root(v(2));

    let removed = collector.collect(&mut ctx);

    assert_eq!(removed, vec![v(1)]);
    assert!(collector.is_marked(v(0)));
    assert!(ctx.live.contains(&v(0)));
}

#[test]
fn test_pinned_then_visited_keeps_black() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(2);
    ctx.pinned.push(v(0));
    ctx.add_root(v(1));
    ctx.link(v(1), v(0));

    collector.collect(&mut ctx);

    assert_eq!(collector.color(v(0)), GcColor::Black);
    assert_eq!(collector.color(v(1)), GcColor::Black);
}

#[test]
fn test_marks_reset_between_cycles() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(2);
    ctx.add_root(v(0));
    ctx.link(v(0), v(1));

    assert!(collector.collect(&mut ctx).is_empty());
    assert!(collector.is_marked(v(1)));

    // Drop the only reference and collect again
    ctx.children.clear();
    let removed = collector.collect(&mut ctx);

    assert_eq!(removed, vec![v(1)]);
    assert!(!collector.is_marked(v(1)));
    assert_eq!(collector.cycles(), 2);
}

#[test]
fn test_start_is_ignored_while_in_progress() {
    let mut collector = Collector::new();
    let mut ctx = TestContext::new();
    ctx.add_vertices(2);
    ctx.add_root(v(0));

    collector.start(&mut ctx);
    assert!(collector.in_progress());
    collector.start(&mut ctx);
    assert_eq!(collector.phase(), CollectPhase::Marking);

    collector.finish(&mut ctx);
    assert!(!collector.in_progress());
    assert_eq!(collector.take_removed(), vec![v(1)]);
}
