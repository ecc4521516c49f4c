//! Collector - mark-sweep reachability over an abstract object graph
//!
//! Design:
//! - Keeps a color table keyed by vertex handle, absent entries are white
//! - Root scanning pins structural vertices and grays the values they reach
//! - Marking traces gray vertices through the context until the gray queue drains
//! - Sweeping releases every unmarked sweep candidate
//!
//! The graph provides:
//! - `GcContext::visit_roots` - enumerate roots
//! - `GcContext::trace_vertex` - enumerate the children of a vertex
//! - `GcContext::sweep_candidates` / `GcContext::release` - the sweepable set

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{
    color::{CollectPhase, GcColor},
    gray_queue::GrayQueue,
    visitor::{GcContext, GcVisitor},
    VertexId,
};

/// Default number of vertices to process per collection step
const DEFAULT_MARK_STEP_SIZE: usize = 100;
const DEFAULT_SWEEP_STEP_SIZE: usize = 100;

/// Counters for a single collection cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Number of vertices marked (gray or black) by the end of marking
    pub marked: usize,
    /// Number of vertices released by the sweep
    pub swept: usize,
    /// Largest number of vertices waiting in the gray queue at once
    pub max_gray: usize,
}

/// The mark-sweep collector
pub struct Collector {
    /// Mark colors for the current cycle. Unreached vertices have no entry.
    colors: HashMap<VertexId, GcColor>,

    /// Gray queue for marking phase
    gray_queue: GrayQueue,

    /// Current collection phase
    phase: CollectPhase,

    /// For incremental sweeping: the candidates and the current position
    sweep_list: Vec<VertexId>,
    sweep_cursor: usize,

    /// Vertices released during the current cycle
    removed: Vec<VertexId>,

    /// Stats for the most recently completed cycle
    last_stats: CollectStats,

    /// Number of completed cycles
    cycles: usize,
}

impl Collector {
    /// Create a new idle collector
    pub fn new() -> Collector {
        Collector {
            colors: HashMap::new(),
            gray_queue: GrayQueue::new(),
            phase: CollectPhase::Idle,
            sweep_list: Vec::new(),
            sweep_cursor: 0,
            removed: Vec::new(),
            last_stats: CollectStats::default(),
            cycles: 0,
        }
    }

    /// Get current collection phase
    #[inline]
    pub fn phase(&self) -> CollectPhase {
        self.phase
    }

    /// Check if a collection is in progress
    #[inline]
    pub fn in_progress(&self) -> bool {
        self.phase != CollectPhase::Idle
    }

    /// Stats of the most recently completed cycle
    #[inline]
    pub fn last_stats(&self) -> CollectStats {
        self.last_stats
    }

    /// Number of completed cycles
    #[inline]
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Whether a vertex was marked during the current or most recent cycle
    #[inline]
    pub fn is_marked(&self, vertex: VertexId) -> bool {
        self.color(vertex) != GcColor::White
    }

    /// Mark color of a vertex in the current or most recent cycle
    #[inline]
    pub fn color(&self, vertex: VertexId) -> GcColor {
        self.colors.get(&vertex).copied().unwrap_or(GcColor::White)
    }

    /// Number of reached vertices still waiting to be traced
    #[inline]
    pub fn pending(&self) -> usize {
        self.gray_queue.len()
    }

    /// Run a full collection synchronously, returning the released vertices.
    pub fn collect(&mut self, ctx: &mut impl GcContext) -> Vec<VertexId> {
        self.start(ctx);
        self.finish(ctx);
        self.take_removed()
    }

    // ========================================================================
    // Incremental API
    // ========================================================================

    /// Start a collection cycle
    ///
    /// Clears the marks of the previous cycle and scans roots.
    /// After calling this, use `step()` to advance the collection,
    /// or call `finish()` to complete synchronously.
    pub fn start(&mut self, ctx: &mut impl GcContext) {
        if self.in_progress() {
            return;
        }

        self.phase = CollectPhase::RootScanning;
        self.colors.clear();
        self.gray_queue.reset();
        self.removed.clear();

        {
            let mut marker = Marker {
                colors: &mut self.colors,
                gray_queue: &mut self.gray_queue,
            };
            ctx.visit_roots(&mut marker);
        }

        self.phase = CollectPhase::Marking;
    }

    /// Advance the collection by one step
    ///
    /// Returns true if the collection is still in progress, false if complete.
    pub fn step(&mut self, ctx: &mut impl GcContext) -> bool {
        match self.phase {
            CollectPhase::Idle => false,
            CollectPhase::RootScanning => {
                // Root scanning completes in start
                self.phase = CollectPhase::Marking;
                true
            }
            CollectPhase::Marking => {
                self.mark_step(ctx, DEFAULT_MARK_STEP_SIZE);
                true
            }
            CollectPhase::Sweeping => {
                self.sweep_step(ctx, DEFAULT_SWEEP_STEP_SIZE);
                self.phase != CollectPhase::Idle
            }
        }
    }

    /// Complete the collection synchronously
    ///
    /// Returns the number of steps executed.
    pub fn finish(&mut self, ctx: &mut impl GcContext) -> usize {
        let mut steps = 0;
        loop {
            let in_progress = self.step(ctx);
            steps += 1;
            if !in_progress {
                break;
            }
        }
        steps
    }

    /// Take the vertices released so far in this cycle
    pub fn take_removed(&mut self) -> Vec<VertexId> {
        core::mem::take(&mut self.removed)
    }

    /// Perform incremental marking
    ///
    /// Traces up to `work_limit` gray vertices.
    fn mark_step(&mut self, ctx: &mut impl GcContext, work_limit: usize) {
        let mut work_done = 0;

        while work_done < work_limit {
            match self.gray_queue.pop() {
                Some(vertex) => {
                    self.colors.insert(vertex, GcColor::Black);

                    let mut marker = Marker {
                        colors: &mut self.colors,
                        gray_queue: &mut self.gray_queue,
                    };
                    ctx.trace_vertex(vertex, &mut marker);

                    work_done += 1;
                }
                None => {
                    // No more gray vertices - marking complete
                    self.sweep_list = ctx.sweep_candidates();
                    self.sweep_cursor = 0;
                    self.phase = CollectPhase::Sweeping;
                    return;
                }
            }
        }
    }

    /// Perform incremental sweeping
    ///
    /// Processes up to `work_limit` candidates.
    fn sweep_step(&mut self, ctx: &mut impl GcContext, work_limit: usize) {
        let end = (self.sweep_cursor + work_limit).min(self.sweep_list.len());

        for i in self.sweep_cursor..end {
            let vertex = self.sweep_list[i];
            if !self.colors.contains_key(&vertex) {
                ctx.release(vertex);
                self.removed.push(vertex);
            }
        }

        self.sweep_cursor = end;
        if self.sweep_cursor == self.sweep_list.len() {
            self.finish_sweep();
        }
    }

    /// Finish sweeping and reset state
    fn finish_sweep(&mut self) {
        self.last_stats = CollectStats {
            marked: self.colors.len(),
            swept: self.removed.len(),
            max_gray: self.gray_queue.high_water(),
        };
        self.cycles += 1;

        self.phase = CollectPhase::Idle;
        self.sweep_list.clear();
        self.sweep_cursor = 0;
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Marker - implements GcVisitor for the marking phase
// ============================================================================

/// A marker that implements `GcVisitor` for use during collection.
///
/// Holds mutable references to the color table and gray queue and is used during root
/// scanning and vertex tracing to mark reachable vertices.
pub struct Marker<'a> {
    colors: &'a mut HashMap<VertexId, GcColor>,
    gray_queue: &'a mut GrayQueue,
}

impl<'a> GcVisitor for Marker<'a> {
    fn visit(&mut self, vertex: VertexId) {
        if !self.colors.contains_key(&vertex) {
            self.colors.insert(vertex, GcColor::Gray);
            self.gray_queue.push(vertex);
        }
    }

    fn pin(&mut self, vertex: VertexId) {
        self.colors.entry(vertex).or_insert(GcColor::Black);
    }
}
