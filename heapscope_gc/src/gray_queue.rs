//! Gray queue
//!
//! Vertices that were reached but whose children have not been traced yet. They are traced in
//! the order they were reached, so marking proceeds breadth first from the roots.

use alloc::collections::VecDeque;

use crate::VertexId;

pub struct GrayQueue {
    pending: VecDeque<VertexId>,

    /// Largest number of vertices pending at once since the last reset
    high_water: usize,
}

impl GrayQueue {
    pub fn new() -> GrayQueue {
        GrayQueue {
            pending: VecDeque::new(),
            high_water: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    #[inline]
    pub fn push(&mut self, vertex: VertexId) {
        self.pending.push_back(vertex);
        self.high_water = self.high_water.max(self.pending.len());
    }

    #[inline]
    pub fn pop(&mut self) -> Option<VertexId> {
        self.pending.pop_front()
    }

    /// Drop all pending vertices and start a new high water mark
    pub fn reset(&mut self) {
        self.pending.clear();
        self.high_water = 0;
    }
}

impl Default for GrayQueue {
    fn default() -> Self {
        Self::new()
    }
}
