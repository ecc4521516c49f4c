//! Stable vertex handles
//!
//! `VertexId` addresses a vertex in the graph's arena. Handles are plain indices, so the
//! collector can track them in hash sets without borrowing the graph.

/// A handle to a vertex in the graph's arena.
///
/// Handles stay valid for the lifetime of the vertex they were issued for. The graph may
/// recycle the slot of a destroyed vertex, so a handle must not be kept past that point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VertexId(u32);

impl VertexId {
    /// Create a handle from a raw arena index
    #[inline]
    pub const fn from_index(index: u32) -> VertexId {
        VertexId(index)
    }

    /// The arena index this handle refers to
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The raw handle value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for VertexId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

impl core::fmt::Display for VertexId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
