//! Mark colors and collection phases

/// The colors a vertex moves through during marking.
///
/// Vertices that were never reached have no entry in the collector's color table and are
/// treated as white.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GcColor {
    /// White: Not yet visited, will be swept if still white after marking
    White = 0,
    /// Gray: Visited but children not yet traced
    Gray = 1,
    /// Black: Visited and all children traced, or pinned without tracing
    Black = 2,
}

impl Default for GcColor {
    fn default() -> Self {
        GcColor::White
    }
}

/// Collection phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectPhase {
    /// No collection in progress
    Idle,
    /// Scanning the root and the stack chain
    RootScanning,
    /// Tracing gray vertices
    Marking,
    /// Releasing unmarked vertices
    Sweeping,
}

impl Default for CollectPhase {
    fn default() -> Self {
        CollectPhase::Idle
    }
}
