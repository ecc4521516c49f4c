mod edge;
mod object_graph;
mod reachability;
mod snapshot;
mod vertex;

pub use edge::{Edge, Label};
pub use object_graph::{ObjectGraph, ROOT, STACK};
pub use snapshot::{Snapshot, SnapshotEdge, SnapshotVertex};
pub use vertex::{StackFrame, UnionVertex, ValueVertex, Vertex, VertexFlags};
