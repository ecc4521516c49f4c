use serde::{Deserialize, Serialize};

/// A vertex as seen by snapshot consumers.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotVertex {
    pub id: u32,
    pub label: String,
}

/// A `(from, to, label)` edge as seen by snapshot consumers.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotEdge(pub u32, pub u32, pub String);

impl SnapshotEdge {
    #[inline]
    pub fn source(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn target(&self) -> u32 {
        self.1
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.2
    }
}

/// A point-in-time view of the live graph.
///
/// `builtins` and `root` are only present on the terminal snapshot of a session. Edges may
/// reference vertices that a collection removed from the live set; `visible_edges` skips them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub vertices: Vec<SnapshotVertex>,
    pub edges: Vec<SnapshotEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtins: Option<Vec<SnapshotVertex>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<SnapshotVertex>,
}

impl Snapshot {
    /// Whether this is the terminal snapshot of a session
    pub fn is_final(&self) -> bool {
        self.builtins.is_some()
    }

    pub fn contains_vertex(&self, id: u32) -> bool {
        // Vertices are sorted by id
        self.vertices
            .binary_search_by_key(&id, |vertex| vertex.id)
            .is_ok()
    }

    pub fn vertex(&self, id: u32) -> Option<&SnapshotVertex> {
        let index = self
            .vertices
            .binary_search_by_key(&id, |vertex| vertex.id)
            .ok()?;
        self.vertices.get(index)
    }

    /// Vertices carrying exactly `label`
    pub fn vertices_labelled<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a SnapshotVertex> + 'a {
        self.vertices
            .iter()
            .filter(move |vertex| vertex.label == label)
    }

    /// Edges whose endpoints are both present in the snapshot
    pub fn visible_edges(&self) -> impl Iterator<Item = &SnapshotEdge> + '_ {
        self.edges.iter().filter(move |edge| {
            self.contains_vertex(edge.source()) && self.contains_vertex(edge.target())
        })
    }

    /// Edges leaving `from`
    pub fn edges_from(&self, from: u32) -> impl Iterator<Item = &SnapshotEdge> + '_ {
        self.edges.iter().filter(move |edge| edge.source() == from)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
