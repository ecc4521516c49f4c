use std::fmt;

use heapscope_gc::VertexId;

/// Label of a directed edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// A named property of the source value
    Property(String),
    /// Union to outcome, keyed by the outcome's position in the union
    Maybe(u32),
    /// Stack frame to its parent frame or the stack sentinel
    StackParent,
    /// Stack frame to the value it wraps
    StackValue,
}

impl Label {
    pub fn property(name: &str) -> Label {
        Label::Property(name.to_owned())
    }

    #[inline]
    pub fn is_property(&self) -> bool {
        matches!(self, Label::Property(_))
    }

    /// Structural stack edges are owned by their frame rather than the label index.
    #[inline]
    pub fn is_structural(&self) -> bool {
        matches!(self, Label::StackParent | Label::StackValue)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Property(name) => f.write_str(name),
            Label::Maybe(_) => f.write_str("maybe"),
            Label::StackParent => f.write_str("parent"),
            Label::StackValue => f.write_str("value"),
        }
    }
}

/// A directed, labelled edge between two vertices.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub label: Label,
}

impl Edge {
    #[inline]
    pub fn new(from: VertexId, to: VertexId, label: Label) -> Edge {
        Edge { from, to, label }
    }
}
