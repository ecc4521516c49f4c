use std::borrow::Cow;

use bitflags::bitflags;
use heapscope_gc::VertexId;

use crate::engine::{AbstractValue, ValueId};

use super::edge::Edge;

bitflags! {
    /// Set membership of a vertex.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VertexFlags: u8 {
        /// Part of the live vertex set
        const LIVE = 1 << 0;
        /// Registered during bootstrap
        const BUILTIN = 1 << 1;
    }
}

/// The capabilities of an abstract value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueVertex {
    pub value: ValueId,
    pub class: Option<String>,
    pub name: Option<String>,
    pub enumerable: bool,
}

impl ValueVertex {
    pub fn from_value(value: &AbstractValue) -> ValueVertex {
        ValueVertex {
            value: value.id,
            class: value.class.clone(),
            name: value.name.clone(),
            enumerable: value.enumerable,
        }
    }

    /// A value the engine referenced without announcing it
    pub fn implicit(value: ValueId) -> ValueVertex {
        ValueVertex {
            value,
            class: None,
            name: None,
            enumerable: false,
        }
    }
}

/// A value that may resolve to any of its outcomes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnionVertex {
    pub base: ValueVertex,
    pub outcomes: Vec<VertexId>,
}

/// One pushed interpreter value. Owns its two structural edges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    pub parent: VertexId,
    pub value: VertexId,
    pub parent_edge: Edge,
    pub value_edge: Edge,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Vertex {
    /// The global reachability frontier
    Root,
    /// The base of the stack chain
    Stack,
    Frame(StackFrame),
    Plain(ValueVertex),
    Union(UnionVertex),
}

impl Vertex {
    /// The engine value behind this vertex, if any
    pub fn value(&self) -> Option<&ValueVertex> {
        match self {
            Vertex::Plain(value) => Some(value),
            Vertex::Union(union) => Some(&union.base),
            Vertex::Root | Vertex::Stack | Vertex::Frame(_) => None,
        }
    }

    #[inline]
    pub fn is_frame(&self) -> bool {
        matches!(self, Vertex::Frame(_))
    }

    /// Plain and union values are the only vertices a collection may sweep.
    #[inline]
    pub fn is_heap_value(&self) -> bool {
        matches!(self, Vertex::Plain(_) | Vertex::Union(_))
    }

    /// Outcomes of a union vertex
    pub fn outcomes(&self) -> Option<&[VertexId]> {
        match self {
            Vertex::Union(union) => Some(&union.outcomes),
            _ => None,
        }
    }

    /// Whether the vertex's named children are followed by the reachability walk. The root
    /// always names its children.
    pub fn is_enumerable(&self) -> bool {
        match self {
            Vertex::Root => true,
            Vertex::Plain(value) => value.enumerable,
            Vertex::Union(union) => union.base.enumerable,
            Vertex::Stack | Vertex::Frame(_) => false,
        }
    }

    /// Display label, in order of precedence: stack items, the root, the classification,
    /// the name, and finally `???`.
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Vertex::Stack | Vertex::Frame(_) => Cow::Borrowed("Stack Item"),
            Vertex::Root => Cow::Borrowed("Root"),
            Vertex::Plain(value) | Vertex::Union(UnionVertex { base: value, .. }) => {
                match (&value.class, &value.name) {
                    (Some(class), _) => Cow::Borrowed(class.as_str()),
                    (None, Some(name)) => Cow::Owned(format!("name: {name}")),
                    (None, None) => Cow::Borrowed("???"),
                }
            }
        }
    }
}
