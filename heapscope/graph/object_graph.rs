//! ObjectGraph - the live abstract object graph
//!
//! Design:
//! - Vertices live in an arena addressed by `VertexId`; popped frames recycle their slots
//! - Engine values are mapped to vertices by `ValueId`
//! - Set membership (live, builtin) is kept as per-vertex flags
//! - Property and maybe edges are installed through a per-vertex label index, so a vertex
//!   has at most one outgoing edge per label
//! - Stack edges are owned by their frame and never enter the label index

use std::mem;

use hashbrown::{HashMap, HashSet};
use heapscope_gc::{Collector, VertexId};
use tracing::{debug, trace};

use crate::{
    engine::{AbstractValue, EngineHooks, HookResult, ValueId},
    error::GraphError,
};

use super::{
    edge::{Edge, Label},
    snapshot::{Snapshot, SnapshotEdge, SnapshotVertex},
    vertex::{StackFrame, UnionVertex, ValueVertex, Vertex, VertexFlags},
};

/// The root sentinel
pub const ROOT: VertexId = VertexId::from_index(0);

/// The stack sentinel
pub const STACK: VertexId = VertexId::from_index(1);

struct Slot {
    vertex: Vertex,
    flags: VertexFlags,
}

pub struct ObjectGraph {
    /// Vertex arena. `None` marks a recycled frame slot.
    slots: Vec<Option<Slot>>,
    free_slots: Vec<VertexId>,

    /// Vertex of each engine value
    values: HashMap<ValueId, VertexId>,

    edges: HashSet<Edge>,

    /// Outgoing property and maybe edges of each vertex, by label
    index: HashMap<VertexId, HashMap<Label, VertexId>>,

    stack_top: VertexId,
    stack_depth: usize,

    /// Root scope value reported by the engine, walked as an additional root
    global: Option<VertexId>,

    bootstrapping: bool,

    /// Whether the graph changed since the last taken snapshot
    changed: bool,

    /// Whether the graph changed since the last collection. Snapshots leave it set.
    mutated: bool,

    /// Whether a call boundary was reported since the last collection
    collection_due: bool,

    collector: Collector,
}

impl ObjectGraph {
    pub fn new() -> ObjectGraph {
        let sentinel = |vertex| {
            Some(Slot {
                vertex,
                flags: VertexFlags::LIVE,
            })
        };

        ObjectGraph {
            slots: vec![sentinel(Vertex::Root), sentinel(Vertex::Stack)],
            free_slots: Vec::new(),
            values: HashMap::new(),
            edges: HashSet::new(),
            index: HashMap::new(),
            stack_top: STACK,
            stack_depth: 0,
            global: None,
            bootstrapping: false,
            changed: false,
            mutated: false,
            collection_due: false,
            collector: Collector::new(),
        }
    }

    // ========================================================================
    // Phases and flags
    // ========================================================================

    /// Enter the bootstrap phase. Values created until `end_bootstrap` are builtins.
    pub fn begin_bootstrap(&mut self) {
        self.bootstrapping = true;
    }

    pub fn end_bootstrap(&mut self) {
        self.bootstrapping = false;
    }

    #[inline]
    pub fn is_bootstrapping(&self) -> bool {
        self.bootstrapping
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.changed
    }

    /// Whether an event changed the graph since the last collection
    #[inline]
    pub fn changed_since_collection(&self) -> bool {
        self.mutated
    }

    /// Whether a collection should run at the next batch boundary
    #[inline]
    pub fn collection_due(&self) -> bool {
        self.collection_due
    }

    /// Register the engine's root prototype collection as builtins. Values already known
    /// keep their current membership and gain the builtin flag.
    pub fn register_builtins(&mut self, builtins: &[ValueId]) {
        for value in builtins {
            let vertex = match self.values.get(value) {
                Some(vertex) => *vertex,
                None => {
                    let vertex = Vertex::Plain(ValueVertex::implicit(*value));
                    self.alloc_value(*value, vertex, VertexFlags::empty())
                }
            };
            self.insert_flags(vertex, VertexFlags::BUILTIN);
        }
    }

    /// Set the root scope value walked as an additional root by collections.
    pub fn set_global(&mut self, global: Option<ValueId>) {
        let global = global.map(|value| self.resolve(Some(value)));
        self.global = global;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn vertex(&self, vertex: VertexId) -> Option<&Vertex> {
        self.slot(vertex).map(|slot| &slot.vertex)
    }

    /// The vertex registered for an engine value
    pub fn vertex_for(&self, value: ValueId) -> Option<VertexId> {
        self.values.get(&value).copied()
    }

    pub fn is_live(&self, vertex: VertexId) -> bool {
        self.has_flags(vertex, VertexFlags::LIVE)
    }

    pub fn is_builtin(&self, vertex: VertexId) -> bool {
        self.has_flags(vertex, VertexFlags::BUILTIN)
    }

    /// Display label of a vertex
    pub fn label(&self, vertex: VertexId) -> Option<String> {
        self.vertex(vertex).map(|vertex| vertex.label().into_owned())
    }

    /// Live vertices in handle order
    pub fn live_vertices(&self) -> Vec<VertexId> {
        self.vertices_with(VertexFlags::LIVE)
    }

    /// Builtin vertices in handle order, whether surfaced or not
    pub fn builtins(&self) -> Vec<VertexId> {
        self.vertices_with(VertexFlags::BUILTIN)
    }

    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.flags.contains(VertexFlags::LIVE))
            .count()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Target of the edge installed from `from` under `label`
    pub fn outgoing(&self, from: VertexId, label: &Label) -> Option<VertexId> {
        self.index.get(&from)?.get(label).copied()
    }

    /// Number of frames on the stack chain
    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    #[inline]
    pub fn stack_top(&self) -> VertexId {
        self.stack_top
    }

    /// Frames from the top of the stack down to (excluding) the stack sentinel
    pub fn frames(&self) -> Vec<(VertexId, &StackFrame)> {
        let mut frames = Vec::with_capacity(self.stack_depth);
        let mut current = self.stack_top;
        while let Some(Vertex::Frame(frame)) = self.vertex(current) {
            frames.push((current, frame));
            current = frame.parent;
        }
        frames
    }

    pub(super) fn global(&self) -> Option<VertexId> {
        self.global
    }

    /// Children named by a vertex's property edges
    pub(super) fn named_children(&self, vertex: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.index
            .get(&vertex)
            .into_iter()
            .flat_map(|labels| labels.iter())
            .filter(|(label, _)| label.is_property())
            .map(|(_, child)| *child)
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Run a reachability collection from the root and the current stack chain, returning
    /// the vertices removed from the live set.
    ///
    /// Edges that point at removed vertices are left in place.
    pub fn collect(&mut self) -> Vec<VertexId> {
        let mut collector = mem::take(&mut self.collector);
        let removed = collector.collect(self);
        let stats = collector.last_stats();
        self.collector = collector;

        self.collection_due = false;
        self.mutated = false;
        if !removed.is_empty() {
            self.changed = true;
        }

        debug!(
            marked = stats.marked,
            swept = stats.swept,
            max_gray = stats.max_gray,
            live = self.live_count(),
            "collected object graph"
        );

        removed
    }

    /// Number of collections run so far
    pub fn collections(&self) -> usize {
        self.collector.cycles()
    }

    pub(super) fn remove_from_live_set(&mut self, vertex: VertexId) {
        if let Some(slot) = self.slot_mut(vertex) {
            slot.flags.remove(VertexFlags::LIVE);
        }
    }

    pub(super) fn collectable_vertices(&self) -> Vec<VertexId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let slot = slot.as_ref()?;
                let candidate =
                    slot.flags.contains(VertexFlags::LIVE) && slot.vertex.is_heap_value();
                candidate.then(|| VertexId::from_index(index as u32))
            })
            .collect()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Snapshot of the live vertices and all edges
    pub fn snapshot(&self) -> Snapshot {
        let vertices = self
            .live_vertices()
            .into_iter()
            .filter_map(|vertex| self.snapshot_vertex(vertex))
            .collect();

        let mut edges: Vec<SnapshotEdge> = self
            .edges
            .iter()
            .map(|edge| SnapshotEdge(edge.from.as_u32(), edge.to.as_u32(), edge.label.to_string()))
            .collect();
        edges.sort();

        Snapshot {
            vertices,
            edges,
            builtins: None,
            root: None,
        }
    }

    /// Snapshot of the current state, clearing the changed flag
    pub fn take_snapshot(&mut self) -> Snapshot {
        self.changed = false;
        self.snapshot()
    }

    /// Terminal snapshot, carrying the full builtins set and the root
    pub fn final_snapshot(&self) -> Snapshot {
        let mut snapshot = self.snapshot();
        snapshot.builtins = Some(
            self.builtins()
                .into_iter()
                .filter_map(|vertex| self.snapshot_vertex(vertex))
                .collect(),
        );
        snapshot.root = self.snapshot_vertex(ROOT);
        snapshot
    }

    fn snapshot_vertex(&self, vertex: VertexId) -> Option<SnapshotVertex> {
        let label = self.label(vertex)?;
        Some(SnapshotVertex {
            id: vertex.as_u32(),
            label,
        })
    }

    // ========================================================================
    // Arena
    // ========================================================================

    fn slot(&self, vertex: VertexId) -> Option<&Slot> {
        self.slots.get(vertex.index())?.as_ref()
    }

    fn slot_mut(&mut self, vertex: VertexId) -> Option<&mut Slot> {
        self.slots.get_mut(vertex.index())?.as_mut()
    }

    fn has_flags(&self, vertex: VertexId, flags: VertexFlags) -> bool {
        self.slot(vertex)
            .map_or(false, |slot| slot.flags.contains(flags))
    }

    fn insert_flags(&mut self, vertex: VertexId, flags: VertexFlags) {
        if let Some(slot) = self.slot_mut(vertex) {
            slot.flags.insert(flags);
        }
    }

    fn vertices_with(&self, flags: VertexFlags) -> Vec<VertexId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let slot = slot.as_ref()?;
                slot.flags
                    .contains(flags)
                    .then(|| VertexId::from_index(index as u32))
            })
            .collect()
    }

    /// Allocate a frame vertex, reusing a recycled slot if one is available. The vertex is
    /// built from the handle it will be stored under.
    fn alloc_frame(&mut self, build: impl FnOnce(VertexId) -> StackFrame) -> VertexId {
        let id = match self.free_slots.pop() {
            Some(id) => id,
            None => {
                self.slots.push(None);
                VertexId::from_index((self.slots.len() - 1) as u32)
            }
        };

        self.slots[id.index()] = Some(Slot {
            vertex: Vertex::Frame(build(id)),
            flags: VertexFlags::LIVE,
        });
        id
    }

    /// Allocate a vertex for an engine value. Value slots are never recycled.
    fn alloc_value(&mut self, value: ValueId, vertex: Vertex, flags: VertexFlags) -> VertexId {
        let id = VertexId::from_index(self.slots.len() as u32);
        self.slots.push(Some(Slot { vertex, flags }));
        self.values.insert(value, id);
        id
    }

    fn free(&mut self, vertex: VertexId) {
        if let Some(slot) = self.slots.get_mut(vertex.index()) {
            *slot = None;
            self.free_slots.push(vertex);
        }
    }

    /// Membership of a vertex registered in the current phase
    fn registration_flags(&self) -> VertexFlags {
        if self.bootstrapping {
            VertexFlags::BUILTIN
        } else {
            VertexFlags::LIVE
        }
    }

    fn mark_changed(&mut self) {
        self.changed = true;
        self.mutated = true;
    }

    /// Make a vertex part of the live set, along with every hidden builtin reachable from it
    /// through named children and union outcomes.
    fn surface(&mut self, vertex: VertexId) {
        let mut pending = vec![vertex];
        while let Some(next) = pending.pop() {
            if !self.is_live(next) {
                trace!(vertex = %next, "surfacing vertex");
                self.insert_flags(next, VertexFlags::LIVE);
            }

            if let Some(labels) = self.index.get(&next) {
                pending.extend(
                    labels
                        .values()
                        .copied()
                        .filter(|child| self.is_builtin(*child) && !self.is_live(*child)),
                );
            }
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a value and, for unions, each of its outcomes.
    fn register(&mut self, value: &AbstractValue) -> VertexId {
        let base = ValueVertex::from_value(value);
        let vertex = if value.is_union() {
            Vertex::Union(UnionVertex {
                base,
                outcomes: Vec::new(),
            })
        } else {
            Vertex::Plain(base)
        };

        let id = match self.values.get(&value.id).copied() {
            // Announced again: refresh its capabilities, keep its membership
            Some(existing) => {
                self.retire_maybe_edges(existing);
                if let Some(slot) = self.slot_mut(existing) {
                    slot.vertex = vertex;
                }
                existing
            }
            None => {
                let flags = self.registration_flags();
                self.alloc_value(value.id, vertex, flags)
            }
        };

        if let Some(outcomes) = &value.outcomes {
            let mut outcome_ids = Vec::with_capacity(outcomes.len());
            for (position, outcome) in outcomes.iter().enumerate() {
                let outcome_id = self.register(outcome);
                self.install(Edge::new(id, outcome_id, Label::Maybe(position as u32)));
                outcome_ids.push(outcome_id);
            }

            if let Some(Slot {
                vertex: Vertex::Union(union),
                ..
            }) = self.slot_mut(id)
            {
                union.outcomes = outcome_ids;
            }
        }

        id
    }

    /// Vertex for an event endpoint. An absent endpoint is the root; a value the engine never
    /// announced is registered without capabilities.
    fn resolve(&mut self, value: Option<ValueId>) -> VertexId {
        let value = match value {
            Some(value) => value,
            None => return ROOT,
        };

        if let Some(vertex) = self.values.get(&value) {
            return *vertex;
        }

        debug!(value = value.0, "implicitly registering unannounced value");
        let flags = self.registration_flags();
        self.alloc_value(value, Vertex::Plain(ValueVertex::implicit(value)), flags)
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Install an edge in the edge set and the label index, retiring the edge previously
    /// installed under the same source and label.
    fn install(&mut self, edge: Edge) {
        let labels = self.index.entry(edge.from).or_default();
        if let Some(prior) = labels.insert(edge.label.clone(), edge.to) {
            self.edges
                .remove(&Edge::new(edge.from, prior, edge.label.clone()));
        }
        self.edges.insert(edge);
    }

    /// Remove the edge installed from `from` under `label`
    fn retire(&mut self, from: VertexId, label: &Label) -> Option<Edge> {
        let to = self.index.get_mut(&from)?.remove(label)?;
        let edge = Edge::new(from, to, label.clone());
        self.edges.remove(&edge);
        Some(edge)
    }

    fn retire_maybe_edges(&mut self, union: VertexId) {
        let positions = match self.vertex(union).and_then(Vertex::outcomes) {
            Some(outcomes) => outcomes.len(),
            None => return,
        };
        for position in 0..positions {
            self.retire(union, &Label::Maybe(position as u32));
        }
    }
}

impl Default for ObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHooks for ObjectGraph {
    fn on_value_created(&mut self, value: &AbstractValue) -> HookResult {
        let vertex = self.register(value);
        trace!(%vertex, value = value.id.0, bootstrap = self.bootstrapping, "value created");

        self.mark_changed();
        Ok(())
    }

    fn on_push(&mut self, value: ValueId) -> HookResult {
        let value_vertex = self.resolve(Some(value));
        if !self.bootstrapping && self.is_builtin(value_vertex) {
            self.surface(value_vertex);
        }

        let parent = self.stack_top;
        let frame_id = self.alloc_frame(|frame_id| StackFrame {
            parent,
            value: value_vertex,
            parent_edge: Edge::new(frame_id, parent, Label::StackParent),
            value_edge: Edge::new(frame_id, value_vertex, Label::StackValue),
        });

        self.edges.insert(Edge::new(frame_id, parent, Label::StackParent));
        self.edges.insert(Edge::new(frame_id, value_vertex, Label::StackValue));

        self.stack_top = frame_id;
        self.stack_depth += 1;
        trace!(frame = %frame_id, depth = self.stack_depth, "pushed frame");

        self.mark_changed();
        Ok(())
    }

    fn on_pop(&mut self, value: ValueId) -> HookResult {
        let top = self.stack_top;
        let frame = match self.vertex(top) {
            Some(Vertex::Frame(frame)) => frame.clone(),
            _ => return Err(GraphError::StackUnderflow),
        };

        if self.vertex_for(value) != Some(frame.value) {
            debug!(value = value.0, frame = %top, "popped value does not match the top frame");
        }

        self.edges.remove(&frame.parent_edge);
        self.edges.remove(&frame.value_edge);
        self.free(top);

        self.stack_top = frame.parent;
        self.stack_depth -= 1;
        trace!(frame = %top, depth = self.stack_depth, "popped frame");

        self.mark_changed();
        Ok(())
    }

    fn on_link(&mut self, from: Option<ValueId>, to: Option<ValueId>, label: &str) -> HookResult {
        let from = self.resolve(from);
        let to = self.resolve(to);

        let surface = if self.bootstrapping {
            from == ROOT || to == ROOT
        } else {
            self.is_builtin(from) || self.is_builtin(to)
        };
        if surface {
            self.surface(from);
            self.surface(to);
        }

        self.install(Edge::new(from, to, Label::property(label)));

        self.mark_changed();
        Ok(())
    }

    fn on_unlink(&mut self, from: Option<ValueId>, to: Option<ValueId>, label: &str) -> HookResult {
        let from = self.resolve(from);
        let to = to.map(|value| self.resolve(Some(value)));

        if let Some(edge) = self.retire(from, &Label::property(label)) {
            if to.map_or(false, |to| to != edge.to) {
                trace!(%from, label, "unlinked edge pointed at a different target");
            }
        }

        self.mark_changed();
        Ok(())
    }

    fn on_call_boundary(&mut self) -> HookResult {
        self.collection_due = true;
        Ok(())
    }
}
