//! The overlap graph: vertices are fragment ends, edges are either a
//! fragment's own span or an accepted overlap between two fragments.

pub mod offset;
pub mod vertex;

pub use self::offset::*;
pub use self::vertex::*;

use std::collections::BTreeMap;

use fnv::FnvHashMap;

use crate::sequence::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

/// The attributes of an accepted dovetail overlap. Offsets are stored
/// per role; each one selects the flank of its fragment lying outside
/// the overlap, expressed in the frame the aligner saw the fragment in.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub score: i64,
    /// The alignment was reverse stranded, so the query's offset was
    /// taken on its reverse complement.
    pub reverse: bool,
    pub query: Vertex,
    pub reference: Vertex,
    pub query_offset: Offset,
    pub reference_offset: Offset,
}

impl Overlap {
    /// The vertex on the other side of the overlap
    pub fn other(&self, v: &Vertex) -> Option<&Vertex> {
        if &self.query == v {
            Some(&self.reference)
        } else if &self.reference == v {
            Some(&self.query)
        } else {
            None
        }
    }

    pub fn offset_for(&self, v: &Vertex) -> Option<Offset> {
        if &self.query == v {
            Some(self.query_offset)
        } else if &self.reference == v {
            Some(self.reference_offset)
        } else {
            None
        }
    }

    /// Orientation of the fragment behind `v` in the alignment the
    /// overlap came from. The reference is always forward.
    pub fn frame_orientation(&self, v: &Vertex) -> Option<Orientation> {
        if &self.query == v {
            Some(Orientation::from_reverse_flag(self.reverse))
        } else if &self.reference == v {
            Some(Orientation::Forward)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    /// A fragment traversed end to end
    Internal,
    Overlap(Overlap),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: Vertex,
    pub to: Vertex,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, EdgeKind::Internal)
    }

    pub fn overlap(&self) -> Option<&Overlap> {
        match &self.kind {
            EdgeKind::Overlap(ov) => Some(ov),
            EdgeKind::Internal => None,
        }
    }

    /// True if the endpoints belong to two different fragments
    pub fn joins_fragments(&self) -> bool {
        !self.from.same_fragment(&self.to)
    }

    pub fn other(&self, v: &Vertex) -> &Vertex {
        if &self.from == v {
            &self.to
        } else {
            &self.from
        }
    }
}

/// Undirected graph over fragment ends. Vertices are kept ordered so
/// that traversals starting from "any" vertex are reproducible.
#[derive(Default, Debug, Clone)]
pub struct OverlapGraph {
    adjacency: BTreeMap<Vertex, Vec<EdgeId>>,
    edges: FnvHashMap<EdgeId, Edge>,
    next_edge: usize,
}

impl OverlapGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns false if the vertex already existed
    pub fn add_vertex(&mut self, v: Vertex) -> bool {
        if self.adjacency.contains_key(&v) {
            false
        } else {
            self.adjacency.insert(v, Vec::new());
            true
        }
    }

    pub fn contains_vertex(&self, v: &Vertex) -> bool {
        self.adjacency.contains_key(v)
    }

    fn add_edge(&mut self, from: Vertex, to: Vertex, kind: EdgeKind) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;

        self.adjacency.entry(from.clone()).or_default().push(id);
        self.adjacency.entry(to.clone()).or_default().push(id);
        self.edges.insert(id, Edge { from, to, kind });
        id
    }

    /// Connects the two ends of a fragment
    pub fn add_internal_edge(&mut self, fragment: &[u8]) -> EdgeId {
        self.add_edge(
            Vertex::five(fragment),
            Vertex::three(fragment),
            EdgeKind::Internal,
        )
    }

    pub fn add_overlap_edge(&mut self, overlap: Overlap) -> EdgeId {
        let from = overlap.query.clone();
        let to = overlap.reference.clone();
        self.add_edge(from, to, EdgeKind::Overlap(overlap))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Removes an edge, leaving its endpoints in place
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        for v in [&edge.from, &edge.to].iter() {
            if let Some(ids) = self.adjacency.get_mut(*v) {
                ids.retain(|e| *e != id);
            }
        }
        Some(edge)
    }

    /// Removes a vertex and every edge incident to it
    pub fn remove_vertex(&mut self, v: &Vertex) -> bool {
        match self.adjacency.remove(v) {
            Some(ids) => {
                for id in ids {
                    if let Some(edge) = self.edges.remove(&id) {
                        let other = edge.other(v);
                        if let Some(other_ids) = self.adjacency.get_mut(other) {
                            other_ids.retain(|e| *e != id);
                        }
                    }
                }
                true
            }
            None => false,
        }
    }

    pub fn incident_edges<'a>(
        &'a self,
        v: &Vertex,
    ) -> impl Iterator<Item = (EdgeId, &'a Edge)> + 'a {
        self.adjacency
            .get(v)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(move |id| self.edges.get(id).map(|e| (*id, e)))
    }

    /// The overlap edge touching `v`, if there is one
    pub fn overlap_at(&self, v: &Vertex) -> Option<(EdgeId, &Overlap)> {
        self.incident_edges(v)
            .find_map(|(id, edge)| edge.overlap().map(|ov| (id, ov)))
    }

    /// The overlap edge joining `a` and `b`, in either direction
    pub fn overlap_between(&self, a: &Vertex, b: &Vertex) -> Option<&Overlap> {
        self.incident_edges(a)
            .filter(|(_, edge)| edge.other(a) == b)
            .find_map(|(_, edge)| edge.overlap())
    }

    /// Distinct neighbours of `v`, in edge insertion order
    pub fn neighbors(&self, v: &Vertex) -> Vec<&Vertex> {
        let mut result: Vec<&Vertex> = Vec::new();
        for (_, edge) in self.incident_edges(v) {
            let other = edge.other(v);
            if !result.contains(&other) {
                result.push(other);
            }
        }
        result
    }

    pub fn degree(&self, v: &Vertex) -> usize {
        self.adjacency.get(v).map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.adjacency.keys()
    }

    /// The smallest remaining vertex
    pub fn first_vertex(&self) -> Option<&Vertex> {
        self.adjacency.keys().next()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().map(|(id, e)| (*id, e))
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn overlap_count(&self) -> usize {
        self.edges.values().filter(|e| !e.is_internal()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}
