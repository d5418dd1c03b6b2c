use std::collections::VecDeque;

use bstr::BString;
use fnv::{FnvHashMap, FnvHashSet};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{AssemblyResult, GraphInconsistency},
    graph::{EdgeId, End, OverlapGraph, Vertex},
};

/// A closed walk through the graph; `edges[i]` joins `vertices[i]` and
/// `vertices[i + 1]`, the last edge closes the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<EdgeId>,
}

impl Cycle {
    /// Rotates the cycle so that it starts at its smallest vertex
    fn normalize(&mut self) {
        let start = self
            .vertices
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.vertices.rotate_left(start);
        self.edges.rotate_left(start);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Anomalies found, and repairs made, while linearizing
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct LinearizeReport {
    /// Vertices without any edge
    pub isolates: Vec<Vertex>,
    /// Vertices with more than two neighbours
    pub junctions: Vec<Vertex>,
    /// Fragments with no overlap at either end
    pub unlinked: Vec<BString>,
    /// Endpoints of the overlap edges removed to break cycles
    pub popped: Vec<(Vertex, Vertex)>,
    pub components: usize,
}

type Parents<'a> = FnvHashMap<&'a Vertex, Option<(&'a Vertex, EdgeId)>>;

fn path_to_root<'a>(
    parents: &Parents<'a>,
    v: &'a Vertex,
) -> Vec<(&'a Vertex, Option<EdgeId>)> {
    let mut path = Vec::new();
    let mut current = v;
    loop {
        match parents.get(current).copied().flatten() {
            Some((parent, edge)) => {
                path.push((current, Some(edge)));
                current = parent;
            }
            None => {
                path.push((current, None));
                return path;
            }
        }
    }
}

fn close_cycle<'a>(
    parents: &Parents<'a>,
    u: &'a Vertex,
    w: &'a Vertex,
    closing: EdgeId,
) -> Cycle {
    let up = path_to_root(parents, u);
    let down = path_to_root(parents, w);

    let on_down: FnvHashSet<&Vertex> = down.iter().map(|(v, _)| *v).collect();
    let lca_u = up
        .iter()
        .position(|(v, _)| on_down.contains(v))
        .unwrap_or(up.len() - 1);
    let lca = up[lca_u].0;
    let lca_w = down
        .iter()
        .position(|(v, _)| *v == lca)
        .unwrap_or(down.len() - 1);

    let mut vertices = Vec::new();
    let mut edges = Vec::new();

    for (v, e) in up[..lca_u].iter() {
        vertices.push((*v).clone());
        edges.extend(e);
    }
    vertices.push(lca.clone());
    for (v, e) in down[..lca_w].iter().rev() {
        vertices.push((*v).clone());
        edges.extend(e);
    }
    edges.push(closing);

    let mut cycle = Cycle { vertices, edges };
    cycle.normalize();
    cycle
}

/// Finds a cycle by breadth-first search over each component in vertex
/// order. Parallel edges between the same two vertices count as a
/// cycle.
pub fn find_cycle(graph: &OverlapGraph) -> Option<Cycle> {
    let mut parents: Parents<'_> = FnvHashMap::default();
    let mut queue: VecDeque<&Vertex> = VecDeque::new();

    for root in graph.vertices() {
        if parents.contains_key(root) {
            continue;
        }
        parents.insert(root, None);
        queue.push_back(root);

        while let Some(u) = queue.pop_front() {
            let parent_edge = parents.get(u).copied().flatten().map(|(_, e)| e);

            for (id, edge) in graph.incident_edges(u) {
                if Some(id) == parent_edge {
                    continue;
                }
                let w = edge.other(u);
                match parents.get(w).copied() {
                    None => {
                        parents.insert(w, Some((u, id)));
                        queue.push_back(w);
                    }
                    Some(Some((_, e))) if e == id => {}
                    Some(_) => return Some(close_cycle(&parents, u, w, id)),
                }
            }
        }
    }
    None
}

/// Vertex sets of the connected components, each sorted, in order of
/// their smallest vertex.
pub fn connected_components(graph: &OverlapGraph) -> Vec<Vec<Vertex>> {
    let mut seen: FnvHashSet<&Vertex> = FnvHashSet::default();
    let mut components = Vec::new();

    for root in graph.vertices() {
        if !seen.insert(root) {
            continue;
        }
        let mut component = vec![root.clone()];
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            for w in graph.neighbors(v) {
                if seen.insert(w) {
                    component.push(w.clone());
                    stack.push(w);
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

/// Removes one overlap edge from the cycle: the one at its first
/// vertex if there is one, otherwise the first overlap edge along it.
fn pop_cycle(
    graph: &mut OverlapGraph,
    cycle: &Cycle,
) -> Option<(Vertex, Vertex)> {
    let is_overlap = |id: &EdgeId| {
        graph
            .edge(*id)
            .map(|e| !e.is_internal() && e.joins_fragments())
            .unwrap_or(false)
    };

    let at_start = [cycle.edges.first(), cycle.edges.last()];
    let victim = at_start
        .iter()
        .flatten()
        .copied()
        .find(|id| is_overlap(*id))
        .or_else(|| cycle.edges.iter().find(|id| is_overlap(*id)))
        .copied()?;

    let edge = graph.remove_edge(victim)?;
    Some((edge.from, edge.to))
}

/// Reduces the graph to a disjoint union of simple paths by breaking
/// every cycle, and reports the anomalies it comes across.
pub fn linearize(graph: &mut OverlapGraph) -> AssemblyResult<LinearizeReport> {
    let mut report = LinearizeReport::default();

    for v in graph.vertices() {
        match graph.neighbors(v).len() {
            0 => report.isolates.push(v.clone()),
            n if n > 2 => report.junctions.push(v.clone()),
            _ => (),
        }
        if v.end == End::Five
            && graph.overlap_at(v).is_none()
            && graph.overlap_at(&v.mate()).is_none()
        {
            report.unlinked.push(v.fragment.clone());
        }
    }

    if !report.isolates.is_empty() {
        let names: Vec<String> =
            report.isolates.iter().map(|v| v.to_string()).collect();
        log::warn!("Isolated vertices: {}", names.join(", "));
    }
    for v in report.junctions.iter() {
        log::warn!("Vertex {} has {} neighbours", v, graph.neighbors(v).len());
    }
    if !report.unlinked.is_empty() {
        log::info!("{} fragments have no overlaps", report.unlinked.len());
    }

    while let Some(cycle) = find_cycle(graph) {
        let (from, to) = pop_cycle(graph, &cycle).ok_or_else(|| {
            GraphInconsistency::UnbreakableCycle(cycle.vertices[0].clone())
        })?;
        log::warn!(
            "Popped cycle of {} vertices through {} by removing {} -- {}",
            cycle.len(),
            cycle.vertices[0],
            from,
            to
        );
        report.popped.push((from, to));
    }

    report.components = connected_components(graph).len();
    log::info!(
        "Linearized graph: {} components, {} cycles popped",
        report.components,
        report.popped.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::overlap;

    fn chain(names: &[&str]) -> OverlapGraph {
        let mut graph = OverlapGraph::new();
        for name in names {
            graph.add_internal_edge(name.as_bytes());
        }
        for pair in names.windows(2) {
            graph.add_overlap_edge(overlap(
                Vertex::five(pair[1]),
                Vertex::three(pair[0]),
                10,
            ));
        }
        graph
    }

    #[test]
    fn acyclic_graph_untouched() {
        let mut graph = chain(&["a", "b", "c"]);
        graph.add_internal_edge(b"d");
        assert!(find_cycle(&graph).is_none());

        let report = linearize(&mut graph).unwrap();
        assert!(report.popped.is_empty());
        assert!(report.isolates.is_empty());
        assert_eq!(report.unlinked, vec![BString::from("d")]);
        assert_eq!(report.components, 2);
        assert_eq!(graph.overlap_count(), 2);
    }

    #[test]
    fn three_fragment_cycle() {
        let mut graph = chain(&["a", "b", "c"]);
        graph.add_overlap_edge(overlap(Vertex::five("a"), Vertex::three("c"), 10));

        let cycle = find_cycle(&graph).unwrap();
        assert_eq!(cycle.len(), 6);
        assert_eq!(cycle.edges.len(), 6);
        assert_eq!(cycle.vertices[0], Vertex::five("a"));

        let report = linearize(&mut graph).unwrap();
        assert_eq!(
            report.popped,
            vec![(Vertex::five("a"), Vertex::three("c"))]
        );
        assert_eq!(report.components, 1);
        assert_eq!(graph.overlap_count(), 2);
        assert!(find_cycle(&graph).is_none());
        assert!(graph
            .overlap_between(&Vertex::three("a"), &Vertex::five("b"))
            .is_some());
        assert!(graph
            .overlap_between(&Vertex::three("b"), &Vertex::five("c"))
            .is_some());
    }

    #[test]
    fn two_disjoint_cycles() {
        let mut graph = chain(&["a", "b"]);
        graph.add_overlap_edge(overlap(Vertex::five("a"), Vertex::three("b"), 10));
        graph.add_internal_edge(b"x");
        graph.add_internal_edge(b"y");
        graph.add_overlap_edge(overlap(Vertex::three("x"), Vertex::five("y"), 10));
        graph.add_overlap_edge(overlap(Vertex::three("y"), Vertex::five("x"), 10));

        let report = linearize(&mut graph).unwrap();
        assert_eq!(report.popped.len(), 2);
        assert_eq!(report.components, 2);
        assert_eq!(graph.overlap_count(), 2);
    }

    #[test]
    fn isolated_vertices_reported() {
        let mut graph = chain(&["a"]);
        graph.add_vertex(Vertex::five("lonely"));
        let report = linearize(&mut graph).unwrap();
        assert_eq!(report.isolates, vec![Vertex::five("lonely")]);
        assert_eq!(report.components, 2);
    }

    #[test]
    fn internal_only_cycle_is_unbreakable() {
        let mut graph = OverlapGraph::new();
        graph.add_internal_edge(b"a");
        graph.add_internal_edge(b"a");
        assert!(find_cycle(&graph).is_some());
        assert!(matches!(
            linearize(&mut graph),
            Err(crate::error::AssemblyError::Graph(
                GraphInconsistency::UnbreakableCycle(_)
            ))
        ));
    }

    #[test]
    fn components_are_sorted() {
        let mut graph = chain(&["b", "a"]);
        graph.add_internal_edge(b"c");
        let components = connected_components(&graph);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0][0], Vertex::five("a"));
        assert_eq!(components[0].len(), 4);
        assert_eq!(components[1], vec![Vertex::five("c"), Vertex::three("c")]);
    }
}
