use fnv::FnvHashSet;

use crate::{
    error::{AssemblyResult, GraphInconsistency},
    graph::{OverlapGraph, Vertex},
};

/// Neighbours of `v`, failing if it is a junction
fn successors<'a>(
    graph: &'a OverlapGraph,
    v: &Vertex,
) -> Result<Vec<&'a Vertex>, GraphInconsistency> {
    let neighbors = graph.neighbors(v);
    if neighbors.len() > 2 {
        return Err(GraphInconsistency::Junction {
            vertex: v.clone(),
            degree: neighbors.len(),
        });
    }
    Ok(neighbors)
}

struct Walk<'a> {
    graph: &'a OverlapGraph,
    start: &'a Vertex,
    visited: FnvHashSet<&'a Vertex>,
    limit: usize,
}

impl<'a> Walk<'a> {
    fn runaway(&self) -> GraphInconsistency {
        GraphInconsistency::RunawayWalk {
            start: self.start.clone(),
            limit: self.limit,
        }
    }

    /// Follows the graph away from `prev` through `next` until a free
    /// end. The returned vertices start with `next`.
    fn extend(
        &mut self,
        mut prev: &'a Vertex,
        mut next: &'a Vertex,
    ) -> Result<Vec<&'a Vertex>, GraphInconsistency> {
        let mut walked = Vec::new();
        loop {
            if !self.visited.insert(next) || self.visited.len() > self.limit {
                return Err(self.runaway());
            }
            walked.push(next);

            let neighbors = successors(self.graph, next)?;
            if neighbors.len() < 2 {
                return Ok(walked);
            }
            let ahead = neighbors.into_iter().find(|n| *n != prev);
            match ahead {
                Some(ahead) => {
                    prev = next;
                    next = ahead;
                }
                None => return Ok(walked),
            }
        }
    }
}

/// Extracts the maximal path through the smallest vertex left in the
/// graph, without modifying it. The path is oriented so that its first
/// vertex sorts before its last. An empty graph gives an empty path.
pub fn next_path(graph: &OverlapGraph) -> AssemblyResult<Vec<Vertex>> {
    let start = match graph.first_vertex() {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };

    let mut walk = Walk {
        graph,
        start,
        visited: FnvHashSet::default(),
        limit: graph.vertex_count(),
    };
    walk.visited.insert(start);

    let succ = successors(graph, start)?;
    let path: Vec<&Vertex> = match succ.as_slice() {
        [] => vec![start],
        [ahead] => {
            let mut path = vec![start];
            path.extend(walk.extend(start, *ahead)?);
            path
        }
        [ahead, behind] => {
            let forward = walk.extend(start, *ahead)?;
            let mut path = walk.extend(start, *behind)?;
            path.reverse();
            path.push(start);
            path.extend(forward);
            path
        }
        _ => unreachable!("successors never returns more than two vertices"),
    };

    let mut path: Vec<Vertex> = path.into_iter().cloned().collect();
    if path.last() < path.first() {
        path.reverse();
    }

    log::debug!(
        "Walked {} vertices from {} to {}",
        path.len(),
        path[0],
        path[path.len() - 1]
    );

    Ok(path)
}
