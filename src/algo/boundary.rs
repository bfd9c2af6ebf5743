//! Boundary edges and closed edge loops.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MeshError, Result};

/// Undirected edges owned by exactly one face, as sorted `(low, high)` pairs.
///
/// The result is sorted.
pub fn boundary_edges(faces: &[[usize; 3]]) -> Vec<(usize, usize)> {
    let mut owners: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for &[a, b, c] in faces {
        for (u, v) in [(a, b), (b, c), (a, c)] {
            *owners.entry((u.min(v), u.max(v))).or_insert(0) += 1;
        }
    }

    owners
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Link a disjoint set of undirected edges into closed loops.
///
/// Each loop is returned as a vertex sequence whose first and last entries
/// coincide, using every edge exactly once. Loops start at the lowest
/// unused edge, so the output is deterministic.
///
/// # Errors
///
/// [`MeshError::OpenLoop`] if a loop runs out of unused edges before it
/// returns to its start.
///
/// # Example
///
/// ```
/// use mantle::algo::boundary::trace_loops;
///
/// let loops = trace_loops(&[(0, 1), (1, 2), (2, 0)]).unwrap();
/// assert_eq!(loops, vec![vec![0, 1, 2, 0]]);
/// ```
pub fn trace_loops(edges: &[(usize, usize)]) -> Result<Vec<Vec<usize>>> {
    let mut incident: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (i, &(a, b)) in edges.iter().enumerate() {
        incident.entry(a).or_default().insert(i);
        incident.entry(b).or_default().insert(i);
    }

    let mut unused: BTreeSet<usize> = (0..edges.len()).collect();
    let mut loops = Vec::new();

    while let Some(start) = unused.pop_first() {
        let (a, b) = edges[start];
        let mut path = vec![a, b];

        while path[path.len() - 1] != path[0] {
            let tail = path[path.len() - 1];
            let next = incident
                .get(&tail)
                .and_then(|ids| ids.iter().copied().find(|e| unused.contains(e)))
                .ok_or(MeshError::OpenLoop { vertex: tail })?;
            unused.remove(&next);

            let (x, y) = edges[next];
            path.push(if x == tail { y } else { x });
        }

        loops.push(path);
    }

    log::debug!("traced {} loops from {} edges", loops.len(), edges.len());
    Ok(loops)
}
