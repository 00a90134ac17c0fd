//! Cycle detection over finite graphs.

use crate::HashMap;
use std::hash::Hash;

/// Find all elementary cycles of the given adjacency-list graph.
///
/// Edges to nodes absent from the map are ignored. Each cycle is reported
/// once, as the list of nodes along it in traversal order.
pub fn find_cycles<N>(graph: &HashMap<N, Vec<N>>) -> Vec<Vec<N>>
where
    N: Clone + Eq + Hash,
{
    let mut cycles = Vec::new();
    let mut visited = HashMap::default();
    let mut stack = Vec::new();

    for node in graph.keys() {
        if !visited.contains_key(node) {
            visit(node, graph, &mut visited, &mut stack, &mut cycles);
        }
    }

    cycles
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Status {
    Ongoing,
    Finished,
}

fn visit<N>(
    node: &N,
    graph: &HashMap<N, Vec<N>>,
    visited: &mut HashMap<N, Status>,
    stack: &mut Vec<N>,
    cycles: &mut Vec<Vec<N>>,
) where
    N: Clone + Eq + Hash,
{
    visited.insert(node.clone(), Status::Ongoing);
    stack.push(node.clone());

    for successor in graph.get(node).into_iter().flatten() {
        match visited.get(successor) {
            Some(Status::Ongoing) => {
                let cycle: Vec<_> = stack
                    .iter()
                    .skip_while(|some_node| *some_node != successor)
                    .cloned()
                    .collect();

                if !cycle.is_empty() {
                    cycles.push(cycle);
                }
            }
            Some(Status::Finished) => {}
            None => {
                if graph.contains_key(successor) {
                    visit(successor, graph, visited, stack, cycles);
                }
            }
        }
    }

    stack.pop();
    visited.insert(node.clone(), Status::Finished);
}

#[cfg(test)]
mod test {
    use super::find_cycles;
    use crate::HashMap;

    fn graph(edges: &[(u32, &[u32])]) -> HashMap<u32, Vec<u32>> {
        edges
            .iter()
            .map(|(node, successors)| (*node, successors.to_vec()))
            .collect()
    }

    #[test]
    fn acyclic() {
        let graph = graph(&[(0, &[1, 2]), (1, &[2]), (2, &[])]);
        assert!(find_cycles(&graph).is_empty());
    }

    #[test]
    fn self_loop() {
        let graph = graph(&[(0, &[0])]);
        assert_eq!(find_cycles(&graph), [[0]]);
    }

    #[test]
    fn two_cycle() {
        let graph = graph(&[(0, &[1]), (1, &[0])]);
        let cycles = find_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
    }
}
