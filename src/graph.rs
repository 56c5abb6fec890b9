//! The intersection-graph machinery behind the locus hierarchy
//!
//! Transcripts are nodes, intersection-predicate hits are edges. The
//! selectors need maximal cliques (Bron–Kerbosch with pivoting; plain
//! enumeration collapses on dense subloci) and "communities", defined as
//! the connected components of the clique graph in which two cliques are
//! linked iff they share a vertex.
//!
//! All iteration is deterministic: the adjacency view is kept in sorted
//! maps, so equal inputs enumerate cliques and communities in the same
//! order on every run.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graphmap::UnGraphMap;
use petgraph::unionfind::UnionFind;

/// Undirected transcript-intersection graph over borrowed transcript ids
pub type IntersectionGraph<'a> = UnGraphMap<&'a str, ()>;

/// Returns every maximal clique of the graph
///
/// Cliques are emitted with sorted members, in a deterministic order.
pub fn find_cliques<'a>(graph: &IntersectionGraph<'a>) -> Vec<Vec<&'a str>> {
    let adjacency = sorted_adjacency(graph);
    if adjacency.is_empty() {
        return vec![];
    }
    let mut cliques = vec![];
    let mut current = vec![];
    let candidates: BTreeSet<&str> = adjacency.keys().cloned().collect();
    bron_kerbosch(
        &adjacency,
        &mut current,
        candidates,
        BTreeSet::new(),
        &mut cliques,
    );
    cliques.sort_unstable();
    cliques
}

/// Collapses cliques into their vertex-wise unions under the transitive
/// closure of "shares at least one vertex"
pub fn merge_cliques<'a>(cliques: &[Vec<&'a str>]) -> Vec<BTreeSet<&'a str>> {
    let mut union_find = UnionFind::<usize>::new(cliques.len());
    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, clique) in cliques.iter().enumerate() {
        for vertex in clique {
            match first_seen.get(vertex) {
                Some(&other) => {
                    union_find.union(index, other);
                }
                None => {
                    first_seen.insert(vertex, index);
                }
            }
        }
    }

    let mut merged: BTreeMap<usize, BTreeSet<&str>> = BTreeMap::new();
    for (index, clique) in cliques.iter().enumerate() {
        let root = union_find.find(index);
        merged.entry(root).or_default().extend(clique.iter().cloned());
    }
    merged.into_iter().map(|(_, vertices)| vertices).collect()
}

/// Returns the communities of the graph: merged maximal cliques
pub fn find_communities<'a>(graph: &IntersectionGraph<'a>) -> Vec<BTreeSet<&'a str>> {
    merge_cliques(&find_cliques(graph))
}

fn sorted_adjacency<'a>(graph: &IntersectionGraph<'a>) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for node in graph.nodes() {
        adjacency.insert(node, graph.neighbors(node).collect());
    }
    adjacency
}

fn bron_kerbosch<'a>(
    adjacency: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    current: &mut Vec<&'a str>,
    mut candidates: BTreeSet<&'a str>,
    mut excluded: BTreeSet<&'a str>,
    cliques: &mut Vec<Vec<&'a str>>,
) {
    if candidates.is_empty() && excluded.is_empty() {
        let mut clique = current.clone();
        clique.sort_unstable();
        cliques.push(clique);
        return;
    }

    // pivot on the vertex covering most of the candidate set
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .max_by_key(|vertex| {
            adjacency[*vertex]
                .intersection(&candidates)
                .count()
        })
        .cloned()
        .unwrap();
    let without_pivot: Vec<&str> = candidates
        .difference(&adjacency[&pivot])
        .cloned()
        .collect();

    for vertex in without_pivot {
        let neighbors = &adjacency[&vertex];
        current.push(vertex);
        bron_kerbosch(
            adjacency,
            current,
            candidates.intersection(neighbors).cloned().collect(),
            excluded.intersection(neighbors).cloned().collect(),
            cliques,
        );
        current.pop();
        candidates.remove(vertex);
        excluded.insert(vertex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&'static str, &'static str)], lone: &[&'static str]) -> IntersectionGraph<'static> {
        let mut g = IntersectionGraph::new();
        for node in lone {
            g.add_node(node);
        }
        for (a, b) in edges {
            g.add_edge(a, b, ());
        }
        g
    }

    #[test]
    fn test_empty_graph_has_no_cliques() {
        let g = IntersectionGraph::new();
        assert!(find_cliques(&g).is_empty());
        assert!(find_communities(&g).is_empty());
    }

    #[test]
    fn test_cliques_of_a_chain() {
        let g = graph(&[("t1", "t2"), ("t2", "t3"), ("t3", "t4")], &[]);
        let cliques = find_cliques(&g);
        assert_eq!(
            cliques,
            vec![vec!["t1", "t2"], vec!["t2", "t3"], vec!["t3", "t4"]]
        );
    }

    #[test]
    fn test_cliques_of_a_triangle_with_tail() {
        let g = graph(&[("t1", "t2"), ("t1", "t3"), ("t2", "t3"), ("t3", "t4")], &[]);
        let cliques = find_cliques(&g);
        assert_eq!(cliques, vec![vec!["t1", "t2", "t3"], vec!["t3", "t4"]]);
    }

    #[test]
    fn test_isolated_nodes_are_singleton_cliques() {
        let g = graph(&[("t1", "t2")], &["t9"]);
        let cliques = find_cliques(&g);
        assert_eq!(cliques, vec![vec!["t1", "t2"], vec!["t9"]]);
    }

    #[test]
    fn test_merge_cliques() {
        let cliques = vec![
            vec!["t1", "t2"],
            vec!["t2", "t3"],
            vec!["t5", "t6"],
        ];
        let merged = merge_cliques(&cliques);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&["t1", "t2", "t3"].iter().cloned().collect()));
        assert!(merged.contains(&["t5", "t6"].iter().cloned().collect()));
    }

    #[test]
    fn test_communities_match_connected_components() {
        let g = graph(
            &[("t1", "t2"), ("t2", "t3"), ("t5", "t6")],
            &["t9"],
        );
        let communities = find_communities(&g);
        assert_eq!(communities.len(), 3);
        assert!(communities.contains(&["t1", "t2", "t3"].iter().cloned().collect()));
        assert!(communities.contains(&["t5", "t6"].iter().cloned().collect()));
        assert!(communities.contains(&["t9"].iter().cloned().collect()));
    }

    #[test]
    fn test_dense_graph_has_one_clique() {
        let mut g = IntersectionGraph::new();
        let names: Vec<String> = (0..40).map(|i| format!("t{:02}", i)).collect();
        let ids: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                g.add_edge(ids[i], ids[j], ());
            }
        }
        let cliques = find_cliques(&g);
        assert_eq!(cliques.len(), 1);
        assert_eq!(cliques[0].len(), 40);
    }

    #[test]
    fn test_determinism() {
        let g = graph(
            &[("t1", "t2"), ("t2", "t3"), ("t1", "t3"), ("t3", "t4"), ("t4", "t5")],
            &[],
        );
        let first = find_cliques(&g);
        let second = find_cliques(&g);
        assert_eq!(first, second);
    }
}
