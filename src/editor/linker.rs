// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Link graph decomposition into reading-order chains.
//!
//! Only simple paths are fully supported. At a branching node the walk takes
//! the first unvisited neighbour in link insertion order; the other branches
//! are picked up as separate chains or left for a later pass.

use crate::models::bubble::BubbleId;
use crate::models::store::{BubbleStore, Link};
use crate::services::ChainItem;
use std::collections::{HashMap, HashSet};

/// Chains shorter than this carry no context and are dropped.
pub const MIN_CHAIN_LEN: usize = 2;

/// Split the link graph into ordered chains of bubble ids.
pub fn decompose_chains(links: &[Link]) -> Vec<Vec<BubbleId>> {
    let mut order: Vec<BubbleId> = Vec::new();
    let mut adjacency: HashMap<BubbleId, Vec<BubbleId>> = HashMap::new();
    let mut in_degree: HashMap<BubbleId, usize> = HashMap::new();

    for link in links {
        for id in [link.from, link.to] {
            if !in_degree.contains_key(&id) {
                in_degree.insert(id, 0);
                order.push(id);
            }
        }
        adjacency.entry(link.from).or_default().push(link.to);
        *in_degree.entry(link.to).or_default() += 1;
    }

    let mut visited: HashSet<BubbleId> = HashSet::new();
    let mut chains = Vec::new();

    let starts = order.iter().filter(|id| in_degree[*id] == 0);
    // Whatever is left after the sources are exhausted sits on a pure cycle.
    let leftovers = order.iter();
    for &start in starts.chain(leftovers) {
        if visited.contains(&start) {
            continue;
        }
        let chain = walk(start, &adjacency, &mut visited);
        if chain.len() >= MIN_CHAIN_LEN {
            chains.push(chain);
        }
    }
    chains
}

fn walk(
    start: BubbleId,
    adjacency: &HashMap<BubbleId, Vec<BubbleId>>,
    visited: &mut HashSet<BubbleId>,
) -> Vec<BubbleId> {
    let mut chain = vec![start];
    visited.insert(start);
    let mut current = start;
    while let Some(&next) = adjacency
        .get(&current)
        .and_then(|targets| targets.iter().find(|id| !visited.contains(*id)))
    {
        visited.insert(next);
        chain.push(next);
        current = next;
    }
    chain
}

/// One chain ready to be sent for context retranslation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRequest {
    pub ids: Vec<BubbleId>,
    pub items: Vec<ChainItem>,
}

/// Decompose the store's links and attach each bubble's current text.
///
/// Ids missing from the store are skipped; a chain that falls below two
/// bubbles as a result is dropped.
pub fn chain_requests(store: &BubbleStore) -> Vec<ChainRequest> {
    decompose_chains(store.links())
        .into_iter()
        .filter_map(|chain| {
            let items: Vec<ChainItem> = chain
                .iter()
                .filter_map(|id| store.get(*id))
                .map(|bubble| ChainItem {
                    id: bubble.id,
                    current_text: bubble.text.clone(),
                    original_text: bubble.original_text.clone(),
                })
                .collect();
            (items.len() >= MIN_CHAIN_LEN).then(|| ChainRequest {
                ids: items.iter().map(|item| item.id).collect(),
                items,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bubble::{BoundingBox, Bubble};

    const A: BubbleId = BubbleId(1);
    const B: BubbleId = BubbleId(2);
    const C: BubbleId = BubbleId(3);
    const D: BubbleId = BubbleId(4);
    const E: BubbleId = BubbleId(5);

    fn links(pairs: &[(BubbleId, BubbleId)]) -> Vec<Link> {
        pairs.iter().map(|&(from, to)| Link::new(from, to)).collect()
    }

    #[test]
    fn test_paths_become_chains() {
        let chains = decompose_chains(&links(&[(A, B), (B, C), (D, E)]));
        assert_eq!(chains, vec![vec![A, B, C], vec![D, E]]);
    }

    #[test]
    fn test_insertion_order_does_not_change_path_order() {
        let chains = decompose_chains(&links(&[(B, C), (A, B)]));
        assert_eq!(chains, vec![vec![A, B, C]]);
    }

    #[test]
    fn test_pure_cycle_terminates_as_one_chain() {
        let chains = decompose_chains(&links(&[(A, B), (B, C), (C, A)]));
        assert_eq!(chains, vec![vec![A, B, C]]);
    }

    #[test]
    fn test_path_into_cycle_stops_at_visited_node() {
        let chains = decompose_chains(&links(&[(A, B), (B, C), (C, B)]));
        assert_eq!(chains, vec![vec![A, B, C]]);
    }

    #[test]
    fn test_branch_takes_first_link_and_drops_singletons() {
        // A fans out to B then C; C is reachable only from A, so it ends up
        // as a lone node and is dropped.
        let chains = decompose_chains(&links(&[(A, B), (A, C)]));
        assert_eq!(chains, vec![vec![A, B]]);

        let chains = decompose_chains(&links(&[(A, B), (A, C), (D, C), (C, E)]));
        assert_eq!(chains, vec![vec![A, B], vec![D, C, E]]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(decompose_chains(&[]).is_empty());
    }

    #[test]
    fn test_chain_requests_carry_text() {
        let mut store = BubbleStore::new();
        let mut ids = Vec::new();
        for text in ["one", "two", "three"] {
            let id = store.allocate_id();
            let mut bubble = Bubble::new(id, text, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
            bubble.original_text = Some(format!("orig {text}"));
            store.insert(bubble);
            ids.push(id);
        }
        store.add_link(ids[2], ids[0]).unwrap();
        store.add_link(ids[0], ids[1]).unwrap();

        let requests = chain_requests(&store);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].ids, vec![ids[2], ids[0], ids[1]]);
        assert_eq!(requests[0].items[0].current_text, "three");
        assert_eq!(requests[0].items[1].original_text.as_deref(), Some("orig one"));
    }
}
