// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Router Coalescing
//!
//! Pending router edges either join the external router or become
//! point-to-point routers between two internal networks.

use cim_virt_topology::topology::{coalesce_routers, VirtualNetwork};
use indexmap::IndexMap;
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Property Test Strategies
// ============================================================================

const NETWORKS: usize = 8;

fn name(index: usize) -> String {
    format!("NET-{index}")
}

/// Networks NET-0..NET-7, each possibly external
fn networks() -> impl Strategy<Value = IndexMap<String, VirtualNetwork>> {
    prop::collection::vec(any::<bool>(), NETWORKS).prop_map(|external| {
        external
            .into_iter()
            .enumerate()
            .map(|(index, external)| {
                let mut network = VirtualNetwork::new(name(index));
                network.external = external;
                (network.name.clone(), network)
            })
            .collect()
    })
}

/// Edges between known networks, plus some to a network that does not exist
fn edges() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((0..NETWORKS + 1, 0..NETWORKS + 1), 0..20)
        .prop_map(|pairs| pairs.into_iter().map(|(a, b)| (name(a), name(b))).collect())
}

fn known_edges<'a>(
    networks: &'a IndexMap<String, VirtualNetwork>,
    edges: &'a [(String, String)],
) -> impl Iterator<Item = &'a (String, String)> {
    edges
        .iter()
        .filter(|(a, b)| a != b && networks.contains_key(a) && networks.contains_key(b))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Both ends of a kept edge agree on external membership
    #[test]
    fn prop_external_membership_is_transitive(
        mut networks in networks(),
        edges in edges(),
    ) {
        coalesce_routers(&mut networks, &edges);

        for (a, b) in known_edges(&networks, &edges) {
            prop_assert_eq!(networks[a].external, networks[b].external, "{} -> {}", a, b);
        }
    }

    /// Property: External membership is never withdrawn
    #[test]
    fn prop_external_is_monotonic(mut networks in networks(), edges in edges()) {
        let before: Vec<bool> = networks.values().map(|n| n.external).collect();
        coalesce_routers(&mut networks, &edges);

        for (was, network) in before.into_iter().zip(networks.values()) {
            prop_assert!(!was || network.external);
        }
    }

    /// Property: Routers only join internal networks, once per pair
    #[test]
    fn prop_one_router_per_internal_pair(mut networks in networks(), edges in edges()) {
        let routers = coalesce_routers(&mut networks, &edges);

        let mut pairs = HashSet::new();
        for router in &routers {
            let [a, b] = &router.0;
            prop_assert_ne!(a, b);
            prop_assert!(!networks[a].external && !networks[b].external);

            let pair = if a < b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
            prop_assert!(pairs.insert(pair), "duplicate router {:?}", router);
        }
    }

    /// Property: Every internal edge is served by a router
    #[test]
    fn prop_internal_edges_are_routed(mut networks in networks(), edges in edges()) {
        let routers = coalesce_routers(&mut networks, &edges);

        for (a, b) in known_edges(&networks, &edges) {
            if !networks[a].external {
                prop_assert!(
                    routers.iter().any(|r| r.connects(a) && r.connects(b)),
                    "{} -> {} has no router", a, b
                );
            }
        }
    }
}
