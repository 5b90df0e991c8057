// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Tests for the cluster walks.

use crate::common::{empty_graph, system_at};
use association::association::topology::{
    BranchedValidator, ClusterShape, DoubleSiteValidator, SingleSiteValidator, TopologyValidator,
};
use association::TopologyError;
use glam::f64::DVec3;

/// Particles on a line, two apart, so no pair of partners collapses.
fn line(count: usize) -> association::ParticleSystem {
    let positions: Vec<DVec3> = (0..count)
        .map(|i| DVec3::new(1.0 + 2.0 * i as f64, 5.0, 5.0))
        .collect();
    system_at(40.0, &positions)
}

// ============================================================================
// Double-site chains and rings
// ============================================================================

#[test]
fn chain_is_walked_from_its_end() {
    let system = line(3);
    let mut graph = empty_graph(&system);
    graph.add_bond(0, 1);
    graph.add_bond(1, 2);

    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = Vec::new();
    let shape = validator.walk(&graph, &system, 0, &mut cluster).expect("valid chain");
    assert_eq!(shape, ClusterShape::Chain);
    assert_eq!(cluster, vec![0, 1, 2]);
}

#[test]
fn chain_is_walked_from_its_middle() {
    let system = line(5);
    let mut graph = empty_graph(&system);
    for i in 0..4 {
        graph.add_bond(i, i + 1);
    }
    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = Vec::new();
    let shape = validator.walk(&graph, &system, 2, &mut cluster).expect("valid chain");
    assert_eq!(shape, ClusterShape::Chain);
    assert_eq!(cluster[0], 2);
    let mut sorted = cluster.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
}

#[test]
fn ring_closure_is_detected() {
    // Square of side 2 so opposite corners are 2.8 apart.
    let system = system_at(
        20.0,
        &[
            DVec3::new(1.0, 1.0, 5.0),
            DVec3::new(3.0, 1.0, 5.0),
            DVec3::new(3.0, 3.0, 5.0),
            DVec3::new(1.0, 3.0, 5.0),
        ],
    );
    let mut graph = empty_graph(&system);
    for i in 0..4 {
        graph.add_bond(i, (i + 1) % 4);
    }
    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = Vec::new();
    for seed in 0..4 {
        let shape = validator.walk(&graph, &system, seed, &mut cluster).expect("valid ring");
        assert_eq!(shape, ClusterShape::Ring);
        assert_eq!(cluster.len(), 4, "each member visited once");
        assert_eq!(cluster[0], seed);
    }
}

#[test]
fn triangle_closes_into_ring() {
    // A-B, B-C, then C-A closes the loop; partners are 2 apart.
    let system = system_at(
        20.0,
        &[
            DVec3::new(5.0, 5.0, 5.0),
            DVec3::new(7.0, 5.0, 5.0),
            DVec3::new(6.0, 5.0 + 3f64.sqrt(), 5.0),
        ],
    );
    let mut graph = empty_graph(&system);
    graph.add_bond(0, 1);
    graph.add_bond(1, 2);
    graph.add_bond(2, 0);
    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = Vec::new();
    for seed in 0..3 {
        let shape = validator.walk(&graph, &system, seed, &mut cluster).expect("valid ring");
        assert_eq!(shape, ClusterShape::Ring);
        assert_eq!(cluster[0], seed);
        let mut sorted = cluster.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
        assert!(!validator.populate(&graph, &system, seed, &mut cluster, false));
        assert_eq!(cluster.len(), 3);
    }
}

#[test]
fn open_chain_is_not_a_ring() {
    let system = line(4);
    let mut graph = empty_graph(&system);
    graph.add_bond(0, 1);
    graph.add_bond(1, 2);
    graph.add_bond(2, 3);
    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = Vec::new();
    for seed in 0..4 {
        let shape = validator.walk(&graph, &system, seed, &mut cluster).expect("valid chain");
        assert_eq!(shape, ClusterShape::Chain);
        assert_eq!(cluster.len(), 4);
    }
}

#[test]
fn monomer_walk() {
    let system = line(2);
    let graph = empty_graph(&system);
    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = vec![7, 8, 9];
    let shape = validator.walk(&graph, &system, 1, &mut cluster).expect("valid monomer");
    assert_eq!(shape, ClusterShape::Monomer);
    assert_eq!(cluster, vec![1]);
}

#[test]
fn collapsed_sites_are_reported() {
    // Both partners of particle 1 sit 0.5 apart: they share one site.
    let system = system_at(
        20.0,
        &[
            DVec3::new(5.0, 5.0, 5.0),
            DVec3::new(6.0, 5.0, 5.0),
            DVec3::new(5.0, 5.5, 5.0),
        ],
    );
    let mut graph = empty_graph(&system);
    graph.add_bond(0, 1);
    graph.add_bond(1, 2);
    let validator = DoubleSiteValidator::new(1.5);
    let mut cluster = Vec::new();

    let err = validator.walk(&graph, &system, 0, &mut cluster).unwrap_err();
    assert!(
        matches!(err, TopologyError::CollapsedSites { particle: 1, .. }),
        "{err:?}"
    );
    assert!(validator.populate(&graph, &system, 0, &mut cluster, true));
}

#[test]
#[should_panic(expected = "invalid cluster topology")]
fn collapsed_sites_abort_outside_trials() {
    let system = system_at(
        20.0,
        &[
            DVec3::new(5.0, 5.0, 5.0),
            DVec3::new(6.0, 5.0, 5.0),
            DVec3::new(5.0, 5.5, 5.0),
        ],
    );
    let mut graph = empty_graph(&system);
    graph.add_bond(0, 1);
    graph.add_bond(1, 2);
    let mut cluster = Vec::new();
    DoubleSiteValidator::new(1.5).populate(&graph, &system, 0, &mut cluster, false);
}

#[test]
fn third_bond_is_too_many_for_two_sites() {
    let system = system_at(
        20.0,
        &[
            DVec3::new(5.0, 5.0, 5.0),
            DVec3::new(7.0, 5.0, 5.0),
            DVec3::new(3.0, 5.0, 5.0),
            DVec3::new(5.0, 7.0, 5.0),
        ],
    );
    let mut graph = empty_graph(&system);
    for p in 1..4 {
        graph.add_bond(0, p);
    }
    let mut cluster = Vec::new();
    let err = DoubleSiteValidator::new(1.5)
        .walk(&graph, &system, 1, &mut cluster)
        .unwrap_err();
    assert_eq!(
        err,
        TopologyError::TooManyBonds {
            particle: 0,
            max: 2,
            bonds: vec![1, 2, 3],
        }
    );
}

// ============================================================================
// Single-site dimers
// ============================================================================

#[test]
fn single_site_dimer() {
    let system = line(3);
    let mut graph = empty_graph(&system);
    graph.add_bond(2, 0);
    let mut cluster = Vec::new();
    let shape = SingleSiteValidator.walk(&graph, &system, 0, &mut cluster).expect("dimer");
    assert_eq!(shape, ClusterShape::Chain);
    assert_eq!(cluster, vec![0, 2]);
    let shape = SingleSiteValidator.walk(&graph, &system, 1, &mut cluster).expect("monomer");
    assert_eq!(shape, ClusterShape::Monomer);
}

#[test]
fn single_site_partner_with_second_bond_is_a_mismatch() {
    let system = line(3);
    let mut graph = empty_graph(&system);
    graph.add_bond(0, 1);
    graph.add_bond(1, 2);
    let mut cluster = Vec::new();
    let err = SingleSiteValidator.walk(&graph, &system, 0, &mut cluster).unwrap_err();
    assert!(
        matches!(err, TopologyError::DimerMismatch { particle: 0, partner: 1, .. }),
        "{err:?}"
    );
    assert!(SingleSiteValidator.populate(&graph, &system, 0, &mut cluster, true));
}

// ============================================================================
// Branched clusters
// ============================================================================

fn star(arms: usize) -> (association::ParticleSystem, association::BondGraph) {
    let directions = [DVec3::X, -DVec3::X, DVec3::Y, -DVec3::Y, DVec3::Z, -DVec3::Z];
    let center = DVec3::splat(10.0);
    let mut positions = vec![center];
    positions.extend(directions[..arms].iter().map(|&d| center + 2.0 * d));
    let system = system_at(20.0, &positions);
    let mut graph = empty_graph(&system);
    for p in 1..=arms {
        graph.add_bond(0, p);
    }
    (system, graph)
}

#[test]
fn branched_shapes() {
    let validator = BranchedValidator::new(3, 1.5);
    let mut cluster = Vec::new();

    let (system, graph) = star(3);
    let shape = validator.walk(&graph, &system, 2, &mut cluster).expect("valid star");
    assert_eq!(shape, ClusterShape::Branched);
    assert_eq!(cluster.len(), 4);

    let (system, graph) = star(2);
    assert_eq!(
        validator.walk(&graph, &system, 0, &mut cluster).expect("valid chain"),
        ClusterShape::Chain
    );

    let (system, graph) = star(0);
    assert_eq!(
        validator.walk(&graph, &system, 0, &mut cluster).expect("valid monomer"),
        ClusterShape::Monomer
    );
}

#[test]
fn branched_ring() {
    let system = system_at(
        20.0,
        &[
            DVec3::new(1.0, 1.0, 5.0),
            DVec3::new(3.0, 1.0, 5.0),
            DVec3::new(3.0, 3.0, 5.0),
            DVec3::new(1.0, 3.0, 5.0),
        ],
    );
    let mut graph = empty_graph(&system);
    for i in 0..4 {
        graph.add_bond(i, (i + 1) % 4);
    }
    let mut cluster = Vec::new();
    let shape = BranchedValidator::new(3, 1.5)
        .walk(&graph, &system, 0, &mut cluster)
        .expect("valid ring");
    assert_eq!(shape, ClusterShape::Ring);
    assert_eq!(cluster.len(), 4);
}

#[test]
#[should_panic(expected = "particle 0 has 4 bonds (max 3)")]
fn branched_degree_overflow_aborts() {
    let (system, graph) = star(4);
    let mut cluster = Vec::new();
    BranchedValidator::new(3, 1.5).populate(&graph, &system, 0, &mut cluster, false);
}

#[test]
fn walks_are_deterministic() {
    let (system, graph) = star(3);
    let validator = BranchedValidator::new(3, 1.5);
    let mut first = Vec::new();
    let mut second = Vec::new();
    for seed in 0..4 {
        validator.walk(&graph, &system, seed, &mut first).expect("valid");
        validator.walk(&graph, &system, seed, &mut second).expect("valid");
        assert_eq!(first, second);
    }
}

#[test]
fn healthy_star_populates_cleanly() {
    let (system, graph) = star(2);
    graph.check_invariants().expect("symmetric");
    let mut cluster = Vec::new();
    assert!(!BranchedValidator::new(2, 1.5).populate(&graph, &system, 1, &mut cluster, true));
}
