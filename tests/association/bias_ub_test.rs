// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Tests for the bonding/unbonding bias move.

use crate::common::{assert_close, rng, system_at};
use association::association::bias_volume::{BiasVolume, BiasVolumeSphere};
use association::association::topology::SingleSiteValidator;
use association::mc::bias_ub::{ub_acceptance, UbKind};
use association::mc::{BiasUbMove, IdealGas};
use association::{Affected, BondGraph, IntegratorMc, McMove};
use glam::f64::DVec3;
use std::rc::Rc;

/// Ratio T(y -> x) / T(x -> y) of the UB proposal densities, written out from
/// the two halves of the move.
///
/// Bonding proposes `a` next to one of its `nj` partners in y with density
/// 1 / (N (N - 1) v); unbonding picks `a` from the associated set and drops it
/// anywhere, density 1 / (Nai V) if `a` was bonded in x.
fn proposal_ratio(n: usize, v: f64, volume: f64, ni: usize, nai: usize, nj: usize, naj: usize) -> f64 {
    let n = n as f64;
    let bond = |count: usize| count as f64 / (n * (n - 1.0) * v);
    let unbond = |bonded: usize, set: usize| {
        if bonded > 0 {
            1.0 / (set as f64 * volume)
        } else {
            0.0
        }
    };
    let forward = 0.5 * (bond(nj) + unbond(ni, nai));
    let reverse = 0.5 * (bond(ni) + unbond(nj, naj));
    reverse / forward
}

// ============================================================================
// ub_acceptance
// ============================================================================

#[test]
fn acceptance_matches_proposal_ratio() {
    let n = 50;
    let v = 0.7;
    let volume = 400.0;
    let phi = v / volume * n as f64;
    // (ni, nai, nj, naj): bond from nothing, unbond to nothing, re-bond,
    // move between partners, and bonding into a crowded set.
    let cases = [
        (0, 0, 1, 2),
        (1, 2, 0, 0),
        (1, 6, 2, 7),
        (2, 9, 1, 9),
        (0, 10, 1, 12),
        (1, 10, 0, 8),
        (3, 12, 3, 12),
    ];
    for (ni, nai, nj, naj) in cases {
        assert_close(
            ub_acceptance(n, phi, ni, nai, nj, naj),
            proposal_ratio(n, v, volume, ni, nai, nj, naj),
            1e-12,
        );
    }
}

#[test]
fn forward_and_reverse_acceptance_are_reciprocal() {
    let phi = 0.03;
    for (ni, nai, nj, naj) in [(0, 0, 1, 2), (1, 4, 2, 5), (2, 6, 0, 4)] {
        let forward = ub_acceptance(100, phi, ni, nai, nj, naj);
        let reverse = ub_acceptance(100, phi, nj, naj, ni, nai);
        assert_close(forward * reverse, 1.0, 1e-12);
    }
}

#[test]
#[should_panic(expected = "at least two particles")]
fn acceptance_needs_a_pair() {
    ub_acceptance(0, 0.1, 0, 0, 1, 2);
}

// ============================================================================
// The move
// ============================================================================

#[test]
fn bond_trial_places_particle_in_bonding_region() {
    let volume: Rc<dyn BiasVolume> = Rc::new(BiasVolumeSphere::new(0.0, 1.0));
    let mut system = system_at(30.0, &[DVec3::splat(5.0), DVec3::splat(20.0)]);
    let mut graph = BondGraph::from_system(volume.clone(), &system);
    let mut mv = BiasUbMove::new(Rc::new(SingleSiteValidator), usize::MAX);
    let mut rng = rng(8);

    // Nothing is bonded, so only a bonding trial can start.
    let mut tries = 0;
    while !mv.do_trial(&mut system, &graph, &IdealGas, &mut rng) {
        tries += 1;
        assert!(tries < 100, "no bonding trial started");
    }
    assert_eq!(mv.last_kind(), UbKind::Bond);
    graph.on_trial(&system, mv.affected_particles());
    let a = mv.moved_particle();
    assert_eq!(graph.degree(a), 1);

    let phi = volume.bias_volume() / system.boundary().volume() * 2.0;
    assert_close(mv.acceptance(&system, &graph), ub_acceptance(2, phi, 0, 0, 1, 2), 1e-12);
    assert_close(mv.acceptance(&system, &graph), phi / 2.0, 1e-12);
}

#[test]
fn unbond_trial_fails_without_bonds() {
    let volume: Rc<dyn BiasVolume> = Rc::new(BiasVolumeSphere::new(0.0, 1.0));
    let mut system = system_at(30.0, &[DVec3::splat(5.0), DVec3::splat(20.0)]);
    let graph = BondGraph::from_system(volume, &system);
    let mut mv = BiasUbMove::new(Rc::new(SingleSiteValidator), usize::MAX);
    let mut rng = rng(1);
    let before = system.particles().to_vec();
    for _ in 0..50 {
        if !mv.do_trial(&mut system, &graph, &IdealGas, &mut rng) {
            assert_eq!(mv.last_kind(), UbKind::Unbond);
            assert_eq!(system.particles(), &before[..]);
            return;
        }
        mv.reject_notify(&mut system);
    }
    panic!("no unbonding trial in 50 attempts");
}

#[test]
fn unbond_trial_acceptance_and_restore() {
    let volume: Rc<dyn BiasVolume> = Rc::new(BiasVolumeSphere::new(0.0, 1.2));
    let mut system = system_at(30.0, &[DVec3::splat(5.0), DVec3::new(6.0, 5.0, 5.0)]);
    let mut graph = BondGraph::from_system(volume.clone(), &system);
    assert_eq!(graph.num_bonds(), 1);
    let before = system.particles().to_vec();
    let mut mv = BiasUbMove::new(Rc::new(SingleSiteValidator), usize::MAX);
    let mut rng = rng(12);
    let phi = volume.bias_volume() / system.boundary().volume() * 2.0;

    for _ in 0..100 {
        assert!(mv.do_trial(&mut system, &graph, &IdealGas, &mut rng));
        graph.on_trial(&system, mv.affected_particles());
        let kind = mv.last_kind();
        let a = mv.moved_particle();
        let expected = ub_acceptance(2, phi, 1, 2, graph.degree(a), graph.associated_set().len());
        assert_close(mv.acceptance(&system, &graph), expected, 1e-12);
        if kind == UbKind::Unbond && !graph.is_bonded(a) {
            assert_close(expected, 2.0 / phi, 1e-12);
        }

        mv.reject_notify(&mut system);
        graph.on_trial(&system, mv.affected_particles());
        assert_eq!(system.particles(), &before[..]);
        assert_eq!(graph.num_bonds(), 1);
    }
}

#[test]
fn cluster_length_limit_rejects() {
    let volume: Rc<dyn BiasVolume> = Rc::new(BiasVolumeSphere::new(0.0, 1.0));
    let mut system = system_at(30.0, &[DVec3::splat(5.0), DVec3::splat(20.0)]);
    let mut graph = BondGraph::from_system(volume, &system);
    let mut mv = BiasUbMove::new(Rc::new(SingleSiteValidator), 1);
    let mut rng = rng(3);
    while !mv.do_trial(&mut system, &graph, &IdealGas, &mut rng) {}
    graph.on_trial(&system, Affected::All);
    assert_eq!(mv.acceptance(&system, &graph), 0.0);
}

#[test]
fn ideal_gas_bonded_fraction_matches_region_volume() {
    // Two particles in a small box: with no interactions every placement is
    // equally likely, so the pair is bonded with probability v / V.
    let radius = 1.0;
    let edge = 2.45;
    let volume: Rc<dyn BiasVolume> = Rc::new(BiasVolumeSphere::new(0.0, radius));
    let system = system_at(edge, &[DVec3::splat(0.2), DVec3::splat(1.4)]);
    let expected = volume.bias_volume() / edge.powi(3);

    let mut mc = IntegratorMc::new(system, volume, Box::new(IdealGas), 1.0, 77);
    mc.add_move(Box::new(BiasUbMove::new(Rc::new(SingleSiteValidator), usize::MAX)), 1.0);
    mc.run(2_000);

    let steps = 200_000;
    let mut bonded = 0usize;
    for _ in 0..steps {
        mc.step();
        if mc.graph().num_bonds() > 0 {
            bonded += 1;
        }
    }
    let fraction = bonded as f64 / steps as f64;
    assert!(
        (fraction - expected).abs() < 0.02,
        "bonded fraction {fraction}, expected {expected}"
    );
}
