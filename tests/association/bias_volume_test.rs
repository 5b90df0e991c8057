// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Tests for the bias volume family.
//
// Every variant must place the inserted particle inside the bonding region,
// keep the predicate symmetric, and report a volume that matches a Monte
// Carlo estimate of the region it tests for.

use crate::common::{assert_close, pointing, random_system, rng, system_at};
use association::association::bias_volume::{
    cap_fraction, shell_volume, BiasVolume, BiasVolumeCube, BiasVolumeDocking, BiasVolumeSphere,
    BiasVolumeSphereOriented, BiasVolumeSphereOrientedDoubleSites,
};
use association::space::{sampling, Particle, ParticleSystem};
use glam::f64::DVec3;
use rand_chacha::ChaCha8Rng;

const INSERTIONS: usize = 10_000;

fn boxed<V: BiasVolume + 'static>(volume: V) -> Box<dyn BiasVolume> {
    Box::new(volume)
}

fn all_variants() -> Vec<(&'static str, Box<dyn BiasVolume>)> {
    vec![
        ("cube", boxed(BiasVolumeCube::centered(0.8))),
        (
            "cube_offset",
            boxed(BiasVolumeCube::new(1.0, DVec3::new(0.3, -0.2, 0.1))),
        ),
        ("sphere", boxed(BiasVolumeSphere::new(0.9, 1.2))),
        (
            "sphere_oriented",
            boxed(BiasVolumeSphereOriented::new(0.0, 1.1, 27f64.to_radians())),
        ),
        (
            "sphere_oriented_double",
            boxed(BiasVolumeSphereOrientedDoubleSites::new(
                0.5,
                1.1,
                27f64.to_radians(),
            )),
        ),
        ("docking", boxed(BiasVolumeDocking::acetic_acid())),
    ]
}

/// Fraction of uniformly random placements of particle 0 (position in the
/// cube of half-edge `half` around particle 1, random orientation) that bond.
fn estimate_volume(volume: &dyn BiasVolume, b: Particle, half: f64, samples: usize, rng: &mut ChaCha8Rng) -> f64 {
    let edge = 8.0 * half;
    let mut system = system_at(edge, &[DVec3::ZERO, DVec3::ZERO]);
    let center = DVec3::splat(0.5 * edge);
    system.set_particle(1, Particle::with_orientation(center, b.orientation));
    let mut hits = 0usize;
    for _ in 0..samples {
        system.set_position(0, center + sampling::random_in_cube(half, rng));
        system.set_orientation(0, sampling::random_rotation(rng));
        if volume.is_associated(&system, 0, 1) {
            hits += 1;
        }
    }
    hits as f64 / samples as f64 * (2.0 * half).powi(3)
}

// ============================================================================
// bias_insert postcondition
// ============================================================================

#[test]
fn insert_always_bonds_for_every_variant() {
    let mut rng = rng(2024);
    for (name, volume) in all_variants() {
        let edge = 6.0 * volume.capture_radius();
        let mut system = random_system(2, edge, &mut rng);
        for i in 0..INSERTIONS {
            // Fresh random partner each time.
            let position = system.boundary().random_position(&mut rng);
            system.set_position(1, position);
            system.set_orientation(1, sampling::random_rotation(&mut rng));

            volume.insert_associated(&mut system, 0, 1, &mut rng);
            assert!(
                volume.is_associated(&system, 0, 1),
                "{name}: insertion {i} left the pair unbonded"
            );
            assert!(
                volume.is_associated(&system, 1, 0),
                "{name}: predicate not symmetric after insertion {i}"
            );
            assert!(
                system.separation(1, 0).length() <= volume.capture_radius(),
                "{name}: bonded pair beyond the capture radius"
            );
        }
    }
}

#[test]
fn predicate_is_symmetric_for_random_pairs() {
    let mut rng = rng(99);
    for (name, volume) in all_variants() {
        let edge = 3.0 * volume.capture_radius();
        for _ in 0..2_000 {
            let system = random_system(2, edge, &mut rng);
            assert_eq!(
                volume.is_associated(&system, 0, 1),
                volume.is_associated(&system, 1, 0),
                "{name}: asymmetric predicate"
            );
        }
    }
}

#[test]
fn oriented_bond_needs_both_axes_facing() {
    let volume = BiasVolumeSphereOriented::new(0.0, 1.1, 27f64.to_radians());
    let a = DVec3::splat(5.0);
    let b = a + DVec3::X;
    let facing = ParticleSystem::from_particles(
        association::PeriodicBoundary::cubic(10.0),
        vec![pointing(a, DVec3::X), pointing(b, -DVec3::X)],
    );
    assert!(volume.is_associated(&facing, 0, 1));

    let away = ParticleSystem::from_particles(
        association::PeriodicBoundary::cubic(10.0),
        vec![pointing(a, DVec3::X), pointing(b, DVec3::X)],
    );
    assert!(!volume.is_associated(&away, 0, 1));
}

#[test]
fn double_sites_bond_through_either_end() {
    let volume = BiasVolumeSphereOrientedDoubleSites::new(0.0, 1.1, 27f64.to_radians());
    let a = DVec3::splat(5.0);
    let b = a + DVec3::X;
    for (axis_a, axis_b) in [
        (DVec3::X, DVec3::X),
        (-DVec3::X, DVec3::X),
        (DVec3::X, -DVec3::X),
        (-DVec3::X, -DVec3::X),
    ] {
        let system = ParticleSystem::from_particles(
            association::PeriodicBoundary::cubic(10.0),
            vec![pointing(a, axis_a), pointing(b, axis_b)],
        );
        assert!(volume.is_associated(&system, 0, 1));
    }
    let sideways = ParticleSystem::from_particles(
        association::PeriodicBoundary::cubic(10.0),
        vec![pointing(a, DVec3::Y), pointing(b, DVec3::X)],
    );
    assert!(!volume.is_associated(&sideways, 0, 1));
}

// ============================================================================
// Region volumes
// ============================================================================

#[test]
fn analytic_volumes() {
    let sphere = BiasVolumeSphere::new(1.0, 2.0);
    assert_close(sphere.bias_volume(), 4.0 / 3.0 * std::f64::consts::PI * 7.0, 1e-12);

    let theta = 60f64.to_radians();
    let f = cap_fraction(theta.cos());
    assert_close(f, 0.25, 1e-12);
    let single = BiasVolumeSphereOriented::new(0.0, 1.0, theta);
    assert_close(single.bias_volume(), shell_volume(0.0, 1.0) * f * f, 1e-12);
    let double = BiasVolumeSphereOrientedDoubleSites::new(0.0, 1.0, 50f64.to_radians());
    let g = 2.0 * cap_fraction(50f64.to_radians().cos());
    assert_close(double.bias_volume(), shell_volume(0.0, 1.0) * g * g, 1e-12);

    assert_close(BiasVolumeCube::centered(0.5).bias_volume(), 0.125, 1e-12);
    // Cubes at +-0.3 along x overlap in a 0.4 x 1 x 1 slab.
    let offset = BiasVolumeCube::new(1.0, DVec3::new(0.3, 0.0, 0.0));
    assert_close(offset.bias_volume(), 1.6, 1e-12);
}

#[test]
fn volumes_match_monte_carlo_estimates() {
    let mut rng = rng(5);
    let b = Particle::with_orientation(DVec3::ZERO, sampling::random_rotation(&mut rng));
    let cases: Vec<(&str, Box<dyn BiasVolume>)> = vec![
        ("sphere", boxed(BiasVolumeSphere::new(0.5, 1.0))),
        (
            "sphere_oriented",
            boxed(BiasVolumeSphereOriented::new(0.0, 1.0, 60f64.to_radians())),
        ),
        (
            "sphere_oriented_double",
            boxed(BiasVolumeSphereOrientedDoubleSites::new(0.0, 1.0, 50f64.to_radians())),
        ),
        (
            "cube_offset",
            boxed(BiasVolumeCube::new(1.0, DVec3::new(0.3, 0.0, 0.0))),
        ),
    ];
    for (name, volume) in cases {
        let half = volume.capture_radius();
        let estimate = estimate_volume(volume.as_ref(), b, half, 200_000, &mut rng);
        let exact = volume.bias_volume();
        assert!(
            ((estimate - exact) / exact).abs() < 0.05,
            "{name}: estimated {estimate}, analytic {exact}"
        );
    }
}

#[test]
fn docking_volume_accounts_for_overlap() {
    let docking = BiasVolumeDocking::acetic_acid();
    let q = docking.overlap_fraction();
    assert!((0.0..=1.0).contains(&q), "overlap fraction {q}");
    assert_close(
        docking.bias_volume(),
        docking.single_direction_volume() * (2.0 - q),
        1e-12,
    );
    // shell(1.8, 2.3) * 0.5 * (1 - 0.7) * 0.5 * (0.5)
    assert_close(
        docking.single_direction_volume(),
        shell_volume(1.8, 2.3) * 0.15 * 0.25,
        1e-12,
    );
}

#[test]
fn docking_insertions_use_both_donation_directions() {
    let docking = BiasVolumeDocking::acetic_acid();
    let mut rng = rng(17);
    let edge = 6.0 * docking.capture_radius();
    let mut system = random_system(2, edge, &mut rng);
    let sites = *docking.sites();
    let mut inserted_donates = 0;
    let trials = 2_000;
    for _ in 0..trials {
        docking.insert_associated(&mut system, 0, 1, &mut rng);
        let a = system.particle(0);
        let b = system.particle(1);
        let dr = system.separation(1, 0);
        // Hydrogen of the inserted molecule near the partner's acceptor oxygen.
        let h = dr + a.orientation * sites.hydrogen;
        let o = b.orientation * sites.acceptor_oxygen;
        let r = (h - o).length();
        if (1.8..=2.3).contains(&r) {
            inserted_donates += 1;
        }
    }
    let fraction = inserted_donates as f64 / trials as f64;
    // Overlapping configurations count towards this side, so it may exceed 1/2.
    assert!(
        (0.35..0.95).contains(&fraction),
        "inserted molecule donated in {fraction} of insertions"
    );
}

#[test]
fn cube_insertion_covers_both_offset_cubes() {
    let cube = BiasVolumeCube::new(0.5, DVec3::new(1.0, 0.0, 0.0));
    let mut rng = rng(3);
    let mut system = system_at(10.0, &[DVec3::ZERO, DVec3::splat(5.0)]);
    let mut positive = 0;
    for _ in 0..1_000 {
        cube.insert_associated(&mut system, 0, 1, &mut rng);
        if system.separation(1, 0).x > 0.0 {
            positive += 1;
        }
    }
    assert!((400..600).contains(&positive), "{positive} of 1000 on the +x side");
}
