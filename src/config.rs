// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Simulation parameters, loaded from TOML.
//
// Every field has a default, so a config file only needs the values it
// changes. The defaults describe a two-site associating fluid near the
// conditions of the classic NPT double-site study: hard spheres with a deep
// square-well bond, 27 degree bonding cones, T = 2, P = 0.17, rho = 0.2.

use crate::association::bias_volume::{
    BiasVolume, BiasVolumeCube, BiasVolumeDocking, BiasVolumeSphere, BiasVolumeSphereOriented,
    BiasVolumeSphereOrientedDoubleSites, DockingSites,
};
use crate::association::topology::{
    BranchedValidator, DoubleSiteValidator, SingleSiteValidator, TopologyValidator,
};
use crate::mc::{
    AssociationWell, BiasUbMove, BondedDisplaceMove, IdealGas, IntegratorMc, MonomerDisplaceMove,
    PotentialEnergy, RotateAssociatedMove, SmerRotateMove, SmerTranslateMove,
    VolumeAssociatedMove,
};
use crate::space::{ParticleSystem, PeriodicBoundary};
use glam::f64::DVec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Bonding geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BiasConfig {
    Cube {
        edge: f64,
        #[serde(default)]
        offset: [f64; 3],
    },
    Sphere {
        inner: f64,
        outer: f64,
    },
    SphereOriented {
        inner: f64,
        outer: f64,
        theta_degrees: f64,
    },
    SphereOrientedDoubleSites {
        inner: f64,
        outer: f64,
        theta_degrees: f64,
    },
    /// Carboxylic-acid docking with the built-in site layout.
    Docking {
        inner: f64,
        outer: f64,
        max_cos_oho: f64,
        min_cos_hoc: f64,
        max_cos_hoc: f64,
    },
}

/// Bonding-site constraints enforced on cluster walks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyConfig {
    Single,
    /// Two sites per particle; partners closer than `min_partner_distance`
    /// share a site. Must be positive.
    Double {
        #[serde(default = "default_min_partner_distance")]
        min_partner_distance: f64,
    },
    /// Up to `max_bonds` partners. A `min_partner_distance` of zero turns the
    /// shared-site check off, for bias volumes without distinct sites.
    Branched {
        max_bonds: usize,
        #[serde(default = "default_min_partner_distance")]
        min_partner_distance: f64,
    },
}

/// One and a half hard-sphere diameters: two partners on one site overlap.
pub const DEFAULT_MIN_PARTNER_DISTANCE: f64 = 1.5;

fn default_min_partner_distance() -> f64 {
    DEFAULT_MIN_PARTNER_DISTANCE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PotentialConfig {
    IdealGas,
    AssociationWell { sigma: f64, epsilon: f64 },
}

/// Relative selection weights; a zero weight leaves the move out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveWeights {
    pub bias_ub: f64,
    pub monomer_displace: f64,
    pub bonded_displace: f64,
    pub rotate_associated: f64,
    pub smer_translate: f64,
    pub smer_rotate: f64,
    pub volume: f64,
}

impl Default for MoveWeights {
    fn default() -> Self {
        Self {
            bias_ub: 1.0,
            monomer_displace: 1.0,
            bonded_displace: 1.0,
            rotate_associated: 1.0,
            smer_translate: 1.0,
            smer_rotate: 1.0,
            volume: 0.1,
        }
    }
}

/// Initial step sizes; tuned during equilibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub displacement: f64,
    pub rotation: f64,
    pub ln_volume: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            displacement: 0.2,
            rotation: 0.3,
            ln_volume: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub particles: usize,
    /// Initial number density.
    pub density: f64,
    pub temperature: f64,
    pub pressure: f64,
    /// Largest cluster the moves may create; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cluster_length: Option<usize>,
    pub equilibration_steps: u64,
    pub production_steps: u64,
    /// Trials between cluster-distribution samples.
    pub sample_interval: u64,
    pub bias: BiasConfig,
    pub topology: TopologyConfig,
    pub potential: PotentialConfig,
    pub moves: MoveWeights,
    pub steps: StepConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            particles: 256,
            density: 0.2,
            temperature: 2.0,
            pressure: 0.17,
            max_cluster_length: None,
            equilibration_steps: 20_000,
            production_steps: 100_000,
            sample_interval: 1_000,
            bias: BiasConfig::SphereOrientedDoubleSites {
                inner: 0.0,
                outer: 1.1,
                theta_degrees: 27.0,
            },
            topology: TopologyConfig::Double {
                min_partner_distance: DEFAULT_MIN_PARTNER_DISTANCE,
            },
            potential: PotentialConfig::AssociationWell {
                sigma: 1.0,
                epsilon: 16.0,
            },
            moves: MoveWeights::default(),
            steps: StepConfig::default(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

impl SimulationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Rejects parameters the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particles < 2 {
            return Err(invalid("at least two particles are required"));
        }
        if !(self.density > 0.0) {
            return Err(invalid(format!("density must be positive, got {}", self.density)));
        }
        if !(self.temperature > 0.0) {
            return Err(invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if matches!(self.max_cluster_length, Some(n) if n < 2) {
            return Err(invalid("max_cluster_length must allow at least a dimer"));
        }
        if self.sample_interval == 0 {
            return Err(invalid("sample_interval must be positive"));
        }

        let shell = |inner: f64, outer: f64| {
            if inner < 0.0 || inner >= outer {
                Err(invalid(format!("invalid bonding shell [{inner}, {outer}]")))
            } else {
                Ok(())
            }
        };
        match &self.bias {
            BiasConfig::Cube { edge, .. } if *edge <= 0.0 => {
                return Err(invalid(format!("cube edge must be positive, got {edge}")));
            }
            BiasConfig::Cube { .. } => {}
            BiasConfig::Sphere { inner, outer } => shell(*inner, *outer)?,
            BiasConfig::SphereOriented {
                inner,
                outer,
                theta_degrees,
            } => {
                shell(*inner, *outer)?;
                if !(*theta_degrees > 0.0 && *theta_degrees <= 180.0) {
                    return Err(invalid(format!("theta out of range: {theta_degrees}")));
                }
            }
            BiasConfig::SphereOrientedDoubleSites {
                inner,
                outer,
                theta_degrees,
            } => {
                shell(*inner, *outer)?;
                if !(*theta_degrees > 0.0 && *theta_degrees < 90.0) {
                    return Err(invalid(format!(
                        "double-site theta must lie in (0, 90) degrees, got {theta_degrees}"
                    )));
                }
            }
            BiasConfig::Docking {
                inner,
                outer,
                max_cos_oho,
                min_cos_hoc,
                max_cos_hoc,
            } => {
                shell(*inner, *outer)?;
                if !(-1.0..1.0).contains(max_cos_oho) {
                    return Err(invalid(format!("max_cos_oho out of range: {max_cos_oho}")));
                }
                if !(-1.0 <= *min_cos_hoc && min_cos_hoc < max_cos_hoc && *max_cos_hoc <= 1.0) {
                    return Err(invalid(format!(
                        "invalid HOC window [{min_cos_hoc}, {max_cos_hoc}]"
                    )));
                }
            }
        }

        match self.topology {
            TopologyConfig::Single => {}
            TopologyConfig::Double {
                min_partner_distance,
            } => {
                if !(min_partner_distance > 0.0) {
                    return Err(invalid(format!(
                        "min_partner_distance must be positive for double sites, got {min_partner_distance}"
                    )));
                }
            }
            TopologyConfig::Branched {
                max_bonds,
                min_partner_distance,
            } => {
                if max_bonds == 0 {
                    return Err(invalid("max_bonds must be positive"));
                }
                if !(min_partner_distance >= 0.0) {
                    return Err(invalid(format!(
                        "min_partner_distance must not be negative, got {min_partner_distance}"
                    )));
                }
            }
        }
        if let PotentialConfig::AssociationWell { sigma, .. } = self.potential {
            if sigma < 0.0 {
                return Err(invalid(format!("sigma must not be negative, got {sigma}")));
            }
        }

        let w = &self.moves;
        let weights = [
            w.bias_ub,
            w.monomer_displace,
            w.bonded_displace,
            w.rotate_associated,
            w.smer_translate,
            w.smer_rotate,
            w.volume,
        ];
        if weights.iter().any(|&x| x < 0.0) {
            return Err(invalid("move weights must not be negative"));
        }
        if weights.iter().all(|&x| x == 0.0) {
            return Err(invalid("at least one move needs a positive weight"));
        }

        let edge = self.box_edge();
        let capture = self.build_bias_volume().capture_radius();
        if capture >= 0.5 * edge {
            return Err(invalid(format!(
                "box edge {edge:.3} too small for capture radius {capture:.3}"
            )));
        }
        Ok(())
    }

    /// Edge of the cubic box holding `particles` at `density`.
    pub fn box_edge(&self) -> f64 {
        (self.particles as f64 / self.density).cbrt()
    }

    pub fn build_bias_volume(&self) -> Rc<dyn BiasVolume> {
        match self.bias {
            BiasConfig::Cube { edge, offset } => {
                Rc::new(BiasVolumeCube::new(edge, DVec3::from_array(offset)))
            }
            BiasConfig::Sphere { inner, outer } => Rc::new(BiasVolumeSphere::new(inner, outer)),
            BiasConfig::SphereOriented {
                inner,
                outer,
                theta_degrees,
            } => Rc::new(BiasVolumeSphereOriented::new(
                inner,
                outer,
                theta_degrees.to_radians(),
            )),
            BiasConfig::SphereOrientedDoubleSites {
                inner,
                outer,
                theta_degrees,
            } => Rc::new(BiasVolumeSphereOrientedDoubleSites::new(
                inner,
                outer,
                theta_degrees.to_radians(),
            )),
            BiasConfig::Docking {
                inner,
                outer,
                max_cos_oho,
                min_cos_hoc,
                max_cos_hoc,
            } => Rc::new(BiasVolumeDocking::new(
                DockingSites::carboxylic_acid(),
                inner,
                outer,
                max_cos_oho,
                min_cos_hoc,
                max_cos_hoc,
            )),
        }
    }

    pub fn build_validator(&self) -> Rc<dyn TopologyValidator> {
        match self.topology {
            TopologyConfig::Single => Rc::new(SingleSiteValidator),
            TopologyConfig::Double {
                min_partner_distance,
            } => Rc::new(DoubleSiteValidator::new(min_partner_distance)),
            TopologyConfig::Branched {
                max_bonds,
                min_partner_distance,
            } => Rc::new(BranchedValidator::new(max_bonds, min_partner_distance)),
        }
    }

    pub fn build_potential(&self) -> Box<dyn PotentialEnergy> {
        match self.potential {
            PotentialConfig::IdealGas => Box::new(IdealGas),
            PotentialConfig::AssociationWell { sigma, epsilon } => {
                Box::new(AssociationWell::new(sigma, epsilon))
            }
        }
    }

    /// Builds the system on a simple cubic lattice and registers every move
    /// with a positive weight.
    pub fn build_integrator(&self) -> Result<IntegratorMc, ConfigError> {
        self.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let boundary = PeriodicBoundary::cubic(self.box_edge());
        let system = ParticleSystem::simple_cubic(boundary, self.particles, &mut rng);

        let volume = self.build_bias_volume();
        let validator = self.build_validator();
        let mut integrator = IntegratorMc::new(
            system,
            volume,
            self.build_potential(),
            self.temperature,
            self.seed.wrapping_add(1),
        );
        integrator.set_pressure(self.pressure);

        let max_len = self.max_cluster_length.unwrap_or(usize::MAX);
        let max_step = 0.5 * self.box_edge();
        let s = &self.steps;
        let w = &self.moves;
        if w.bias_ub > 0.0 {
            integrator.add_move(Box::new(BiasUbMove::new(validator.clone(), max_len)), w.bias_ub);
        }
        if w.monomer_displace > 0.0 {
            integrator.add_move(
                Box::new(MonomerDisplaceMove::new(s.displacement, max_step)),
                w.monomer_displace,
            );
        }
        if w.bonded_displace > 0.0 {
            integrator.add_move(
                Box::new(BondedDisplaceMove::new(
                    validator.clone(),
                    max_len,
                    s.displacement,
                    max_step,
                )),
                w.bonded_displace,
            );
        }
        if w.rotate_associated > 0.0 {
            integrator.add_move(
                Box::new(RotateAssociatedMove::new(validator.clone(), max_len, s.rotation)),
                w.rotate_associated,
            );
        }
        if w.smer_translate > 0.0 {
            integrator.add_move(
                Box::new(SmerTranslateMove::new(validator.clone(), s.displacement, max_step)),
                w.smer_translate,
            );
        }
        if w.smer_rotate > 0.0 {
            integrator.add_move(
                Box::new(SmerRotateMove::new(validator.clone(), s.rotation)),
                w.smer_rotate,
            );
        }
        if w.volume > 0.0 {
            integrator.add_move(
                Box::new(VolumeAssociatedMove::new(validator, s.ln_volume)),
                w.volume,
            );
        }
        Ok(integrator)
    }
}
