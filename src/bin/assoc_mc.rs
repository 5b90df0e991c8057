// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use anyhow::{Context, Result};
use association::meter::SmerDistribution;
use association::SimulationConfig;
use log::{info, warn};
use std::env;
use std::time::Instant;

fn init_logging() {
    if env::var("RUST_LOG").is_err() {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("association=info,assoc_mc=info"),
        )
        .init();
    } else {
        env_logger::init();
    }
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => {
            info!("no configuration given, using defaults");
            SimulationConfig::default()
        }
    };
    let validator = config.build_validator();
    let mut integrator = config.build_integrator()?;
    info!(
        "{} particles in a box of edge {:.4}, T = {}, P = {}",
        integrator.system().len(),
        integrator.system().boundary().size().x,
        config.temperature,
        config.pressure
    );

    let start = Instant::now();
    integrator.equilibrate(config.equilibration_steps);
    info!("equilibration finished in {:?}", start.elapsed());

    let mut distribution = SmerDistribution::new();
    let mut done = 0;
    while done < config.production_steps {
        let chunk = config.sample_interval.min(config.production_steps - done);
        for _ in 0..chunk {
            integrator.step();
        }
        done += chunk;
        if let Err(err) = distribution.sample(validator.as_ref(), integrator.graph(), integrator.system()) {
            warn!("skipping cluster sample: {err}");
        }
    }

    info!(
        "production finished in {:?}: density {:.5}, {} bonds",
        start.elapsed(),
        integrator.system().density(),
        integrator.graph().num_bonds()
    );
    for stats in integrator.move_stats() {
        info!(
            "  {:<18} acceptance {:.3} over {} trials",
            stats.name,
            stats.acceptance_ratio(),
            stats.attempts
        );
    }
    info!(
        "smers: mean size {:.3}, bonded fraction {:.3}",
        distribution.mean_size(),
        distribution.bonded_fraction()
    );
    for (size, fraction) in distribution.histogram().into_iter().take(8) {
        info!("  {size:>3}-mer mole fraction {fraction:.4}");
    }
    Ok(())
}
