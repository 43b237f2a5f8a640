#[macro_use]
extern crate log;

mod options;

use clap::Parser;
use options::*;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use tof_core::base::*;
use tof_core::decomposition::*;
use tof_core::film::*;
use tof_core::paramset::*;
use tof_core::{print_stats, stats::*};
use tof_filters::create_filter_from_params;
use tof_integrators::*;
use tof_samplers::RandomSampler;
use tof_scenes::FogScene;

fn main() -> ExitCode {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();
    match render(&options) {
        Ok(()) => {
            if !options.quiet {
                print_stats!();
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn render(options: &Options) -> Result<(), String> {
    let mut params = ParamSet::new();
    for assignment in options.params.iter() {
        params.add_assignment(assignment)?;
    }

    let filter = create_filter_from_params(&params)?;
    let decomposition = DecompositionConfig::try_from((&params, filter))?;
    let scene = FogScene::try_from(&params)?;
    let config = BdptConfig::try_from(&params)?;
    params.report_unused();

    let sampler = Box::new(RandomSampler::new(config.sample_count, options.seed));
    let film = Film::new(&decomposition);
    let integrator = BdptIntegrator::new(config, decomposition, sampler)?;

    let render_options = RenderOptions {
        threads: options.threads(),
        tile_size: options.tile_size,
        quiet: options.quiet,
    };
    let stop = AtomicBool::new(false);
    integrator.render(&scene, &film, &render_options, &stop)?;

    let written = film.write_images(&options.image_file, 1.0 / config.sample_count as Float)?;
    if !options.quiet {
        for path in written.iter() {
            println!("{path}");
        }
    }
    Ok(())
}
