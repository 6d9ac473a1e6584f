use aggregation_lib::cli::Cli;
use aggregation_lib::config;
use aggregation_lib::simulation::Simulation;
use clap::Parser;
use log::info;

fn main() {
    env_logger::init();

    // A missing argument exits with clap's usage code 2; every other
    // failure below is user input and exits with 1.
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    let mut simulation = match Simulation::from_config(&config) {
        Ok(simulation) => simulation,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };
    info!(
        "starting run: {} particles, duration {}",
        simulation.ensemble().num_particles(),
        config.duration
    );

    match simulation.run() {
        Ok(summary) => {
            println!(
                "Completed {} steps covering {:.6} simulated time units in {:.3} s ({} checkpoints)",
                summary.total_steps,
                summary.simulation_time,
                summary.wall_time.as_secs_f64(),
                summary.checkpoints_saved
            );
        }
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
}
