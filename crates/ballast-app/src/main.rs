use std::process::ExitCode;

use ballast_engine::core::{LaunchConfig, RunSignal};
use ballast_engine::device::GpuInit;
use ballast_engine::logging::{init_logging, LoggingConfig};
use ballast_engine::physics::RapierBackend;
use ballast_engine::window::Runtime;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let config = LaunchConfig::default();
    log::info!("starting \"{}\" ({}x{})", config.title, config.width, config.height);

    match Runtime::run(config, GpuInit::default(), RapierBackend) {
        Ok(RunSignal::Failure) => ExitCode::FAILURE,
        Ok(signal) => {
            log::info!("exited with {signal:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
