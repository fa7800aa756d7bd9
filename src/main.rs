use std::process::ExitCode;

use log::error;
use tensorref::{
    config::GeneratorConfig,
    generator::{FixtureSet, Generator},
    logging,
};

fn main() -> ExitCode {
    logging::init_from_env();

    let config = GeneratorConfig::from_env();
    let mut generator = Generator::new(config);

    match generator.run_configured(&FixtureSet::default_batch()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fixture generation failed: {err}");
            ExitCode::FAILURE
        }
    }
}
