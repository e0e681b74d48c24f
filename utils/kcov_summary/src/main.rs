use std::process::ExitCode;

use clap::Parser;
use kcov_summary::app::{self, AppConfig, Args};
use kcov_summary::ProducerError;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();
    app::init_tracing(args.verbose);
    let config = AppConfig::from(args);

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            error!(error = %err, "Cannot read the working directory");
            return ExitCode::FAILURE;
        }
    };

    match app::run(&config, &working_dir) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<ProducerError>()
                .and_then(ProducerError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
