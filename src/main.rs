// src/main.rs

use std::process::ExitCode;

use sidepipe::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("sidepipe: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Partial tool text, if any, is already on stdout.
            eprintln!("sidepipe error: {err}");
            ExitCode::FAILURE
        }
    }
}
