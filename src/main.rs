use std::process::ExitCode;

use apitest_engine::cli::{self, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    apitest_engine::logging::init();
    let cli = Cli::parse();

    match cli::execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            tracing::error!(error = %err.describe(), "run aborted");
            eprintln!("error: {}", err.describe());
            ExitCode::from(2)
        }
    }
}
