//! kubedeploy binary entry point.

use std::process::ExitCode;

use kubedeploy::ui::output;

fn main() -> ExitCode {
    match kubedeploy::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
