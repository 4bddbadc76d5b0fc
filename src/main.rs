use std::process::ExitCode;

use fs_lifecycle::FsError;
use fs_lifecycle::cli;
use fs_lifecycle::output as out;

mod app;
mod logging;

fn main() -> ExitCode {
    let args = cli::parse();
    match app::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            if e.downcast_ref::<FsError>().is_some_and(FsError::is_cancelled) {
                ExitCode::from(130)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
