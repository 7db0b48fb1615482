//! Binary entrypoint for the `portguide` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Recording and replay are selected in commands::dispatch via
    // PORTGUIDE_RECORD=<dir> and PORTGUIDE_REPLAY=<path>.
    match portguide::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
