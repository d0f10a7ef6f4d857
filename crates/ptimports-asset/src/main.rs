//! Binary entrypoint for the ptimports format asset.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr();
    if let Err(error) = format_asset::telemetry::initialise_from_env() {
        writeln!(stderr, "{error}").ok();
    }

    // stderr stays unlocked: the tracing subscriber writes to it too.
    let mut stdout = io::stdout().lock();
    ptimports_asset::run(std::env::args_os(), &mut stdout, &mut stderr)
}
