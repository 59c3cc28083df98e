//! texlift - Command-line tool for alpha-aware upscaling of color-keyed game textures

use std::process::ExitCode;

use texlift::cli;

fn main() -> ExitCode {
    cli::run()
}
