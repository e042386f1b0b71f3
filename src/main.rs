//! ACH Builder CLI
//!
//! Reads an ACH file, prints a per-batch summary as CSV and, when an output
//! path is given, writes the normalized file there.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- payments.ach > summary.csv
//! cargo run -- payments.ach normalized.ach
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use ach_builder::{AchError, File, FileSummary, Result, Validate};
use std::env;
use std::io;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(AchError::MissingArgument);
    }

    let input_path = &args[1];
    let mut file = File::read(input_path)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    FileSummary::from_file(&mut file).write_csv(handle)?;

    if let Some(output_path) = args.get(2) {
        if !file.write_to_path(output_path)? {
            return Err(AchError::ValidationFailed {
                count: file.errors().len(),
            });
        }
    }

    Ok(())
}
