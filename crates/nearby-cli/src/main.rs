//! Nearby - find the vehicles closest to a point
//!
//! Seeds the persisted dataset from a CSV and answers proximity queries
//! against it, printing the same JSON envelope a service would return.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    match commands::execute(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
