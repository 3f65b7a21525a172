use std::process::exit;

use colored::Colorize;

fn main() {
    if let Err(e) = launchlist::app::run_cli() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        exit(1);
    }
}
