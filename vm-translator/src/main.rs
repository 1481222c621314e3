//! VM translator entry point
//!
//! Usage: `hack-vm-translator <path>` where `<path>` is one `.vm` file or a
//! directory. A directory translates to `<dir>/<basename>.asm` with the
//! bootstrap prepended; a file translates to `<stem>.asm` without it.

#![warn(clippy::all, clippy::pedantic)]

use colored::Colorize;
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.vm | directory>", args[0]);
        process::exit(1);
    }

    match hack_vm_translator::translate_path(Path::new(&args[1])) {
        Ok(output) => println!("Translated to {}", output.display()),
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            process::exit(1);
        }
    }
}
