//! Jack compiler entry point
//!
//! Usage: `jack-compiler <path>` where `<path>` is one `.jack` file or a
//! directory; each matching file compiles to `<stem>.vm` next to it.

#![warn(clippy::all, clippy::pedantic)]

use colored::Colorize;
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack | directory>", args[0]);
        process::exit(1);
    }

    match jack_compiler::compile_path(Path::new(&args[1])) {
        Ok(outputs) => {
            for output in outputs {
                println!("Compiled {}", output.display());
            }
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            process::exit(1);
        }
    }
}
