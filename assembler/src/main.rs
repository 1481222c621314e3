//! Hack assembler entry point
//!
//! Usage: `hack-assembler <path>` where `<path>` is one `.asm` file or a
//! directory; each matching file is assembled into `<stem>.hack` next to it.

#![warn(clippy::all, clippy::pedantic)]

use colored::Colorize;
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.asm | directory>", args[0]);
        process::exit(1);
    }

    match hack_assembler::assemble_path(Path::new(&args[1])) {
        Ok(outputs) => {
            for output in outputs {
                println!("Assembled {}", output.display());
            }
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            process::exit(1);
        }
    }
}
