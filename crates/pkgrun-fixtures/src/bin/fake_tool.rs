//! Fixture: replays a recorded package-tool transcript.
//! Used for testing progress classification end to end.
//!
//! Usage: `pkgrun-fake-tool <apt|apt-es|dpkg|wget|unzip|flatpak> [delay_ms] [exit_code]`

// Test fixtures require special allowances - they are not production code
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]
#![allow(clippy::exit)]

use pkgrun_fixtures::transcript_for;
use std::env;
use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    let args: Vec<String> = env::args().collect();
    let name = args.get(1).map(String::as_str).unwrap_or("apt");
    let delay_ms: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
    let code: i32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);

    let Some(lines) = transcript_for(name) else {
        eprintln!("unknown transcript: {name}");
        process::exit(2);
    };

    let mut stdout = io::stdout();
    for line in lines {
        println!("{line}");
        stdout.flush().ok();
        if delay_ms > 0 {
            thread::sleep(Duration::from_millis(delay_ms));
        }
    }

    process::exit(code);
}
