//! Subcommand handlers

pub mod console;
pub mod hwtest;
pub mod run;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line reader over stdin
pub type Input = Lines<BufReader<Stdin>>;

/// Open stdin for line-at-a-time reading
pub fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Print the prompt and flush it
pub fn prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}
