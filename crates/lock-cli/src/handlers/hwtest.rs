//! Hardware test loop
//!
//! Reads commands from stdin and applies them to the configured controller,
//! without any of the claim or key machinery.

use super::{prompt, stdin_lines};
use anyhow::Result;
use lock_agent::{build_hardware, ConfigDir};
use lock_core::effects::{HardwareController, PhysicalTimeEffects};
use lock_core::LockStatus;
use lock_effects::RealTimeHandler;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HwCommand {
    Status,
    Set(LockStatus),
    Quit,
}

/// Commands match on their first letter, case-insensitively
fn parse(line: &str) -> Result<HwCommand, String> {
    let cmd = line.trim().to_lowercase();
    match cmd.chars().next() {
        Some('s') => Ok(HwCommand::Status),
        Some('l') => Ok(HwCommand::Set(LockStatus::Locked)),
        Some('u') => Ok(HwCommand::Set(LockStatus::Unlocked)),
        Some('q' | 'x') => Ok(HwCommand::Quit),
        _ => Err(cmd),
    }
}

/// Run the loop until `quit` or end of input
pub async fn run(config_dir: &Path) -> Result<()> {
    let config = ConfigDir::prepare(config_dir)?.load_config()?;
    let time: Arc<dyn PhysicalTimeEffects> = Arc::new(RealTimeHandler::new());
    let hardware = build_hardware(&config.hardware, time)?.controller;

    println!("Commands are 'status', 'lock', 'unlock' or 'quit'");
    let mut lines = stdin_lines();
    loop {
        prompt();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            Err(e) => {
                println!("ERROR: {e}");
                return Ok(());
            }
        };
        match parse(&line) {
            Ok(HwCommand::Status) => println!("{}", hardware.status()),
            Ok(HwCommand::Set(target)) => {
                if let Err(e) = hardware.set_status(target).await {
                    println!("ERROR: {e}");
                }
            }
            Ok(HwCommand::Quit) => return Ok(()),
            Err(cmd) => println!("ERROR: unrecognized command {cmd:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_match_by_first_letter() {
        assert_eq!(parse("status"), Ok(HwCommand::Status));
        assert_eq!(parse("  S"), Ok(HwCommand::Status));
        assert_eq!(parse("lock"), Ok(HwCommand::Set(LockStatus::Locked)));
        assert_eq!(parse("Unlock"), Ok(HwCommand::Set(LockStatus::Unlocked)));
        assert_eq!(parse("quit"), Ok(HwCommand::Quit));
        assert_eq!(parse("exit"), Err("exit".to_string()));
        assert_eq!(parse("x"), Ok(HwCommand::Quit));
        assert_eq!(parse(""), Err(String::new()));
        assert_eq!(parse("open"), Err("open".to_string()));
    }
}
