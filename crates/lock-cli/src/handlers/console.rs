//! Operator console
//!
//! The console acts as a local owner principal on the daemon's network: it
//! can claim the daemon, operate the lock with the resulting key, list the
//! keys it holds, and flip simulated hardware by hand.

use super::{prompt, Input};
use lock_agent::{
    claim_lock, query_status, scan_neighborhood, update_status, DaemonHandle, DaemonPhase,
};
use lock_authorization::CredentialStore;
use lock_core::effects::{DiscoveryEffects, ExternalToggle, TransportEffects};
use lock_core::naming::LOCK_NH_PREFIX;
use lock_core::{LockResult, LockStatus};
use std::sync::Arc;

const HELP: &str = "\
Commands:
  claim <name>     claim the unclaimed daemon as <name>
  lock <name>      lock <name>
  unlock <name>    unlock <name>
  status <name>    show the status of <name>
  listkeys         list the keys held by this console
  scan             list locks in the neighborhood
  toggle           flip simulated hardware as if by hand
  help             show this text
  quit             stop the daemon and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Claim(String),
    Set(String, LockStatus),
    Status(String),
    ListKeys,
    Scan,
    Toggle,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next().map(str::to_string);
        if words.next().is_some() {
            return Err(format!("too many arguments to {verb}"));
        }
        let named = |build: fn(String) -> Self| {
            arg.clone()
                .map(build)
                .ok_or_else(|| format!("{verb} needs a lock name"))
        };
        let bare = |command: Self| match &arg {
            Some(_) => Err(format!("{verb} takes no arguments")),
            None => Ok(command),
        };
        let command = match verb.to_lowercase().as_str() {
            "claim" => named(Self::Claim)?,
            "lock" => named(|name| Self::Set(name, LockStatus::Locked))?,
            "unlock" => named(|name| Self::Set(name, LockStatus::Unlocked))?,
            "status" => named(Self::Status)?,
            "listkeys" => bare(Self::ListKeys)?,
            "scan" => bare(Self::Scan)?,
            "toggle" => bare(Self::Toggle)?,
            "help" => bare(Self::Help)?,
            "quit" | "exit" => bare(Self::Quit)?,
            other => return Err(format!("unrecognized command {other:?}")),
        };
        Ok(Some(command))
    }
}

/// What the console operates on
pub struct Console<'a> {
    pub transport: Arc<dyn TransportEffects>,
    pub discovery: Arc<dyn DiscoveryEffects>,
    pub store: CredentialStore,
    pub daemon: &'a DaemonHandle,
    pub toggle: Option<Arc<dyn ExternalToggle>>,
}

impl Console<'_> {
    /// Read commands until `quit` or end of input
    pub async fn run(&self, mut lines: Input) {
        println!("{HELP}");
        loop {
            prompt();
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return,
                Err(e) => {
                    println!("ERROR: {e}");
                    return;
                }
            };
            match ConsoleCommand::parse(&line) {
                Ok(None) => {}
                Ok(Some(ConsoleCommand::Quit)) => return,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command).await {
                        println!("ERROR: {e}");
                    }
                }
                Err(message) => println!("ERROR: {message}"),
            }
        }
    }

    async fn execute(&self, command: ConsoleCommand) -> LockResult<()> {
        match command {
            ConsoleCommand::Claim(name) => {
                let phase = self.daemon.phase();
                let DaemonPhase::Unclaimed { nh_name } = &phase else {
                    println!("ERROR: daemon is not unclaimed ({phase:?})");
                    return Ok(());
                };
                let device = nh_name.strip_prefix(LOCK_NH_PREFIX).unwrap_or(nh_name);
                let key = claim_lock(self.transport.as_ref(), &self.store, device, &name).await?;
                println!("Claimed lock: {device} as {name} and received key: {key}");
            }
            ConsoleCommand::Set(name, status) => {
                update_status(self.transport.as_ref(), &name, status).await?;
                println!("Updated lock {name} to status: {status}");
            }
            ConsoleCommand::Status(name) => {
                let status = query_status(self.transport.as_ref(), &name).await?;
                println!("lock {name} is: {status}");
            }
            ConsoleCommand::ListKeys => {
                let listing = self.store.list().await?;
                println!("{:<30}   Key (Expires: <expiry time>)", "Lock");
                for entry in listing.iter() {
                    println!(
                        "{:<30}   {} (Expires: {})",
                        entry.lock_name, entry.key, entry.expires
                    );
                }
            }
            ConsoleCommand::Scan => {
                println!("Scanning for Locks...");
                for entry in scan_neighborhood(self.discovery.as_ref(), LOCK_NH_PREFIX).await? {
                    println!("{entry}");
                }
            }
            ConsoleCommand::Toggle => match &self.toggle {
                Some(toggle) => println!("hardware is now {}", toggle.toggle_externally()),
                None => println!("ERROR: hardware is not simulated"),
            },
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ConsoleCommand::parse("claim front_door"),
            Ok(Some(ConsoleCommand::Claim("front_door".to_string())))
        );
        assert_eq!(
            ConsoleCommand::parse("  UNLOCK  front_door "),
            Ok(Some(ConsoleCommand::Set(
                "front_door".to_string(),
                LockStatus::Unlocked
            )))
        );
        assert_eq!(ConsoleCommand::parse("listkeys"), Ok(Some(ConsoleCommand::ListKeys)));
        assert_eq!(ConsoleCommand::parse("exit"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(ConsoleCommand::parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(ConsoleCommand::parse("lock").is_err());
        assert!(ConsoleCommand::parse("scan now").is_err());
        assert!(ConsoleCommand::parse("claim a b").is_err());
        assert!(ConsoleCommand::parse("open front_door").is_err());
    }
}
