//! Interactive shell over the report commands

use crate::auth::{
    restore_session, run_login_flow, verify_session, SessionState, TerminalPrompter, TokenLogin,
};
use crate::catalog::AudibleClient;
use crate::commands::init::choose_marketplace;
use crate::commands::new::{check_new_releases, report_lines};
use crate::commands::rank::{rank_lines, ranked_wishlist};
use crate::config::Config;
use crate::marketplace::{Marketplace, MARKETPLACES};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    New,
    Rank,
    Markets,
    Quit,
}

/// Every shell command with the names it answers to and its help text
pub const REPL_COMMANDS: &[(ReplCommand, &[&str], &str)] = &[
    (ReplCommand::Help, &["help"], "Show command list"),
    (
        ReplCommand::New,
        &["new"],
        "Show latest audiobooks from series in your library",
    ),
    (
        ReplCommand::Rank,
        &["rank"],
        "Rank your wishlist by review score weighted with review count",
    ),
    (ReplCommand::Markets, &["markets"], "List supported marketplaces"),
    (ReplCommand::Quit, &["quit", "exit"], "Exit the program"),
];

impl ReplCommand {
    pub fn parse(input: &str) -> Option<Self> {
        let wanted = input.trim().to_lowercase();
        REPL_COMMANDS
            .iter()
            .find(|(_, names, _)| names.contains(&wanted.as_str()))
            .map(|(command, _, _)| *command)
    }
}

pub fn help_lines() -> Vec<String> {
    REPL_COMMANDS
        .iter()
        .map(|(_, names, help)| format!("{}:\n  {}", names.join("|"), help))
        .collect()
}

struct Shell {
    config: Config,
    marketplace: Marketplace,
    client: AudibleClient,
}

impl Shell {
    async fn execute(&self, command: ReplCommand) -> Result<Vec<String>> {
        match command {
            ReplCommand::Help => Ok(help_lines()),
            ReplCommand::New => {
                let fan_out =
                    check_new_releases(&self.client, &self.config, self.marketplace, true).await?;
                Ok(report_lines(&fan_out))
            }
            ReplCommand::Rank => {
                let ranked = ranked_wishlist(&self.client).await?;
                Ok(rank_lines(&ranked, None))
            }
            ReplCommand::Markets => Ok(MARKETPLACES.iter().map(|m| m.to_string()).collect()),
            ReplCommand::Quit => Ok(Vec::new()),
        }
    }
}

/// Resolve the configured marketplace, prompting (and saving) until a valid one is chosen
fn ensure_marketplace<R: BufRead, W: Write>(
    config: &mut Config,
    input: &mut R,
    output: &mut W,
) -> Result<Marketplace> {
    match config.marketplace(None) {
        Ok(marketplace) => Ok(marketplace),
        Err(e) => {
            writeln!(output, "{}", e)?;
            let marketplace = choose_marketplace(input, output)?;
            config.user.marketplace = Some(marketplace.code.to_string());
            config.save()?;
            Ok(marketplace)
        }
    }
}

pub fn run() -> Result<()> {
    let mut config = Config::load()?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let marketplace = ensure_marketplace(&mut config, &mut input, &mut output)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    println!("Logging in...");
    let session_path = config.session_path()?;
    let restored = match restore_session(&session_path, marketplace, chrono::Utc::now()) {
        SessionState::Authenticated(session) => {
            let client = AudibleClient::new(&session, marketplace, &config.probe.user_agent)?;
            rt.block_on(verify_session(session, &client))?
        }
        SessionState::Unauthenticated => SessionState::Unauthenticated,
    };
    let session = match restored {
        SessionState::Authenticated(session) => session,
        SessionState::Unauthenticated => {
            let backend = TokenLogin::new(marketplace, config.probe.user_agent.clone());
            let mut prompter = TerminalPrompter::new(&mut input, &mut output);
            let session = rt.block_on(run_login_flow(&backend, &mut prompter))?;
            session.save(&session_path)?;
            session
        }
    };

    let client = AudibleClient::new(&session, marketplace, &config.probe.user_agent)?;
    let shell = Shell {
        config,
        marketplace,
        client,
    };

    loop {
        write!(output, "enter command:\n> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match ReplCommand::parse(&line) {
            Some(ReplCommand::Quit) => break,
            Some(command) => match rt.block_on(shell.execute(command)) {
                Ok(lines) => {
                    for line in lines {
                        println!("{}", line);
                    }
                }
                Err(e) => eprintln!("{}: {:#}", "Error".red().bold(), e),
            },
            None => println!("enter 'help' to show command list."),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("new\n"), Some(ReplCommand::New));
        assert_eq!(ReplCommand::parse("  RANK "), Some(ReplCommand::Rank));
        assert_eq!(ReplCommand::parse("exit"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("quit"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("launch"), None);
        assert_eq!(ReplCommand::parse(""), None);
    }

    #[test]
    fn test_every_command_is_reachable_by_name() {
        for (command, names, help) in REPL_COMMANDS {
            assert!(!help.is_empty());
            for name in *names {
                assert_eq!(ReplCommand::parse(name), Some(*command));
            }
        }
    }

    #[test]
    fn test_help_lists_all_commands() {
        let help = help_lines();
        assert_eq!(help.len(), REPL_COMMANDS.len());
        assert_eq!(help[0], "help:\n  Show command list");
        assert!(help.iter().any(|l| l.starts_with("quit|exit:")));
    }

    #[test]
    fn test_ensure_marketplace_keeps_configured() {
        let mut config = Config::default();
        config.user.marketplace = Some("de".to_string());
        let mut input = io::Cursor::new("");
        let mut output = Vec::new();

        let marketplace = ensure_marketplace(&mut config, &mut input, &mut output).unwrap();
        assert_eq!(marketplace.code, "de");
        assert!(output.is_empty());
    }
}
