use std::path::PathBuf;

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run { board: Option<PathBuf> },
    ConfigPath,
    BoardReset,
}

pub fn parse_args(args: &[String]) -> Result<CliCommand> {
    let command = args.get(1).map(String::as_str);
    let subcommand = args.get(2).map(String::as_str);

    match (command, subcommand) {
        (None, _) => Ok(CliCommand::Run { board: None }),
        (Some("config"), Some("path")) => Ok(CliCommand::ConfigPath),
        (Some("board"), Some("reset")) => Ok(CliCommand::BoardReset),
        (Some("config"), _) | (Some("board"), _) => {
            bail!("Unknown command: {}", args[1..].join(" "))
        }
        (Some(path), None) => Ok(CliCommand::Run {
            board: Some(PathBuf::from(path)),
        }),
        (Some(_), Some(_)) => bail!("Unexpected arguments: {}", args[1..].join(" ")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{CliCommand, parse_args};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_run() {
        let parsed = parse_args(&args(&["pinboard"])).expect("parse succeeds");
        assert_eq!(parsed, CliCommand::Run { board: None });
    }

    #[test]
    fn parse_args_accepts_board_path() {
        let parsed = parse_args(&args(&["pinboard", "review.json"])).expect("parse succeeds");
        assert_eq!(
            parsed,
            CliCommand::Run {
                board: Some(PathBuf::from("review.json"))
            }
        );
    }

    #[test]
    fn parse_args_returns_maintenance_commands() {
        let parsed = parse_args(&args(&["pinboard", "config", "path"])).expect("parse succeeds");
        assert_eq!(parsed, CliCommand::ConfigPath);
        let parsed = parse_args(&args(&["pinboard", "board", "reset"])).expect("parse succeeds");
        assert_eq!(parsed, CliCommand::BoardReset);
    }

    #[test]
    fn parse_args_rejects_unknown_subcommands() {
        assert!(parse_args(&args(&["pinboard", "board", "wipe"])).is_err());
        assert!(parse_args(&args(&["pinboard", "a.json", "b.json"])).is_err());
    }
}
