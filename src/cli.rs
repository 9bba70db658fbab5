//! Clap adapter for inifig.
//!
//! Compiled only with the `clap` Cargo feature (on by default). [`ConfigArgs`]
//! embeds into a clap `#[derive(Parser)]` app to give it `config list|gen|get`
//! subcommands; [`ConfigArgs::into_action()`] is the only bridge to the core,
//! turning parsed arguments into a [`ConfigAction`](crate::ConfigAction) for
//! [`InifigBuilder::handle()`](crate::InifigBuilder::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// ```ignore
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show all resolved configuration key-value pairs.
    List,
    /// Generate a commented sample INI configuration file.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the resolved value and documentation for a config key.
    Get {
        /// Dotted key path (e.g. "database.url").
        key: String,
    },
}

impl ConfigArgs {
    /// Bare `config` and explicit `config list` both map to `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Gen { output }) => ConfigAction::Gen { output },
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn action(args: &[&str]) -> ConfigAction {
        TestCli::try_parse_from(args).unwrap().config.into_action()
    }

    #[test]
    fn parse_gen() {
        assert_eq!(action(&["test", "gen"]), ConfigAction::Gen { output: None });
        assert_eq!(
            action(&["test", "gen", "-o", "out.ini"]),
            ConfigAction::Gen {
                output: Some(PathBuf::from("out.ini"))
            }
        );
        assert_eq!(
            action(&["test", "gen", "--output", "/etc/myapp.ini"]),
            ConfigAction::Gen {
                output: Some(PathBuf::from("/etc/myapp.ini"))
            }
        );
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            action(&["test", "get", "database.url"]),
            ConfigAction::Get {
                key: "database.url".into()
            }
        );
    }

    #[test]
    fn parse_list_bare_and_explicit() {
        assert_eq!(action(&["test"]), ConfigAction::List);
        assert_eq!(action(&["test", "list"]), ConfigAction::List);
    }

    #[test]
    fn removed_and_unknown_subcommands_error() {
        assert!(TestCli::try_parse_from(["test", "nope"]).is_err());
        assert!(TestCli::try_parse_from(["test", "set", "port", "1"]).is_err());
        assert!(TestCli::try_parse_from(["test", "get"]).is_err());
    }
}
