//! CLI definition and dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use herd_core::{Config, Role};

use crate::commands;

pub fn build_cli() -> Command {
    Command::new("herd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Shared-memory leader election and worker coordination")
        .arg(
            Arg::new("role-a")
                .long("role-a")
                .action(ArgAction::SetTrue)
                .conflicts_with("role-b")
                .help("Run the one-shot role A worker and exit"),
        )
        .arg(
            Arg::new("role-b")
                .long("role-b")
                .action(ArgAction::SetTrue)
                .help("Run the one-shot role B worker and exit"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("TOML configuration file"),
        )
        .subcommand(Command::new("status").about("Print a JSON snapshot of the shared block"))
}

/// Initialize tracing: env-filtered, INFO default, stderr so diagnostics
/// never mix with the status command's stdout.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

pub async fn dispatch(matches: &ArgMatches) -> Result<()> {
    // --config is global: when a subcommand is present clap propagates it
    // down, so read it from the deepest matches.
    let effective = match matches.subcommand() {
        Some((_, sub)) => sub,
        None => matches,
    };
    let config_path = effective.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = Config::load(config_path)?;

    if matches.get_flag("role-a") {
        return commands::role::run(Role::A, config);
    }
    if matches.get_flag("role-b") {
        return commands::role::run(Role::B, config);
    }
    if let Some(("status", _)) = matches.subcommand() {
        return commands::status::run(&config);
    }
    commands::run::run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn role_flags_parse() {
        let matches = build_cli()
            .try_get_matches_from(["herd", "--role-a"])
            .unwrap();
        assert!(matches.get_flag("role-a"));
        assert!(!matches.get_flag("role-b"));
    }

    #[test]
    fn role_flags_are_mutually_exclusive() {
        assert!(build_cli()
            .try_get_matches_from(["herd", "--role-a", "--role-b"])
            .is_err());
    }

    #[test]
    fn config_is_accepted_after_the_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["herd", "status", "--config", "herd.toml"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_one::<PathBuf>("config").is_some());
    }

    #[test]
    fn no_arguments_selects_the_service_path() {
        let matches = build_cli().try_get_matches_from(["herd"]).unwrap();
        assert!(!matches.get_flag("role-a"));
        assert!(!matches.get_flag("role-b"));
        assert!(matches.subcommand().is_none());
    }
}
