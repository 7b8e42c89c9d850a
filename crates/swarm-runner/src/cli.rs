//! Command-line interface.
//!
//! With no subcommand the runner walks the population once. The other
//! subcommands administer the `actors` table and read back reports.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use swarm_types::PersonaClass;

#[derive(Debug, Parser)]
#[command(name = "swarm-runner")]
#[command(about = "Runs the Swarm population and administers its actors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The requested command; a bare invocation means [`Command::Run`].
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Walk every enabled actor once
    Run,

    /// Enable actors so the next run includes them
    Enable(Selection),

    /// Disable actors so runs skip them
    Disable(Selection),

    /// Import an account already registered on the platform
    Import {
        /// Platform login name
        #[arg(long)]
        username: String,

        /// Platform password
        #[arg(long, env = "SWARM_ACTOR_PASSWORD", hide_env_values = true)]
        password: String,

        /// Behavior class, e.g. `normal` or `diet_focused`
        #[arg(long, default_value = "normal")]
        persona: PersonaClass,

        /// Provisioning batch the account belongs to
        #[arg(long)]
        batch: Option<String>,
    },

    /// Log actor counts per persona
    Stats,

    /// Log quota usage and the activity report for one day
    Report {
        /// Day to report, `YYYY-MM-DD` (default today, UTC)
        #[arg(long)]
        day: Option<NaiveDate>,
    },
}

/// Which actors an enable or disable applies to.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
#[group(required = true, multiple = false)]
pub struct Selection {
    /// Only actors of this provisioning batch
    #[arg(long)]
    pub batch: Option<String>,

    /// The whole population
    #[arg(long)]
    pub all: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        let argv = std::iter::once("swarm-runner").chain(args.iter().copied());
        Cli::try_parse_from(argv).map(Cli::into_command)
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_runs() {
        assert_eq!(parse(&[]).unwrap(), Command::Run);
        assert_eq!(parse(&["run"]).unwrap(), Command::Run);
    }

    #[test]
    fn toggles_take_a_batch_or_all() {
        assert_eq!(
            parse(&["disable", "--batch", "2025-01"]).unwrap(),
            Command::Disable(Selection {
                batch: Some("2025-01".to_owned()),
                all: false,
            })
        );
        assert_eq!(
            parse(&["enable", "--all"]).unwrap(),
            Command::Enable(Selection {
                batch: None,
                all: true,
            })
        );
        assert!(parse(&["enable"]).is_err());
        assert!(parse(&["enable", "--all", "--batch", "2025-01"]).is_err());
    }

    #[test]
    fn import_parses_persona() {
        let command = parse(&[
            "import",
            "--username",
            "bot_7",
            "--password",
            "secret",
            "--persona",
            "diet_focused",
        ])
        .unwrap();
        assert_eq!(
            command,
            Command::Import {
                username: "bot_7".to_owned(),
                password: "secret".to_owned(),
                persona: PersonaClass::DietFocused,
                batch: None,
            }
        );
        assert!(
            parse(&["import", "--username", "x", "--password", "y", "--persona", "hyper"]).is_err()
        );
    }

    #[test]
    fn report_day_is_optional() {
        assert_eq!(parse(&["report"]).unwrap(), Command::Report { day: None });
        assert_eq!(
            parse(&["report", "--day", "2025-01-02"]).unwrap(),
            Command::Report {
                day: NaiveDate::from_ymd_opt(2025, 1, 2),
            }
        );
        assert!(parse(&["report", "--day", "yesterday"]).is_err());
    }
}
