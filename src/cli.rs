use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Generates a daily PDF report of where you have been
#[derive(Parser, Debug)]
#[command(name = "whereabouts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file name, without extension
    #[arg(long, default_value = "config", global = true)]
    pub config: String,

    /// Day to report on, defaults to the configured report day
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Log debug output
    #[arg(short = 'p', long, visible_alias = "print", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Generate and publish a single report, the default
    Run,
    /// Keep running and generate a report at every occurrence of the configured schedule
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_defaults_to_a_single_run() {
        let cli = Cli::try_parse_from(["whereabouts"]).unwrap();

        assert_eq!(cli.command, None);
        assert_eq!(cli.config, "config");
        assert_eq!(cli.date, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_accepts_an_explicit_date() {
        let cli = Cli::try_parse_from(["whereabouts", "--date", "2000-08-04", "-p"]).unwrap();

        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2000, 8, 4));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_accepts_the_print_alias() {
        let cli = Cli::try_parse_from(["whereabouts", "--print"]).unwrap();

        assert!(cli.verbose);
    }

    #[test]
    fn parse_rejects_a_malformed_date() {
        assert!(Cli::try_parse_from(["whereabouts", "--date", "04-08-2000"]).is_err());
    }

    #[test]
    fn parse_serve_with_a_config_name() {
        let cli = Cli::try_parse_from(["whereabouts", "serve", "--config", "prod"]).unwrap();

        assert_eq!(cli.command, Some(Command::Serve));
        assert_eq!(cli.config, "prod");
    }
}
