pub mod alerts;
pub mod classify;
pub mod plan;
pub mod report;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "airs",
    author,
    version,
    about = "airs - AI operation resilience toolkit",
    long_about = "Inspect how AI failures are classified and retried, and read the usage, cost, \
                  and reliability metrics recorded in Redis.\n\nConfiguration comes from \
                  --config (TOML or YAML), then RD_/RT_/CC_/MN_/OB_ environment variables."
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Configuration file (.toml, .yaml)")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Classify an error message and show retry guidance")]
    Classify(classify::ClassifyArgs),

    #[command(about = "Show the retry plan for an error kind and attempt")]
    Plan(plan::PlanArgs),

    #[command(about = "Usage, cost, and risk report for one day")]
    Report(report::ReportArgs),

    #[command(about = "Recent reliability alerts and tracked errors")]
    Alerts(alerts::AlertsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_json_flag_is_global() {
        let cli = Cli::try_parse_from(["airs", "classify", "timed out", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Classify(_)));
    }

    #[test]
    fn test_plan_requires_kind() {
        assert!(Cli::try_parse_from(["airs", "plan"]).is_err());
        let cli = Cli::try_parse_from(["airs", "plan", "--kind", "network_error", "--attempt", "2"])
            .unwrap();
        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.kind, ai_core::ErrorKind::NetworkError);
                assert_eq!(args.attempt, 2);
            }
            _ => panic!("expected plan"),
        }
    }

    #[test]
    fn test_plan_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["airs", "plan", "--kind", "cosmic_ray"]).is_err());
    }

    #[test]
    fn test_report_parses_date() {
        let cli = Cli::try_parse_from(["airs", "report", "--date", "2024-03-15"]).unwrap();
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.date, chrono::NaiveDate::from_ymd_opt(2024, 3, 15));
                assert!(args.operation.is_none());
            }
            _ => panic!("expected report"),
        }
        assert!(Cli::try_parse_from(["airs", "report", "--date", "15/03/2024"]).is_err());
    }

    #[test]
    fn test_alerts_default_limit() {
        let cli = Cli::try_parse_from(["airs", "alerts"]).unwrap();
        match cli.command {
            Commands::Alerts(args) => assert_eq!(args.limit, 10),
            _ => panic!("expected alerts"),
        }
    }
}
