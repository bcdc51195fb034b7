//! Command-line surface
//!
//! ```text
//! hcp-node-autoscaling [-v|-q] [--log-json] [--config FILE] --fleet FILE <COMMAND>
//!   audit   --mgmt-cluster-id ID [--output FMT] [--show-only CATEGORY] [--no-headers]
//!   migrate --service-cluster-id ID --mgmt-cluster-id ID [--dry-run] [--skip-confirmation]
//! ```

use crate::logging::Verbosity;
use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use hcp_core::ShowOnly;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Audit output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable grouped tables
    #[default]
    Text,
    /// Full result as JSON
    Json,
    /// Full result as YAML
    Yaml,
    /// One row per classified cluster
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "invalid output format '{other}'. Valid options: text, json, yaml, csv"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
        })
    }
}

/// Flags shared by every subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Log level selected by `-v` / `-q`
    pub verbosity: Verbosity,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Optional TOML config file
    pub config: Option<PathBuf>,
    /// Fleet snapshot file
    pub fleet: PathBuf,
}

/// `audit` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditArgs {
    /// Management cluster id or name
    pub mgmt_cluster_id: String,
    /// Report format
    pub output: OutputFormat,
    /// Restrict the report to one group
    pub show_only: Option<ShowOnly>,
    /// Omit table and CSV headers
    pub no_headers: bool,
}

/// `migrate` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    /// Service cluster id or name
    pub service_cluster_id: String,
    /// Management cluster id or name
    pub mgmt_cluster_id: String,
    /// List candidates without patching
    pub dry_run: bool,
    /// Do not prompt before migrating
    pub skip_confirmation: bool,
}

/// Selected subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Classify the hosted clusters of a management cluster
    Audit(AuditArgs),
    /// Patch and verify ready hosted clusters
    Migrate(MigrateArgs),
}

/// Fully parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Flags given before the subcommand
    pub global: GlobalArgs,
    /// Subcommand and its arguments
    pub command: CliCommand,
}

impl Invocation {
    /// Extract typed arguments from clap matches
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let global = GlobalArgs {
            verbosity: Verbosity::from_flags(matches.get_flag("verbose"), matches.get_flag("quiet")),
            log_json: matches.get_flag("log-json"),
            config: matches.get_one::<PathBuf>("config").cloned(),
            fleet: required::<PathBuf>(matches, "fleet")?,
        };

        let command = match matches.subcommand() {
            Some(("audit", args)) => CliCommand::Audit(AuditArgs {
                mgmt_cluster_id: required::<String>(args, "mgmt-cluster-id")?,
                output: args
                    .get_one::<OutputFormat>("output")
                    .copied()
                    .unwrap_or_default(),
                show_only: args.get_one::<ShowOnly>("show-only").copied(),
                no_headers: args.get_flag("no-headers"),
            }),
            Some(("migrate", args)) => CliCommand::Migrate(MigrateArgs {
                service_cluster_id: required::<String>(args, "service-cluster-id")?,
                mgmt_cluster_id: required::<String>(args, "mgmt-cluster-id")?,
                dry_run: args.get_flag("dry-run"),
                skip_confirmation: args.get_flag("skip-confirmation"),
            }),
            Some((other, _)) => return Err(anyhow!("unknown command '{other}'")),
            None => return Err(anyhow!("a command is required")),
        };

        Ok(Self { global, command })
    }

    /// Parse an argument vector
    pub fn try_parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = build_cli().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }
}

fn required<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument --{id}"))
}

fn mgmt_cluster_arg() -> Arg {
    Arg::new("mgmt-cluster-id")
        .long("mgmt-cluster-id")
        .required(true)
        .value_name("ID")
        .help("Management cluster ID or name")
}

/// Build the clap command tree
#[must_use]
pub fn build_cli() -> Command {
    Command::new("hcp-node-autoscaling")
        .version(hcp_core::VERSION)
        .about("HCP node autoscaling audit and migration tool")
        .long_about(
            "Audits hosted clusters on HCP management clusters for node autoscaling readiness \
             and migrates ready clusters to resource-based control-plane autoscaling.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug-level logging"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only log errors"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Migration config file (TOML)"),
        )
        .arg(
            Arg::new("fleet")
                .long("fleet")
                .required(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Fleet snapshot file (JSON or YAML)"),
        )
        .subcommand(
            Command::new("audit")
                .about("Audit hosted clusters for autoscaling migration readiness")
                .arg(mgmt_cluster_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .default_value("text")
                        .value_parser(|s: &str| s.parse::<OutputFormat>())
                        .help("Output format: text, json, yaml, csv"),
                )
                .arg(
                    Arg::new("show-only")
                        .long("show-only")
                        .value_name("CATEGORY")
                        .value_parser(|s: &str| s.parse::<ShowOnly>())
                        .help("Show only one group: needs-removal, ready-for-migration"),
                )
                .arg(
                    Arg::new("no-headers")
                        .long("no-headers")
                        .action(ArgAction::SetTrue)
                        .help("Omit table and CSV headers"),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Migrate ready hosted clusters to node autoscaling")
                .arg(
                    Arg::new("service-cluster-id")
                        .long("service-cluster-id")
                        .required(true)
                        .value_name("ID")
                        .help("Service cluster ID or name"),
                )
                .arg(mgmt_cluster_arg())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show candidates without applying changes"),
                )
                .arg(
                    Arg::new("skip-confirmation")
                        .long("skip-confirmation")
                        .action(ArgAction::SetTrue)
                        .help("Do not prompt before migrating"),
                ),
        )
}
