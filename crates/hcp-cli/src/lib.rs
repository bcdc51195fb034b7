//! HCP CLI - command-line front end for node autoscaling migration
//!
//! Two subcommands:
//! 1. **audit**: classify every hosted cluster of a management cluster
//! 2. **migrate**: patch ready clusters and wait for the change to sync
//!
//! The fleet is read from (and written back to) a snapshot file.
//!
//! ```text
//! hcp-node-autoscaling --fleet fleet.yaml audit --mgmt-cluster-id hs-mc-1 -o csv
//! hcp-node-autoscaling --fleet fleet.yaml migrate --service-cluster-id hs-sc-1 --mgmt-cluster-id hs-mc-1
//! ```

#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod logging;
pub mod prompt;
pub mod render;

pub use cli::{build_cli, CliCommand, Invocation, OutputFormat};
pub use commands::{Context, MigrateOutcome, MigrationPlan, Prepared};
pub use logging::{init_subscriber, Verbosity};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
