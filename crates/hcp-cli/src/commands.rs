//! `audit` and `migrate` subcommands

use crate::cli::{AuditArgs, GlobalArgs, MigrateArgs, OutputFormat};
use crate::prompt;
use crate::render::{self, AuditView};
use anyhow::{bail, Context as _, Result};
use hcp_core::{
    discover_candidates, resolve_cluster, resolve_management_cluster, AuditEntry, AuditResult,
    CancelSignal, LocalFleet, MigrationConfig, MigrationResult, Migrator, NamespaceFilter,
    Scanner, SyncVerifier,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Loaded configuration and fleet shared by the subcommands
pub struct Context {
    /// Fleet the subcommands read and patch
    pub fleet: Arc<LocalFleet>,
    /// Snapshot file the fleet is saved back to after a migration
    pub fleet_path: PathBuf,
    /// Migration settings
    pub config: MigrationConfig,
}

impl Context {
    /// Load config (optional) and the fleet snapshot
    ///
    /// The file-backed fleet has no agent of its own, so ManifestWork
    /// updates propagate immediately.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let config = match &global.config {
            Some(path) => MigrationConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => MigrationConfig::default(),
        };
        let fleet = LocalFleet::load(&global.fleet)
            .with_context(|| format!("failed to load fleet {}", global.fleet.display()))?
            .with_auto_propagation(true);

        Ok(Self::new(fleet, global.fleet.clone(), config))
    }

    /// Create context from parts
    #[must_use]
    pub fn new(fleet: LocalFleet, fleet_path: PathBuf, config: MigrationConfig) -> Self {
        Self {
            fleet: Arc::new(fleet),
            fleet_path,
            config,
        }
    }

    fn scanner(&self) -> Result<Scanner> {
        let filter = NamespaceFilter::from_config(&self.config)?;
        Ok(Scanner::new(self.fleet.clone(), filter))
    }
}

/// Audit a management cluster and render the report
pub async fn audit(ctx: &Context, args: &AuditArgs, out: &mut impl Write) -> Result<AuditResult> {
    let mgmt = resolve_management_cluster(ctx.fleet.as_ref(), &args.mgmt_cluster_id).await?;
    if args.output == OutputFormat::Text {
        writeln!(out, "Auditing management cluster: {} ({})", mgmt.name, mgmt.id)?;
    }

    let mut result = ctx
        .scanner()?
        .scan(&mgmt.id)
        .await
        .context("failed to list namespaces")?;
    if let Some(filter) = args.show_only {
        result = result.filtered(filter);
    }

    let view = AuditView {
        no_headers: args.no_headers,
        filtered: args.show_only.is_some(),
    };
    render::write_audit(out, &result, args.output, view)?;
    Ok(result)
}

/// How a `migrate` run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// Nothing was ready
    NoCandidates,
    /// Candidates were listed but nothing was changed
    DryRun(Vec<AuditEntry>),
    /// Candidates were migrated
    Completed(Vec<MigrationResult>),
}

/// Confirmed migration waiting to be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Service cluster the run is elevated on
    pub service_cluster_id: String,
    /// Management cluster name, which is also the ManifestWork namespace
    pub manifest_namespace: String,
    /// Hosted clusters to migrate, in order
    pub candidates: Vec<AuditEntry>,
}

/// Result of the interactive half of `migrate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    /// Confirmed, nothing changed yet
    Ready(MigrationPlan),
    /// Run ended before any change
    Finished(MigrateOutcome),
}

/// Migrate every ready hosted cluster of a management cluster
pub async fn migrate(
    ctx: &Context,
    args: &MigrateArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
    cancel: &CancelSignal,
) -> Result<MigrateOutcome> {
    match prepare_migration(ctx, args, input, out).await? {
        Prepared::Ready(plan) => execute_migration(ctx, plan, out, cancel).await,
        Prepared::Finished(outcome) => Ok(outcome),
    }
}

/// Resolve clusters, list candidates and ask for confirmation
///
/// Nothing is written to the fleet here.
pub async fn prepare_migration(
    ctx: &Context,
    args: &MigrateArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Prepared> {
    let service = resolve_cluster(ctx.fleet.as_ref(), &args.service_cluster_id)
        .await
        .context("initialization failed: service cluster")?;
    let mgmt = resolve_management_cluster(ctx.fleet.as_ref(), &args.mgmt_cluster_id)
        .await
        .context("initialization failed: management cluster")?;

    writeln!(out, "Service Cluster: {} ({})", service.name, service.id)?;
    writeln!(out, "Management Cluster: {} ({})", mgmt.name, mgmt.id)?;
    writeln!(out, "ManifestWork Namespace: {}\n", mgmt.name)?;

    let candidates = discover_candidates(&ctx.scanner()?, &mgmt.id)
        .await
        .context("failed to get migration candidates")?;
    if candidates.is_empty() {
        writeln!(out, "No clusters found ready for migration")?;
        return Ok(Prepared::Finished(MigrateOutcome::NoCandidates));
    }

    render::write_candidates(out, &candidates)?;

    if !args.skip_confirmation && !args.dry_run {
        let question = format!("Migrate {} clusters?", candidates.len());
        if !prompt::confirm(input, out, &question)? {
            bail!("migration cancelled by user");
        }
    }

    if args.dry_run {
        writeln!(out, "\n[DRY RUN] No changes will be applied")?;
        return Ok(Prepared::Finished(MigrateOutcome::DryRun(candidates)));
    }

    Ok(Prepared::Ready(MigrationPlan {
        service_cluster_id: service.id,
        manifest_namespace: mgmt.name,
        candidates,
    }))
}

/// Patch and verify every planned candidate, then save the fleet
pub async fn execute_migration(
    ctx: &Context,
    plan: MigrationPlan,
    out: &mut impl Write,
    cancel: &CancelSignal,
) -> Result<MigrateOutcome> {
    info!(
        elevation_reason = %ctx.config.elevation_reason,
        service_cluster = %plan.service_cluster_id,
        "Elevating on service cluster"
    );

    let migrator = Migrator::new(
        ctx.fleet.clone(),
        ctx.fleet.clone(),
        plan.manifest_namespace,
        SyncVerifier::from_config(&ctx.config),
    );
    let timeout = migrator.verifier().timeout();

    let mut write_err: Option<io::Error> = None;
    let results = migrator
        .migrate_with_progress(&plan.candidates, cancel, |event| {
            if write_err.is_none() {
                write_err = render::write_event(out, &event, timeout).err();
            }
        })
        .await;

    ctx.fleet
        .snapshot()
        .save(&ctx.fleet_path)
        .with_context(|| format!("failed to save fleet {}", ctx.fleet_path.display()))?;

    if let Some(e) = write_err {
        return Err(e.into());
    }
    render::write_migration_summary(out, &results)?;
    Ok(MigrateOutcome::Completed(results))
}
