//! End-to-end runs of the subcommands against snapshot files

use hcp_cli::cli::{AuditArgs, GlobalArgs, MigrateArgs};
use hcp_cli::{commands, Context, MigrateOutcome, OutputFormat, Prepared, Verbosity};
use hcp_core::{cancel_pair, CancelSignal, Category, FleetSnapshot, ShowOnly};
use hcp_test_utils::{mixed_snapshot, snapshot_with, MGMT_CLUSTER_ID, MGMT_CLUSTER_NAME, SVC_CLUSTER_NAME};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fleet(dir: &TempDir, snapshot: &FleetSnapshot) -> PathBuf {
    let path = dir.path().join("fleet.yaml");
    snapshot.save(&path).unwrap();
    path
}

fn context(fleet: &Path) -> Context {
    Context::load(&GlobalArgs {
        verbosity: Verbosity::Quiet,
        log_json: false,
        config: None,
        fleet: fleet.to_path_buf(),
    })
    .unwrap()
}

fn audit_args(output: OutputFormat) -> AuditArgs {
    AuditArgs {
        mgmt_cluster_id: MGMT_CLUSTER_NAME.to_string(),
        output,
        show_only: None,
        no_headers: false,
    }
}

fn migrate_args() -> MigrateArgs {
    MigrateArgs {
        service_cluster_id: SVC_CLUSTER_NAME.to_string(),
        mgmt_cluster_id: MGMT_CLUSTER_ID.to_string(),
        dry_run: false,
        skip_confirmation: true,
    }
}

#[tokio::test]
async fn audit_text_report() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&write_fleet(&dir, &mixed_snapshot()));

    let mut out = Vec::new();
    let result = commands::audit(&ctx, &audit_args(OutputFormat::Text), &mut out)
        .await
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(result.total_scanned(), 6);
    assert!(text.starts_with(&format!(
        "Auditing management cluster: {MGMT_CLUSTER_NAME} ({MGMT_CLUSTER_ID})\n"
    )));
    assert!(text.contains("=== GROUP A: Needs Annotation Removal (2 clusters) ==="));
    assert!(text.contains("=== GROUP B: Ready for Migration (3 clusters) ==="));
    assert!(text.contains("=== Already Configured (1 clusters) ==="));
    assert!(text.ends_with("  - Errors: 0 namespaces\n"), "{text}");
}

#[tokio::test]
async fn audit_csv_has_no_preamble() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&write_fleet(&dir, &mixed_snapshot()));

    let mut args = audit_args(OutputFormat::Csv);
    args.show_only = Some(ShowOnly::ReadyForMigration);

    let mut out = Vec::new();
    commands::audit(&ctx, &args, &mut out).await.unwrap();
    let lines: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();

    assert_eq!(lines[0], "cluster_id,cluster_name,namespace,current_size,category");
    assert_eq!(lines.len(), 4);
    assert!(lines[1..].iter().all(|l| l.ends_with(",ready-for-migration")));
}

#[tokio::test]
async fn audit_rejects_service_cluster() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&write_fleet(&dir, &mixed_snapshot()));

    let mut args = audit_args(OutputFormat::Json);
    args.mgmt_cluster_id = SVC_CLUSTER_NAME.to_string();

    let err = commands::audit(&ctx, &args, &mut std::io::sink()).await.unwrap_err();
    assert!(err.to_string().contains("not a management cluster"), "{err:#}");
}

#[tokio::test(start_paused = true)]
async fn migrate_persists_annotations() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet(&dir, &mixed_snapshot());
    let ctx = context(&path);

    let mut out = Vec::new();
    let outcome = commands::migrate(
        &ctx,
        &migrate_args(),
        &mut "".as_bytes(),
        &mut out,
        &CancelSignal::never(),
    )
    .await
    .unwrap();

    let MigrateOutcome::Completed(results) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_success()));

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[1/3] Migrating cluster hc-rdy1 (rdy1)..."));
    assert!(text.contains("  - Waiting for sync (timeout: 5 minutes)..."));
    assert!(text.contains("Successfully migrated: 3"));

    let reloaded = context(&path);
    let audit = commands::audit(&reloaded, &audit_args(OutputFormat::Json), &mut std::io::sink())
        .await
        .unwrap();
    assert_eq!(audit.bucket(Category::AlreadyConfigured).len(), 4);
    assert!(audit.bucket(Category::ReadyForMigration).is_empty());
}

#[tokio::test(start_paused = true)]
async fn confirmed_plan_applies_only_when_executed() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet(&dir, &mixed_snapshot());
    let before = std::fs::read_to_string(&path).unwrap();
    let ctx = context(&path);

    let mut args = migrate_args();
    args.skip_confirmation = false;

    let mut out = Vec::new();
    let prepared = commands::prepare_migration(&ctx, &args, &mut "y\n".as_bytes(), &mut out)
        .await
        .unwrap();
    let Prepared::Ready(plan) = prepared else {
        panic!("expected a confirmed plan");
    };
    assert_eq!(plan.manifest_namespace, MGMT_CLUSTER_NAME);
    assert_eq!(plan.candidates.len(), 3);
    assert!(String::from_utf8(out).unwrap().ends_with("Migrate 3 clusters? [y/N]: "));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

    let outcome = commands::execute_migration(&ctx, plan, &mut std::io::sink(), &CancelSignal::never())
        .await
        .unwrap();
    let MigrateOutcome::Completed(results) = outcome else {
        panic!("expected a completed run");
    };
    assert!(results.iter().all(|r| r.is_success()));
    assert_ne!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn declined_prompt_aborts() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet(&dir, &mixed_snapshot());
    let before = std::fs::read_to_string(&path).unwrap();
    let ctx = context(&path);

    let mut args = migrate_args();
    args.skip_confirmation = false;

    let mut out = Vec::new();
    let err = commands::migrate(&ctx, &args, &mut "n\n".as_bytes(), &mut out, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "migration cancelled by user");
    assert!(String::from_utf8(out).unwrap().contains("Migrate 3 clusters? [y/N]: "));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn dry_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet(&dir, &mixed_snapshot());
    let before = std::fs::read_to_string(&path).unwrap();
    let ctx = context(&path);

    let mut args = migrate_args();
    args.dry_run = true;
    args.skip_confirmation = false;

    let mut out = Vec::new();
    let outcome = commands::migrate(&ctx, &args, &mut "".as_bytes(), &mut out, &CancelSignal::never())
        .await
        .unwrap();

    let MigrateOutcome::DryRun(candidates) = outcome else {
        panic!("expected a dry run");
    };
    let ids: Vec<&str> = candidates.iter().map(|c| c.cluster_id.as_str()).collect();
    assert_eq!(ids, vec!["rdy1", "rdy2", "rdy3"]);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[DRY RUN] No changes will be applied"));
    assert!(!text.contains("[y/N]"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn nothing_to_migrate() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&write_fleet(&dir, &snapshot_with(vec![])));

    let mut out = Vec::new();
    let outcome = commands::migrate(&ctx, &migrate_args(), &mut "".as_bytes(), &mut out, &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(outcome, MigrateOutcome::NoCandidates);
    assert!(String::from_utf8(out)
        .unwrap()
        .ends_with("No clusters found ready for migration\n"));
}

#[tokio::test]
async fn cancelled_run_patches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_fleet(&dir, &mixed_snapshot());
    let ctx = context(&path);

    let (handle, cancel) = cancel_pair();
    handle.cancel();

    let outcome = commands::migrate(&ctx, &migrate_args(), &mut "".as_bytes(), &mut std::io::sink(), &cancel)
        .await
        .unwrap();

    let MigrateOutcome::Completed(results) = outcome else {
        panic!("expected a completed run");
    };
    assert!(results
        .iter()
        .all(|r| r.error.as_deref() == Some("failed to patch ManifestWork: context cancelled")));

    let audit = commands::audit(&context(&path), &audit_args(OutputFormat::Json), &mut std::io::sink())
        .await
        .unwrap();
    assert_eq!(audit.bucket(Category::ReadyForMigration).len(), 3);
}
