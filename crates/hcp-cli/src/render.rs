//! Report rendering
//!
//! Everything here writes to a caller-supplied `io::Write` so commands can
//! target stdout and tests can target a buffer.

use crate::cli::OutputFormat;
use hcp_core::labels;
use hcp_core::{AuditEntry, AuditResult, Category, MigrationEvent, MigrationResult};
use std::io::{self, Write};
use std::time::Duration;

const CLUSTER_HEADERS: [&str; 4] = ["CLUSTER ID", "CLUSTER NAME", "NAMESPACE", "CURRENT SIZE"];
const CSV_HEADERS: [&str; 5] = ["cluster_id", "cluster_name", "namespace", "current_size", "category"];

/// Left-aligned text table
///
/// Every column but the last is padded to its widest cell plus three
/// spaces, and never narrower than the minimum width.
#[derive(Debug, Clone)]
pub struct Table {
    min_width: usize,
    rows: Vec<Vec<String>>,
}

impl Table {
    const PADDING: usize = 3;

    /// Create empty table
    #[must_use]
    pub fn new(min_width: usize) -> Self {
        Self {
            min_width,
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Write all rows
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                let widest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                (widest + Self::PADDING).max(self.min_width)
            })
            .collect();

        for row in &self.rows {
            let mut line = String::new();
            for (col, cell) in row.iter().enumerate() {
                if col + 1 == row.len() {
                    line.push_str(cell);
                } else {
                    let pad = widths[col].saturating_sub(cell.chars().count());
                    line.push_str(cell);
                    line.extend(std::iter::repeat(' ').take(pad));
                }
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

/// Options affecting audit rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditView {
    /// Omit table and CSV headers
    pub no_headers: bool,
    /// A show-only filter is active
    pub filtered: bool,
}

/// Render an audit in the requested format
pub fn write_audit(
    out: &mut impl Write,
    result: &AuditResult,
    format: OutputFormat,
    view: AuditView,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => write_audit_text(out, result, view),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            writeln!(out)
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(result)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(out, "{yaml}")
        }
        OutputFormat::Csv => write_audit_csv(out, result, view.no_headers),
    }
}

fn sorted_bucket(result: &AuditResult, category: Category) -> Vec<&AuditEntry> {
    let mut entries: Vec<&AuditEntry> = result.bucket(category).iter().collect();
    entries.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
    entries
}

fn cluster_table<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>, headers: bool) -> Table {
    let mut table = Table::new(20);
    if headers {
        table.add_row(CLUSTER_HEADERS);
    }
    for e in entries {
        table.add_row([
            e.cluster_id.as_str(),
            e.cluster_name.as_str(),
            e.namespace.as_str(),
            e.current_size.as_str(),
        ]);
    }
    table
}

fn write_audit_text(out: &mut impl Write, result: &AuditResult, view: AuditView) -> io::Result<()> {
    writeln!(out, "\nManagement Cluster: {}", result.mgmt_cluster_id())?;
    writeln!(out, "Total Hosted Clusters Scanned: {}\n", result.total_scanned())?;

    let sections = [
        (
            Category::NeedsRemoval,
            "GROUP A: Needs Annotation Removal",
            "These clusters have the cluster-size-override annotation that must be removed:",
        ),
        (
            Category::ReadyForMigration,
            "GROUP B: Ready for Migration",
            "These clusters can be immediately migrated to autoscaling:",
        ),
        (
            Category::AlreadyConfigured,
            "Already Configured",
            "These clusters already have autoscaling annotations set:",
        ),
    ];

    for (category, title, blurb) in sections {
        if category == Category::AlreadyConfigured && view.filtered {
            continue;
        }
        let entries = sorted_bucket(result, category);
        if entries.is_empty() {
            continue;
        }
        writeln!(out, "=== {title} ({} clusters) ===", entries.len())?;
        writeln!(out, "{blurb}")?;
        cluster_table(entries, !view.no_headers).write_to(out)?;
        writeln!(out)?;
    }

    if !result.errors().is_empty() {
        writeln!(out, "=== Errors ({}) ===", result.errors().len())?;
        let mut table = Table::new(30);
        table.add_row(["NAMESPACE", "ERROR"]);
        for e in result.errors() {
            table.add_row([e.namespace.as_str(), e.error.as_str()]);
        }
        table.write_to(out)?;
        writeln!(out)?;
    }

    writeln!(out, "Summary:")?;
    writeln!(
        out,
        "  - Group A (Needs annotation removal): {} clusters",
        result.bucket(Category::NeedsRemoval).len()
    )?;
    writeln!(
        out,
        "  - Group B (Ready for migration): {} clusters",
        result.bucket(Category::ReadyForMigration).len()
    )?;
    writeln!(
        out,
        "  - Already configured: {} clusters",
        result.bucket(Category::AlreadyConfigured).len()
    )?;
    writeln!(out, "  - Errors: {} namespaces", result.errors().len())
}

fn write_audit_csv(out: &mut impl Write, result: &AuditResult, no_headers: bool) -> io::Result<()> {
    if !no_headers {
        write_csv_record(out, CSV_HEADERS)?;
    }
    for e in result.entries() {
        write_csv_record(
            out,
            [
                e.cluster_id.as_str(),
                e.cluster_name.as_str(),
                e.namespace.as_str(),
                e.current_size.as_str(),
                e.category.as_str(),
            ],
        )?;
    }
    Ok(())
}

/// Write one RFC 4180 record
pub fn write_csv_record<'a>(out: &mut impl Write, fields: impl IntoIterator<Item = &'a str>) -> io::Result<()> {
    let line: Vec<String> = fields.into_iter().map(csv_field).collect();
    writeln!(out, "{}", line.join(","))
}

fn csv_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\r', '\n'])
        || field.starts_with(' ')
        || field.starts_with('\t');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Candidate list shown before migrating
pub fn write_candidates(out: &mut impl Write, candidates: &[AuditEntry]) -> io::Result<()> {
    writeln!(out, "\n=== Clusters Ready for Migration ({}) ===\n", candidates.len())?;
    let mut sorted: Vec<&AuditEntry> = candidates.iter().collect();
    sorted.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
    cluster_table(sorted, true).write_to(out)?;
    writeln!(out)?;

    writeln!(out, "These clusters will receive the following annotations:")?;
    for (key, value) in labels::MIGRATION_ANNOTATIONS {
        if value == labels::AUTOSCALING_ENABLED {
            writeln!(out, "  - {key}: \"{value}\"")?;
        } else {
            writeln!(out, "  - {key}: {value}")?;
        }
    }
    writeln!(out)
}

/// Progress line for one migration event
pub fn write_event(out: &mut impl Write, event: &MigrationEvent<'_>, timeout: Duration) -> io::Result<()> {
    match event {
        MigrationEvent::Started { index, total, entry } => writeln!(
            out,
            "\n[{index}/{total}] Migrating cluster {} ({})...",
            entry.cluster_name, entry.cluster_id
        ),
        MigrationEvent::Patched { .. } => {
            writeln!(out, "  - Patched ManifestWork on service cluster")?;
            writeln!(out, "  - Waiting for sync (timeout: {})...", human_duration(timeout))
        }
        MigrationEvent::Finished { result, .. } => match &result.error {
            None => writeln!(out, "✓ Successfully migrated {}", result.cluster_id),
            Some(error) => writeln!(out, "✗ Failed to migrate {}: {error}", result.cluster_id),
        },
    }
}

/// Final summary of a migration batch
pub fn write_migration_summary(out: &mut impl Write, results: &[MigrationResult]) -> io::Result<()> {
    let (migrated, failed): (Vec<&MigrationResult>, Vec<&MigrationResult>) =
        results.iter().partition(|r| r.is_success());

    writeln!(out, "\n\n=== Migration Summary ===\n")?;
    writeln!(out, "Total candidates: {}", results.len())?;
    writeln!(out, "Successfully migrated: {}", migrated.len())?;
    writeln!(out, "Failed: {}\n", failed.len())?;

    if !migrated.is_empty() {
        writeln!(out, "✓ Successfully Migrated:")?;
        for r in &migrated {
            writeln!(out, "  - {} ({})", r.cluster_name, r.cluster_id)?;
        }
        writeln!(out)?;
    }

    if !failed.is_empty() {
        writeln!(out, "✗ Failed Migrations:")?;
        let mut table = Table::new(20);
        table.add_row(["CLUSTER ID", "CLUSTER NAME", "ERROR"]);
        for r in &failed {
            table.add_row([
                r.cluster_id.as_str(),
                r.cluster_name.as_str(),
                r.error.as_deref().unwrap_or_default(),
            ]);
        }
        table.write_to(out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s} seconds"),
        (1, 0) => "1 minute".to_string(),
        (m, 0) => format!("{m} minutes"),
        (m, s) => format!("{m}m{s}s"),
    }
}
