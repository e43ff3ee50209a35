use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::load_catalog;
use crate::cli::AuditDbArgs;
use crate::commands::ProjectPaths;
use crate::db::{self, ServiceRow};
use crate::model::CatalogEntry;
use crate::util::{now_utc_string, write_json_pretty};

#[derive(Debug, Clone, Serialize)]
pub struct DbAuditReport {
    pub report_version: u32,
    pub generated_at: String,
    pub db_path: String,
    pub catalog_path: String,
    pub db_rows: usize,
    pub catalog_entries: usize,
    pub orphans: Vec<ServiceRow>,
    pub duplicate_names: Vec<String>,
    pub missing_from_db: Vec<String>,
    pub rows_without_content: Vec<i64>,
}

pub fn run(args: AuditDbArgs) -> Result<()> {
    execute(&args).map(|_| ())
}

pub fn execute(args: &AuditDbArgs) -> Result<DbAuditReport> {
    let paths = ProjectPaths::resolve(&args.layout);
    if !paths.db_path.is_file() {
        bail!(
            "database not found at {}; run sync-db first",
            paths.db_path.display()
        );
    }

    let catalog = load_catalog(&paths.catalog_path)
        .with_context(|| format!("failed to load catalog {}", paths.catalog_path.display()))?;
    let connection = db::open_read_only(&paths.db_path)?;
    let rows = db::load_services(&connection)?;

    let report = audit(&rows, &catalog, &paths);

    for row in &report.orphans {
        warn!(id = row.id, name = %row.name, "database row not in catalog");
    }
    for name in &report.missing_from_db {
        warn!(name = %name, "catalog entry not in database");
    }

    let report_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| paths.reports_dir.join("db_audit.json"));
    write_json_pretty(&report_path, &report)?;

    info!(path = %report_path.display(), "wrote database audit report");
    info!(
        db_rows = report.db_rows,
        catalog_entries = report.catalog_entries,
        orphans = report.orphans.len(),
        duplicate_names = report.duplicate_names.len(),
        missing_from_db = report.missing_from_db.len(),
        "database audit completed"
    );

    Ok(report)
}

fn name_key(name: &str) -> String {
    name.trim().to_uppercase()
}

fn audit(rows: &[ServiceRow], catalog: &[CatalogEntry], paths: &ProjectPaths) -> DbAuditReport {
    let catalog_names = catalog
        .iter()
        .map(|entry| name_key(&entry.name))
        .collect::<HashSet<String>>();

    let mut row_counts = HashMap::<String, usize>::new();
    for row in rows {
        *row_counts.entry(name_key(&row.name)).or_default() += 1;
    }

    let orphans = rows
        .iter()
        .filter(|row| !catalog_names.contains(&name_key(&row.name)))
        .cloned()
        .collect();

    let duplicate_names = row_counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(name, _)| name.clone())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let missing_from_db = catalog
        .iter()
        .filter(|entry| !row_counts.contains_key(&name_key(&entry.name)))
        .map(|entry| entry.name.clone())
        .collect();

    DbAuditReport {
        report_version: 1,
        generated_at: now_utc_string(),
        db_path: paths.db_path.display().to_string(),
        catalog_path: paths.catalog_path.display().to_string(),
        db_rows: rows.len(),
        catalog_entries: catalog.len(),
        orphans,
        duplicate_names,
        missing_from_db,
        rows_without_content: rows
            .iter()
            .filter(|row| row.title.is_none())
            .map(|row| row.id)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rusqlite::params;

    use super::*;
    use crate::catalog::name_change_entry;
    use crate::cli::{Cli, Commands};

    fn entry(id: u32, name: &str) -> CatalogEntry {
        let mut entry = name_change_entry();
        entry.id = id;
        entry.name = name.to_string();
        entry
    }

    fn audit_args(root: &std::path::Path) -> AuditDbArgs {
        let root_arg = root.to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "checklist-catalog",
            "audit-db",
            "--root",
            root_arg.as_str(),
        ])
        .expect("parse");
        match cli.command {
            Commands::AuditDb(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn finds_orphans_and_missing_entries() {
        let root = tempfile::tempdir().expect("tempdir");
        let paths = ProjectPaths::resolve(&audit_args(root.path()).layout);

        let mut connection = db::open(&paths.db_path).expect("open");
        db::mirror_catalog(
            &mut connection,
            &[entry(1, "NAME CHANGE"), entry(2, "PASSPORT"), entry(3, "OLD SERVICE")],
        )
        .expect("mirror");
        connection
            .execute(
                "INSERT INTO service_names (id, name) VALUES (?1, ?2)",
                params![9, " old service "],
            )
            .expect("insert stray row");
        drop(connection);

        write_json_pretty(
            &paths.catalog_path,
            &vec![entry(1, "NAME CHANGE"), entry(2, "PASSPORT"), entry(3, "UDYAM")],
        )
        .expect("write catalog");

        let report = execute(&audit_args(root.path())).expect("audit");
        assert_eq!(report.db_rows, 4);
        assert_eq!(
            report.orphans.iter().map(|row| row.id).collect::<Vec<i64>>(),
            vec![3, 9]
        );
        assert_eq!(report.duplicate_names, vec!["OLD SERVICE".to_string()]);
        assert_eq!(report.missing_from_db, vec!["UDYAM".to_string()]);
        assert_eq!(report.rows_without_content, vec![9]);
        assert!(paths.reports_dir.join("db_audit.json").is_file());
    }

    #[test]
    fn missing_database_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(execute(&audit_args(root.path())).is_err());
    }
}
