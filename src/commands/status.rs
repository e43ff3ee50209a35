use anyhow::Result;
use tracing::{info, warn};

use crate::catalog::load_catalog;
use crate::cli::StatusArgs;
use crate::commands::ProjectPaths;
use crate::commands::verify::IntegrityReport;
use crate::db;
use crate::discovery::discover_pdfs;
use crate::model::ReconciliationManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let paths = ProjectPaths::resolve(&args.layout);
    info!(
        root = %args.layout.root.display(),
        cache_root = %paths.cache_root.display(),
        "status requested"
    );

    for (label, dir) in [("old", &paths.old_dir), ("new", &paths.new_dir)] {
        if dir.is_dir() {
            info!(
                corpus = label,
                path = %dir.display(),
                pdf_count = discover_pdfs(dir)?.len(),
                "corpus"
            );
        } else {
            warn!(corpus = label, path = %dir.display(), "corpus directory missing");
        }
    }

    if paths.catalog_path.exists() {
        let catalog = load_catalog(&paths.catalog_path)?;
        let thin = catalog
            .iter()
            .filter(|entry| crate::segment::is_thin(&entry.details.cards))
            .count();
        info!(
            path = %paths.catalog_path.display(),
            entries = catalog.len(),
            thin,
            "loaded catalog"
        );
    } else {
        warn!(path = %paths.catalog_path.display(), "catalog missing");
    }

    if paths.docs_dir.is_dir() {
        info!(
            path = %paths.docs_dir.display(),
            pdf_count = discover_pdfs(&paths.docs_dir)?.len(),
            "published documents"
        );
    } else {
        warn!(path = %paths.docs_dir.display(), "docs directory missing");
    }

    let manifest_path = paths.manifest_path();
    if manifest_path.exists() {
        let manifest: ReconciliationManifest = read_json(&manifest_path)?;
        info!(
            generated_at = %manifest.generated_at,
            scanned = manifest.scanned_count,
            approved = manifest.approved.len(),
            redundant = manifest.redundant.len(),
            low_content = manifest.low_content.len(),
            "loaded reconciliation manifest"
        );
    } else {
        warn!(path = %manifest_path.display(), "reconciliation manifest missing");
    }

    let report_path = paths.reports_dir.join("integrity_report.json");
    if report_path.exists() {
        let report: IntegrityReport = read_json(&report_path)?;
        info!(
            generated_at = %report.generated_at,
            pass = report.summary.pass,
            warn = report.summary.warn,
            fail = report.summary.fail,
            "loaded integrity report"
        );
    } else {
        warn!(path = %report_path.display(), "integrity report missing");
    }

    if paths.db_path.exists() {
        let connection = db::open_read_only(&paths.db_path)?;
        let names = db::count_rows(&connection, "SELECT COUNT(*) FROM service_names").unwrap_or(0);
        let content =
            db::count_rows(&connection, "SELECT COUNT(*) FROM service_content").unwrap_or(0);

        let schema_version =
            db::metadata_value(&connection, "db_schema_version").unwrap_or_default();
        let synced_at = db::metadata_value(&connection, "synced_at").unwrap_or_default();

        info!(
            path = %paths.db_path.display(),
            service_names = names,
            service_content = content,
            schema_version = %schema_version,
            synced_at = %synced_at,
            "database status"
        );
    } else {
        warn!(path = %paths.db_path.display(), "database file missing");
    }

    Ok(())
}
