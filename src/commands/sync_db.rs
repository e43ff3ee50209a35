use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::load_catalog;
use crate::cli::SyncDbArgs;
use crate::commands::ProjectPaths;
use crate::db::{self, MirrorCounts};

pub fn run(args: SyncDbArgs) -> Result<()> {
    execute(&args).map(|_| ())
}

pub fn execute(args: &SyncDbArgs) -> Result<MirrorCounts> {
    let paths = ProjectPaths::resolve(&args.layout);
    let catalog = load_catalog(&paths.catalog_path)
        .with_context(|| format!("failed to load catalog {}", paths.catalog_path.display()))?;

    info!(
        catalog = %paths.catalog_path.display(),
        db_path = %paths.db_path.display(),
        entries = catalog.len(),
        "mirroring catalog into database"
    );

    let mut connection = db::open(&paths.db_path)?;
    let counts = db::mirror_catalog(&mut connection, &catalog)?;

    info!(
        deleted = counts.deleted,
        inserted = counts.inserted,
        "database sync completed"
    );
    Ok(counts)
}
