pub mod analyze;
pub mod audit_db;
pub mod extract;
pub mod generate;
pub mod repair;
pub mod status;
pub mod sync_db;
pub mod verify;

use std::path::PathBuf;

use crate::cli::LayoutArgs;

pub const DEFAULT_OLD_DIR: &str = "services1";
pub const DEFAULT_NEW_DIR: &str = "new checklist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub old_dir: PathBuf,
    pub new_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub docs_dir: PathBuf,
    pub cache_root: PathBuf,
    pub manifest_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub db_path: PathBuf,
}

impl ProjectPaths {
    pub fn resolve(layout: &LayoutArgs) -> Self {
        let root = &layout.root;
        let public_dir = root.join("frontend").join("public");
        let cache_root = layout
            .cache_root
            .clone()
            .unwrap_or_else(|| root.join(".cache").join("catalog"));

        Self {
            old_dir: layout
                .old_dir
                .clone()
                .unwrap_or_else(|| root.join(DEFAULT_OLD_DIR)),
            new_dir: layout
                .new_dir
                .clone()
                .unwrap_or_else(|| root.join(DEFAULT_NEW_DIR)),
            catalog_path: layout
                .catalog_path
                .clone()
                .unwrap_or_else(|| public_dir.join("services.json")),
            docs_dir: layout
                .docs_dir
                .clone()
                .unwrap_or_else(|| public_dir.join("docs")),
            manifest_dir: cache_root.join("manifests"),
            reports_dir: cache_root.join("reports"),
            db_path: layout
                .db_path
                .clone()
                .unwrap_or_else(|| cache_root.join("catalog.sqlite")),
            cache_root,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_dir.join("reconciliation.json")
    }
}
