use anyhow::Result;
use tracing::{info, warn};

use crate::cli::AnalyzeArgs;
use crate::commands::ProjectPaths;
use crate::discovery::scan_corpus;
use crate::model::{Origin, ReconciliationManifest, SourceDocument};
use crate::pdf_text::{PdftotextExtractor, TextExtractor};
use crate::reconcile::{build_manifest, reconcile};
use crate::util::write_json_pretty;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    execute(&args, &PdftotextExtractor).map(|_| ())
}

pub fn execute(
    args: &AnalyzeArgs,
    extractor: &dyn TextExtractor,
) -> Result<ReconciliationManifest> {
    let paths = ProjectPaths::resolve(&args.layout);
    let documents = scan_corpora(&paths, extractor, args.thresholds.low_content_chars)?;

    let options = args.thresholds.match_options();
    let reconciliation = reconcile(&documents, options, args.grouping);
    let manifest = build_manifest(
        &documents,
        &reconciliation,
        &paths.old_dir,
        &paths.new_dir,
        options,
        args.grouping,
        args.thresholds.low_content_chars,
    );

    for file in &manifest.low_content {
        warn!(
            file = %file.file_name,
            origin = file.origin.as_str(),
            normalized_chars = file.normalized_chars,
            "document needs manual review"
        );
    }

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| paths.manifest_path());
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote reconciliation manifest");
    info!(
        scanned = manifest.scanned_count,
        approved = manifest.approved.len(),
        redundant = manifest.redundant.len(),
        low_content = manifest.low_content.len(),
        "analysis completed"
    );

    Ok(manifest)
}

pub fn scan_corpora(
    paths: &ProjectPaths,
    extractor: &dyn TextExtractor,
    low_content_chars: usize,
) -> Result<Vec<SourceDocument>> {
    let mut documents = scan_corpus(&paths.old_dir, Origin::Old, extractor, low_content_chars)?;
    documents.extend(scan_corpus(
        &paths.new_dir,
        Origin::New,
        extractor,
        low_content_chars,
    )?);
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::model::MatchReason;
    use crate::pdf_text::testing::FixedTextExtractor;
    use crate::util::read_json;

    fn analyze_args(root: &std::path::Path) -> AnalyzeArgs {
        let root = root.to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["checklist-catalog", "analyze", "--root", root.as_str()])
            .expect("parse");
        match cli.command {
            Commands::Analyze(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn writes_manifest_with_redundant_and_low_content_files() {
        let root = tempfile::tempdir().expect("tempdir");
        let old_dir = root.path().join("services1");
        let new_dir = root.path().join("new checklist");
        fs::create_dir_all(&old_dir).expect("old dir");
        fs::create_dir_all(&new_dir).expect("new dir");
        fs::write(old_dir.join("Shop_Act.pdf"), b"%PDF-1").expect("write");
        fs::write(old_dir.join("Scan.pdf"), b"%PDF-2").expect("write");
        fs::write(new_dir.join("Shop Act.pdf"), b"%PDF-3").expect("write");

        let body = "APPLICATION DETAILS:\n1. Establishment registration certificate copy\n2. Owner identity proof document\n3. Rental agreement for premises\n";
        let extractor = FixedTextExtractor::default()
            .with("Shop_Act.pdf", body)
            .with("Shop Act.pdf", body)
            .with("Scan.pdf", "x");

        let args = analyze_args(root.path());
        let manifest = execute(&args, &extractor).expect("analyze");

        assert_eq!(manifest.scanned_count, 3);
        assert_eq!(manifest.approved.len(), 2);
        assert_eq!(manifest.redundant.len(), 1);
        assert_eq!(manifest.redundant[0].file_name, "Shop_Act.pdf");
        assert_eq!(manifest.redundant[0].kept_file_name, "Shop Act.pdf");
        assert!(matches!(manifest.redundant[0].reason, MatchReason::Name));
        assert_eq!(manifest.low_content.len(), 1);
        assert_eq!(manifest.low_content[0].file_name, "Scan.pdf");

        let written: ReconciliationManifest = read_json(
            &root
                .path()
                .join(".cache/catalog/manifests/reconciliation.json"),
        )
        .expect("manifest on disk");
        assert_eq!(written.approved.len(), 2);
    }

    #[test]
    fn missing_corpora_produce_an_empty_manifest() {
        let root = tempfile::tempdir().expect("tempdir");
        let manifest = execute(&analyze_args(root.path()), &FixedTextExtractor::default())
            .expect("analyze");
        assert_eq!(manifest.scanned_count, 0);
        assert!(manifest.approved.is_empty());
    }
}
