use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::catalog::{assemble, publish_documents};
use crate::cli::GenerateArgs;
use crate::commands::ProjectPaths;
use crate::commands::analyze::scan_corpora;
use crate::pdf_text::{PdftotextExtractor, TextExtractor};
use crate::reconcile::{build_manifest, reconcile};
use crate::segment::Segmenter;
use crate::util::write_json_pretty;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    pub scanned: usize,
    pub groups: usize,
    pub redundant: usize,
    pub entries: usize,
    pub name_collisions: usize,
    pub published: usize,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    execute(&args, &PdftotextExtractor).map(|_| ())
}

pub fn execute(args: &GenerateArgs, extractor: &dyn TextExtractor) -> Result<GenerateSummary> {
    let paths = ProjectPaths::resolve(&args.layout);
    info!(
        old_dir = %paths.old_dir.display(),
        new_dir = %paths.new_dir.display(),
        strategy = args.strategy.as_str(),
        grouping = args.grouping.as_str(),
        "starting catalog generation"
    );

    let low_content_chars = args.thresholds.low_content_chars;
    let documents = scan_corpora(&paths, extractor, low_content_chars)?;

    let options = args.thresholds.match_options();
    let reconciliation = reconcile(&documents, options, args.grouping);
    let segmenter = Segmenter::new(args.thresholds.segment_options())?;
    let assembly = assemble(&documents, &reconciliation, &segmenter, args.strategy);

    let mut summary = GenerateSummary {
        scanned: documents.len(),
        groups: reconciliation.groups.len(),
        redundant: reconciliation.redundant_count(),
        entries: assembly.entries.len(),
        name_collisions: assembly.name_collisions.len(),
        published: 0,
    };

    if args.dry_run {
        info!(
            entries = summary.entries,
            redundant = summary.redundant,
            "generate dry-run complete"
        );
        return Ok(summary);
    }

    summary.published = publish_documents(&documents, &assembly.published, &paths.docs_dir)?;

    write_json_pretty(&paths.catalog_path, &assembly.entries)?;
    info!(path = %paths.catalog_path.display(), entries = summary.entries, "wrote catalog");

    let manifest = build_manifest(
        &documents,
        &reconciliation,
        &paths.old_dir,
        &paths.new_dir,
        options,
        args.grouping,
        low_content_chars,
    );
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| paths.manifest_path());
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote reconciliation manifest");

    info!(
        scanned = summary.scanned,
        groups = summary.groups,
        redundant = summary.redundant,
        entries = summary.entries,
        name_collisions = summary.name_collisions,
        published = summary.published,
        "generate completed"
    );

    Ok(summary)
}
