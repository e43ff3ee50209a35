use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{RESERVED_ID, linked_files, load_catalog, replace_checklist};
use crate::cli::{RepairArgs, Strategy};
use crate::commands::ProjectPaths;
use crate::commands::verify::IntegrityReport;
use crate::model::CatalogEntry;
use crate::pdf_text::{PdftotextExtractor, TextExtractor, TextOutcome, extract_outcome};
use crate::segment::{Segmenter, is_thin};
use crate::util::{read_json, write_json_pretty};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub targets: usize,
    pub repaired: usize,
    pub skipped: usize,
}

pub fn run(args: RepairArgs) -> Result<()> {
    execute(&args, &PdftotextExtractor).map(|_| ())
}

pub fn execute(args: &RepairArgs, extractor: &dyn TextExtractor) -> Result<RepairSummary> {
    let paths = ProjectPaths::resolve(&args.layout);
    let mut catalog = load_catalog(&paths.catalog_path)
        .with_context(|| format!("failed to load catalog {}", paths.catalog_path.display()))?;

    let targets = match &args.report {
        Some(report_path) => {
            let report: IntegrityReport = read_json(report_path)?;
            info!(path = %report_path.display(), "repairing entries flagged by integrity report");
            report
                .flagged_ids()
                .into_iter()
                .filter(|id| *id != RESERVED_ID)
                .collect::<HashSet<u32>>()
        }
        None => catalog
            .iter()
            .filter(|entry| entry.id != RESERVED_ID && is_thin(&entry.details.cards))
            .map(|entry| entry.id)
            .collect::<HashSet<u32>>(),
    };

    let segmenter = Segmenter::new(args.thresholds.segment_options())?;
    let mut summary = RepairSummary::default();

    for entry in catalog
        .iter_mut()
        .filter(|entry| targets.contains(&entry.id))
    {
        summary.targets += 1;
        if repair_entry(entry, &paths, &segmenter, extractor, args.thresholds.low_content_chars) {
            summary.repaired += 1;
        } else {
            summary.skipped += 1;
        }
    }

    if args.dry_run {
        info!(
            targets = summary.targets,
            repaired = summary.repaired,
            "repair dry-run complete"
        );
        return Ok(summary);
    }

    if summary.repaired > 0 {
        write_json_pretty(&paths.catalog_path, &catalog)?;
        info!(path = %paths.catalog_path.display(), "wrote repaired catalog");
    }

    info!(
        targets = summary.targets,
        repaired = summary.repaired,
        skipped = summary.skipped,
        "repair completed"
    );
    Ok(summary)
}

fn repair_entry(
    entry: &mut CatalogEntry,
    paths: &ProjectPaths,
    segmenter: &Segmenter,
    extractor: &dyn TextExtractor,
    low_content_chars: usize,
) -> bool {
    let Some(file_name) = linked_files(entry).into_iter().next() else {
        warn!(id = entry.id, name = %entry.name, "no linked document, skipping");
        return false;
    };

    let pdf_path = paths.docs_dir.join(&file_name);
    if !pdf_path.is_file() {
        warn!(id = entry.id, path = %pdf_path.display(), "linked document missing, skipping");
        return false;
    }

    let outcome = extract_outcome(extractor, &pdf_path, low_content_chars);
    if let TextOutcome::Unreadable(reason) = &outcome {
        warn!(
            id = entry.id,
            path = %pdf_path.display(),
            reason = %reason,
            "re-extraction failed, skipping"
        );
        return false;
    }

    let segmentation = segmenter.segment_outcome(&outcome, Strategy::SmartMerge);
    if !segmentation.items_found {
        warn!(id = entry.id, name = %entry.name, "no items recovered, keeping existing cards");
        return false;
    }

    let items = segmentation
        .cards
        .iter()
        .map(|card| card.items.len())
        .sum::<usize>();
    replace_checklist(entry, segmentation);
    info!(id = entry.id, name = %entry.name, items, "entry repaired");
    true
}
