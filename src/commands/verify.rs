use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{RESERVED_ID, linked_file, load_catalog, name_key};
use crate::cli::VerifyArgs;
use crate::commands::ProjectPaths;
use crate::discovery::discover_pdfs;
use crate::model::CatalogEntry;
use crate::pdf_text::{PdftotextExtractor, TextExtractor, TextOutcome, extract_outcome};
use crate::segment::{FALLBACK_ITEM, UNREADABLE_ITEM};
use crate::util::{now_utc_string, write_json_pretty};

pub const DEFAULT_FAIL_BELOW: f64 = 0.4;
pub const DEFAULT_WARN_BELOW: f64 = 0.6;
const MIN_OVERLAP_TOKEN_CHARS: usize = 5;
const MIN_CHECKLIST_ITEMS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCheck {
    pub id: u32,
    pub name: String,
    pub status: CheckStatus,
    pub linked_file: Option<String>,
    pub item_count: usize,
    pub overlap_score: Option<f64>,
    pub findings: Vec<String>,
}

impl EntryCheck {
    fn new(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            status: CheckStatus::Pass,
            linked_file: None,
            item_count: entry.checklist_item_count(),
            overlap_score: None,
            findings: Vec::new(),
        }
    }

    fn flag(&mut self, status: CheckStatus, finding: impl Into<String>) {
        self.status = self.status.max(status);
        self.findings.push(finding.into());
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifyThresholds {
    pub fail_below: f64,
    pub warn_below: f64,
    pub min_overlap_token_chars: usize,
    pub min_checklist_items: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub entries: usize,
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub report_version: u32,
    pub generated_at: String,
    pub catalog_path: String,
    pub docs_dir: String,
    pub thresholds: VerifyThresholds,
    pub summary: ReportSummary,
    pub duplicate_names: Vec<String>,
    pub duplicate_ids: Vec<u32>,
    pub id_gaps: Vec<u32>,
    pub missing_download_links: Vec<u32>,
    pub orphan_files: Vec<String>,
    pub entries: Vec<EntryCheck>,
}

impl IntegrityReport {
    pub fn flagged_ids(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|check| check.status != CheckStatus::Pass)
            .map(|check| check.id)
            .collect()
    }
}

pub fn run(args: VerifyArgs) -> Result<()> {
    execute(&args, &PdftotextExtractor).map(|_| ())
}

pub fn execute(args: &VerifyArgs, extractor: &dyn TextExtractor) -> Result<IntegrityReport> {
    let paths = ProjectPaths::resolve(&args.layout);
    let catalog = load_catalog(&paths.catalog_path)
        .with_context(|| format!("failed to load catalog {}", paths.catalog_path.display()))?;

    info!(
        catalog = %paths.catalog_path.display(),
        entries = catalog.len(),
        "verifying catalog"
    );

    let thresholds = VerifyThresholds {
        fail_below: args.fail_below,
        warn_below: args.warn_below,
        min_overlap_token_chars: MIN_OVERLAP_TOKEN_CHARS,
        min_checklist_items: MIN_CHECKLIST_ITEMS,
    };

    let entries = catalog
        .iter()
        .map(|entry| {
            check_entry(
                entry,
                &paths.docs_dir,
                extractor,
                &thresholds,
                args.low_content_chars,
            )
        })
        .collect::<Vec<EntryCheck>>();

    for check in entries.iter().filter(|check| check.status != CheckStatus::Pass) {
        warn!(
            id = check.id,
            name = %check.name,
            status = ?check.status,
            findings = %check.findings.join("; "),
            "entry flagged"
        );
    }

    let linked = catalog
        .iter()
        .flat_map(|entry| entry.download_cards().filter_map(linked_file))
        .collect::<Vec<String>>();

    let report = IntegrityReport {
        report_version: 1,
        generated_at: now_utc_string(),
        catalog_path: paths.catalog_path.display().to_string(),
        docs_dir: paths.docs_dir.display().to_string(),
        thresholds,
        summary: summarize(&entries),
        duplicate_names: duplicate_names(&catalog),
        duplicate_ids: duplicate_ids(&catalog),
        id_gaps: id_gaps(&catalog),
        missing_download_links: catalog
            .iter()
            .filter(|entry| entry.download_cards().next().is_none())
            .map(|entry| entry.id)
            .collect(),
        orphan_files: orphan_files(&paths.docs_dir, &linked)?,
        entries,
    };

    let report_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| paths.reports_dir.join("integrity_report.json"));
    write_json_pretty(&report_path, &report)?;

    info!(path = %report_path.display(), "wrote integrity report");
    info!(
        entries = report.summary.entries,
        pass = report.summary.pass,
        warn = report.summary.warn,
        fail = report.summary.fail,
        duplicate_names = report.duplicate_names.len(),
        id_gaps = report.id_gaps.len(),
        orphan_files = report.orphan_files.len(),
        "verification completed"
    );

    Ok(report)
}

fn check_entry(
    entry: &CatalogEntry,
    docs_dir: &Path,
    extractor: &dyn TextExtractor,
    thresholds: &VerifyThresholds,
    low_content_chars: usize,
) -> EntryCheck {
    let mut check = EntryCheck::new(entry);

    let downloads = entry.download_cards().collect::<Vec<_>>();
    match downloads.len() {
        0 if entry.id == RESERVED_ID => {
            check.flag(CheckStatus::Warn, "manually maintained entry has no download link")
        }
        0 => check.flag(CheckStatus::Fail, "no download link"),
        1 => {}
        count => check.flag(CheckStatus::Fail, format!("{count} download cards")),
    }

    let checklist = entry
        .checklist_cards()
        .flat_map(|card| card.items.iter().cloned())
        .collect::<Vec<String>>();
    let placeholder = !checklist.is_empty()
        && checklist
            .iter()
            .all(|item| item == FALLBACK_ITEM || item == UNREADABLE_ITEM);

    if checklist.is_empty() {
        check.flag(CheckStatus::Fail, "no checklist items");
    } else if placeholder {
        check.flag(CheckStatus::Warn, "checklist is a placeholder");
    } else if checklist.len() < thresholds.min_checklist_items {
        check.flag(
            CheckStatus::Warn,
            format!("only {} checklist item(s)", checklist.len()),
        );
    }

    let Some(file_name) = downloads.first().and_then(|card| linked_file(card)) else {
        if !downloads.is_empty() {
            check.flag(CheckStatus::Fail, "download card has no document link");
        }
        return check;
    };

    let pdf_path = docs_dir.join(&file_name);
    check.linked_file = Some(file_name.clone());
    if !pdf_path.is_file() {
        check.flag(CheckStatus::Fail, format!("linked file missing: {file_name}"));
        return check;
    }

    if checklist.is_empty() || placeholder {
        return check;
    }

    match extract_outcome(extractor, &pdf_path, low_content_chars) {
        TextOutcome::Unreadable(_) => {
            check.flag(CheckStatus::Warn, "linked document could not be re-extracted");
        }
        outcome => match overlap_score(
            &checklist,
            outcome.text(),
            thresholds.min_overlap_token_chars,
        ) {
            None => check.flag(CheckStatus::Warn, "checklist has no tokens to compare"),
            Some(score) => {
                check.overlap_score = Some(score);
                if score < thresholds.fail_below {
                    check.flag(CheckStatus::Fail, format!("checklist overlap {score:.2}"));
                } else if score < thresholds.warn_below {
                    check.flag(CheckStatus::Warn, format!("checklist overlap {score:.2}"));
                }
            }
        },
    }

    check
}

pub fn overlap_score(items: &[String], document_text: &str, min_token_chars: usize) -> Option<f64> {
    let tokens = items
        .iter()
        .flat_map(|item| item.split_whitespace())
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() >= min_token_chars)
        .collect::<BTreeSet<String>>();

    if tokens.is_empty() {
        return None;
    }

    let haystack = document_text.to_lowercase();
    let found = tokens
        .iter()
        .filter(|token| haystack.contains(token.as_str()))
        .count();
    Some(found as f64 / tokens.len() as f64)
}

fn summarize(entries: &[EntryCheck]) -> ReportSummary {
    let mut summary = ReportSummary {
        entries: entries.len(),
        ..ReportSummary::default()
    };
    for check in entries {
        match check.status {
            CheckStatus::Pass => summary.pass += 1,
            CheckStatus::Warn => summary.warn += 1,
            CheckStatus::Fail => summary.fail += 1,
        }
    }
    summary
}

fn duplicate_names(catalog: &[CatalogEntry]) -> Vec<String> {
    let mut counts = HashMap::<String, usize>::new();
    for entry in catalog {
        *counts.entry(name_key(&entry.name)).or_default() += 1;
    }

    let mut reported = HashSet::new();
    catalog
        .iter()
        .filter(|entry| {
            let key = name_key(&entry.name);
            counts.get(&key).copied().unwrap_or(0) > 1 && reported.insert(key)
        })
        .map(|entry| entry.name.clone())
        .collect()
}

fn duplicate_ids(catalog: &[CatalogEntry]) -> Vec<u32> {
    let mut seen = HashSet::new();
    let duplicates = catalog
        .iter()
        .filter(|entry| !seen.insert(entry.id))
        .map(|entry| entry.id)
        .collect::<BTreeSet<u32>>();
    duplicates.into_iter().collect()
}

fn id_gaps(catalog: &[CatalogEntry]) -> Vec<u32> {
    let ids = catalog.iter().map(|entry| entry.id).collect::<HashSet<u32>>();
    let max = ids.iter().copied().max().unwrap_or(0);
    (RESERVED_ID..=max).filter(|id| !ids.contains(id)).collect()
}

fn orphan_files(docs_dir: &Path, linked: &[String]) -> Result<Vec<String>> {
    if !docs_dir.is_dir() {
        warn!(path = %docs_dir.display(), "docs directory missing");
        return Ok(Vec::new());
    }

    let linked = linked
        .iter()
        .map(|name| name.to_lowercase())
        .collect::<HashSet<String>>();

    let orphans = discover_pdfs(docs_dir)?
        .into_iter()
        .filter_map(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(ToOwned::to_owned)
        })
        .filter(|name| !linked.contains(&name.to_lowercase()))
        .collect();
    Ok(orphans)
}

#[cfg(test)]
mod tests;
