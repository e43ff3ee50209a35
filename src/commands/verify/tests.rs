use std::fs;

use clap::Parser;

use super::*;
use crate::catalog::{download_card, name_change_entry};
use crate::cli::{Cli, Commands};
use crate::model::{ContentCard, EntryDetails};
use crate::pdf_text::testing::FixedTextExtractor;
use crate::util::read_json;

fn entry(id: u32, name: &str, file: Option<&str>, items: &[&str]) -> CatalogEntry {
    let mut cards = vec![ContentCard::list(
        "Documents Required",
        items.iter().map(ToString::to_string).collect(),
        "Folder",
    )];
    if let Some(file) = file {
        cards.push(download_card(file));
    }
    CatalogEntry {
        id,
        name: name.to_string(),
        title: format!("{name} Checklist"),
        description: String::new(),
        image_path: String::new(),
        details: EntryDetails {
            cards,
            faqs: Vec::new(),
        },
    }
}

fn verify_args(root: &Path) -> VerifyArgs {
    let root = root.to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["checklist-catalog", "verify", "--root", root.as_str()])
        .expect("parse");
    match cli.command {
        Commands::Verify(args) => args,
        other => panic!("unexpected command: {other:?}"),
    }
}

fn status_of(report: &IntegrityReport, id: u32) -> CheckStatus {
    report
        .entries
        .iter()
        .find(|check| check.id == id)
        .map(|check| check.status)
        .expect("entry checked")
}

#[test]
fn report_grades_each_entry_and_catalog_level_findings() {
    let root = tempfile::tempdir().expect("tempdir");
    let docs_dir = root.path().join("frontend/public/docs");
    fs::create_dir_all(&docs_dir).expect("docs dir");
    for file in [
        "Passport.pdf",
        "Stale.pdf",
        "Scanned.pdf",
        "Warn.pdf",
        "Broken.pdf",
        "Extra.pdf",
    ] {
        fs::write(docs_dir.join(file), b"%PDF").expect("write pdf");
    }

    let catalog = vec![
        name_change_entry(),
        entry(
            2,
            "PASSPORT",
            Some("Passport.pdf"),
            &["Proof of residence address", "Birth certificate original"],
        ),
        entry(
            3,
            "STALE",
            Some("Stale.pdf"),
            &["Electricity bill", "Property tax receipt"],
        ),
        entry(4, "MISSING", Some("Missing.pdf"), &["Some document", "Another one"]),
        entry(6, "SCANNED", Some("Scanned.pdf"), &[FALLBACK_ITEM]),
        entry(7, "WARN", Some("Warn.pdf"), &["Aadhaar number", "Ration booklet"]),
        entry(8, "BROKEN", Some("Broken.pdf"), &["Trade licence copy", "Shop photograph"]),
    ];
    write_json_pretty(&root.path().join("frontend/public/services.json"), &catalog)
        .expect("write catalog");

    let extractor = FixedTextExtractor::default()
        .with(
            "Passport.pdf",
            "Passport checklist: proof of residence address, birth certificate original copy",
        )
        .with(
            "Stale.pdf",
            "Marriage registration requires witnesses and photographs",
        )
        .with("Warn.pdf", "Your Aadhaar NUMBER is mandatory");

    let report = execute(&verify_args(root.path()), &extractor).expect("verify");

    assert_eq!(status_of(&report, 1), CheckStatus::Warn);
    assert_eq!(status_of(&report, 2), CheckStatus::Pass);
    assert_eq!(status_of(&report, 3), CheckStatus::Fail);
    assert_eq!(status_of(&report, 4), CheckStatus::Fail);
    assert_eq!(status_of(&report, 6), CheckStatus::Warn);
    assert_eq!(status_of(&report, 7), CheckStatus::Warn);
    assert_eq!(status_of(&report, 8), CheckStatus::Warn);

    assert_eq!(report.entries[1].overlap_score, Some(1.0));
    assert_eq!(report.entries[5].overlap_score, Some(0.5));
    assert_eq!(report.entries[4].overlap_score, None);

    assert_eq!(
        report.summary,
        ReportSummary {
            entries: 7,
            pass: 1,
            warn: 4,
            fail: 2,
        }
    );
    assert_eq!(report.id_gaps, vec![5]);
    assert!(report.duplicate_names.is_empty());
    assert!(report.duplicate_ids.is_empty());
    assert_eq!(report.missing_download_links, vec![1]);
    assert_eq!(report.orphan_files, vec!["Extra.pdf".to_string()]);
    assert_eq!(report.flagged_ids(), vec![1, 3, 4, 6, 7, 8]);

    let written: IntegrityReport = read_json(
        &root
            .path()
            .join(".cache/catalog/reports/integrity_report.json"),
    )
    .expect("report on disk");
    assert_eq!(written.summary, report.summary);
}

#[test]
fn entry_without_items_or_with_two_links_fails() {
    let root = tempfile::tempdir().expect("tempdir");
    let docs_dir = root.path().join("docs");
    fs::create_dir_all(&docs_dir).expect("docs dir");
    fs::write(docs_dir.join("A.pdf"), b"%PDF").expect("write");

    let empty = entry(2, "EMPTY", Some("A.pdf"), &[]);
    let check = check_entry(
        &empty,
        &docs_dir,
        &FixedTextExtractor::default(),
        &VerifyThresholds {
            fail_below: DEFAULT_FAIL_BELOW,
            warn_below: DEFAULT_WARN_BELOW,
            min_overlap_token_chars: MIN_OVERLAP_TOKEN_CHARS,
            min_checklist_items: MIN_CHECKLIST_ITEMS,
        },
        50,
    );
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.findings, vec!["no checklist items".to_string()]);

    let mut doubled = entry(3, "DOUBLED", Some("A.pdf"), &["Affidavit copy", "Identity proof"]);
    doubled.details.cards.push(download_card("A.pdf"));
    let check = check_entry(
        &doubled,
        &docs_dir,
        &FixedTextExtractor::default().with("A.pdf", "affidavit copy identity proof"),
        &VerifyThresholds {
            fail_below: DEFAULT_FAIL_BELOW,
            warn_below: DEFAULT_WARN_BELOW,
            min_overlap_token_chars: MIN_OVERLAP_TOKEN_CHARS,
            min_checklist_items: MIN_CHECKLIST_ITEMS,
        },
        50,
    );
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.overlap_score, Some(1.0));
}

#[test]
fn overlap_ignores_short_tokens_and_case() {
    let items = vec!["ID of the HOLDER".to_string(), "holder photo".to_string()];
    assert_eq!(overlap_score(&items, "Holder with PHOTO", 5), Some(1.0));
    assert_eq!(overlap_score(&items, "holder", 5), Some(0.5));
    assert_eq!(overlap_score(&["a b c".to_string()], "anything", 5), None);
    assert_eq!(
        overlap_score(&["Income proof".to_string()], "nothing relevant", 5),
        Some(0.0)
    );
}

#[test]
fn catalog_level_duplicates_and_gaps() {
    let catalog = vec![
        entry(1, "NAME CHANGE", None, &["x"]),
        entry(2, "Passport", None, &["x"]),
        entry(2, "PASSPORT", None, &["x"]),
        entry(5, "Udyam", None, &["x"]),
    ];
    assert_eq!(duplicate_names(&catalog), vec!["Passport".to_string()]);
    assert_eq!(duplicate_ids(&catalog), vec![2]);
    assert_eq!(id_gaps(&catalog), vec![3, 4]);
    assert!(id_gaps(&[]).is_empty());
}
