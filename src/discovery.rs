use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::{Origin, SourceDocument};
use crate::pdf_text::{TextExtractor, extract_outcome};
use crate::similarity::normalize;
use crate::util::sha256_file;

pub fn scan_corpus(
    dir: &Path,
    origin: Origin,
    extractor: &dyn TextExtractor,
    low_content_chars: usize,
) -> Result<Vec<SourceDocument>> {
    if !dir.is_dir() {
        warn!(
            path = %dir.display(),
            origin = origin.as_str(),
            "corpus directory missing, skipping"
        );
        return Ok(Vec::new());
    }

    let pdf_paths = discover_pdfs(dir)?;
    info!(
        path = %dir.display(),
        origin = origin.as_str(),
        pdf_count = pdf_paths.len(),
        "scanning corpus"
    );

    let mut documents = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let outcome = extract_outcome(extractor, &path, low_content_chars);
        let text = outcome.text().to_string();
        let sha256 = sha256_file(&path)?;

        documents.push(SourceDocument {
            display_name: display_name(&file_name),
            normalized_text: normalize(&text),
            status: outcome.status(),
            path,
            file_name,
            origin,
            text,
            sha256,
        });
    }

    Ok(documents)
}

pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if is_pdf(&path) {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

pub fn display_name(file_name: &str) -> String {
    let stem = match file_name.len().checked_sub(4) {
        Some(cut)
            if file_name.is_char_boundary(cut)
                && file_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &file_name[..cut]
        }
        _ => file_name,
    };

    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::TextStatus;
    use crate::pdf_text::testing::FixedTextExtractor;

    #[test]
    fn display_name_replaces_separators() {
        assert_eq!(display_name("Income_Certificate.pdf"), "Income Certificate");
        assert_eq!(display_name("GST-Registration__New.PDF"), "GST Registration New");
        assert_eq!(display_name("  Trade License .pdf"), "Trade License");
        assert_eq!(display_name("notes.txt"), "notes.txt");
    }

    #[test]
    fn missing_corpus_is_skipped() {
        let extractor = FixedTextExtractor::default();
        let documents = scan_corpus(
            Path::new("/definitely/not/here"),
            Origin::Old,
            &extractor,
            50,
        )
        .expect("missing directory is not an error");
        assert!(documents.is_empty());
    }

    #[test]
    fn scan_reads_only_pdfs_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b_form.pdf"), b"%PDF-b").expect("write");
        fs::write(dir.path().join("A_Form.PDF"), b"%PDF-a").expect("write");
        fs::write(dir.path().join("readme.txt"), b"ignore").expect("write");
        fs::create_dir(dir.path().join("nested.pdf")).expect("mkdir");

        let long_text = "Passport copy, address proof and photographs of the applicant.";
        let extractor = FixedTextExtractor::default().with("A_Form.PDF", long_text);
        let documents = scan_corpus(dir.path(), Origin::New, &extractor, 50).expect("scan");

        let names = documents
            .iter()
            .map(|document| document.file_name.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(names, vec!["A_Form.PDF", "b_form.pdf"]);

        assert_eq!(documents[0].display_name, "A Form");
        assert_eq!(documents[0].status, TextStatus::Content);
        assert_eq!(documents[0].origin, Origin::New);
        assert_eq!(documents[0].sha256.len(), 64);

        assert_eq!(documents[1].status, TextStatus::Unreadable);
        assert!(documents[1].text.is_empty());
    }
}
