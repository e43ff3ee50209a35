use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::cli::{ExtractArgs, Strategy};
use crate::model::{ContentCard, TextStatus};
use crate::pdf_text::{PdftotextExtractor, TextExtractor, extract_outcome};
use crate::segment::Segmenter;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse {
    pub pdf: String,
    pub strategy: String,
    pub text_status: TextStatus,
    pub items_found: bool,
    pub cards: Vec<ContentCard>,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let response = execute(&args, &PdftotextExtractor)?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize extract json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub fn execute(args: &ExtractArgs, extractor: &dyn TextExtractor) -> Result<ExtractResponse> {
    if !args.pdf.is_file() {
        bail!("PDF not found: {}", args.pdf.display());
    }

    let segmenter = Segmenter::new(args.thresholds.segment_options())?;
    let response = segment_pdf(
        &args.pdf,
        extractor,
        &segmenter,
        args.strategy,
        args.thresholds.low_content_chars,
    );

    info!(
        pdf = %args.pdf.display(),
        strategy = args.strategy.as_str(),
        cards = response.cards.len(),
        items_found = response.items_found,
        "extraction completed"
    );
    Ok(response)
}

fn segment_pdf(
    pdf: &Path,
    extractor: &dyn TextExtractor,
    segmenter: &Segmenter,
    strategy: Strategy,
    low_content_chars: usize,
) -> ExtractResponse {
    let outcome = extract_outcome(extractor, pdf, low_content_chars);
    let segmentation = segmenter.segment_outcome(&outcome, strategy);

    ExtractResponse {
        pdf: pdf.display().to_string(),
        strategy: strategy.as_str().to_string(),
        text_status: outcome.status(),
        items_found: segmentation.items_found,
        cards: segmentation.cards,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::pdf_text::testing::FixedTextExtractor;

    fn extract_args(pdf: &Path, strategy: &str) -> ExtractArgs {
        let pdf_arg = pdf.to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "checklist-catalog",
            "extract",
            "--pdf",
            pdf_arg.as_str(),
            "--strategy",
            strategy,
        ])
        .expect("parse");
        match cli.command {
            Commands::Extract(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn extract_reports_cards_for_one_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = dir.path().join("Udyam.pdf");
        fs::write(&pdf, b"%PDF").expect("write");

        let extractor = FixedTextExtractor::default().with(
            "Udyam.pdf",
            "MANDATORY DOCUMENTS:\n1. Aadhaar card of the proprietor\n2. PAN card of the business\n-- 1 of 2 --\n",
        );

        let response =
            execute(&extract_args(&pdf, "sectioned"), &extractor).expect("extract");
        assert_eq!(response.text_status, TextStatus::Content);
        assert!(response.items_found);
        assert_eq!(response.cards.len(), 1);
        assert_eq!(response.cards[0].title, "Mandatory Documents");
        assert_eq!(
            response.cards[0].items,
            vec![
                "Aadhaar card of the proprietor".to_string(),
                "PAN card of the business".to_string(),
            ]
        );
    }

    #[test]
    fn unreadable_pdf_yields_error_card() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = dir.path().join("Broken.pdf");
        fs::write(&pdf, b"not a pdf").expect("write");

        let response = execute(&extract_args(&pdf, "smart-merge"), &FixedTextExtractor::default())
            .expect("extract");
        assert_eq!(response.text_status, TextStatus::Unreadable);
        assert!(!response.items_found);
        assert_eq!(response.cards[0].title, "Error");
    }

    #[test]
    fn missing_pdf_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("Nope.pdf");
        assert!(execute(&extract_args(&missing, "naive"), &FixedTextExtractor::default()).is_err());
    }
}
