use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::model::TextStatus;
use crate::similarity::normalize;

pub const DEFAULT_LOW_CONTENT_CHARS: usize = 50;

pub trait TextExtractor {
    fn extract_text(&self, pdf_path: &Path) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdftotextExtractor;

impl TextExtractor for PdftotextExtractor {
    fn extract_text(&self, pdf_path: &Path) -> Result<String> {
        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(pdf_path)
            .arg("-")
            .output()
            .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let pages = raw
            .split('\u{000C}')
            .map(|page| page.replace('\u{0000}', ""))
            .filter(|page| !page.trim().is_empty())
            .collect::<Vec<String>>();

        Ok(pages.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    Content(String),
    LowContent {
        text: String,
        normalized_chars: usize,
    },
    Unreadable(String),
}

impl TextOutcome {
    pub fn classify(text: String, low_content_chars: usize) -> Self {
        let normalized_chars = normalize(&text).len();
        if normalized_chars < low_content_chars {
            Self::LowContent {
                text,
                normalized_chars,
            }
        } else {
            Self::Content(text)
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Content(text) | Self::LowContent { text, .. } => text,
            Self::Unreadable(_) => "",
        }
    }

    pub fn status(&self) -> TextStatus {
        match self {
            Self::Content(_) => TextStatus::Content,
            Self::LowContent { .. } => TextStatus::LowContent,
            Self::Unreadable(_) => TextStatus::Unreadable,
        }
    }
}

pub fn extract_outcome(
    extractor: &dyn TextExtractor,
    pdf_path: &Path,
    low_content_chars: usize,
) -> TextOutcome {
    match extractor.extract_text(pdf_path) {
        Ok(text) => {
            let outcome = TextOutcome::classify(text, low_content_chars);
            if let TextOutcome::LowContent {
                normalized_chars, ..
            } = &outcome
            {
                warn!(
                    path = %pdf_path.display(),
                    normalized_chars = *normalized_chars,
                    "low text content"
                );
            }
            outcome
        }
        Err(error) => {
            warn!(path = %pdf_path.display(), error = %error, "unreadable document");
            TextOutcome::Unreadable(format!("{error:#}"))
        }
    }
}
