use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DOWNLOAD_CARD_TITLE: &str = "Download";
pub const CHECKLIST_CARD_TITLE: &str = "Document Checklist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Old,
    New,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStatus {
    Content,
    LowContent,
    Unreadable,
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub display_name: String,
    pub origin: Origin,
    pub text: String,
    pub normalized_text: String,
    pub status: TextStatus,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_path: String,
    pub details: EntryDetails,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(default)]
    pub cards: Vec<ContentCard>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    pub icon: String,
}

impl ContentCard {
    pub fn list(title: impl Into<String>, items: Vec<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
            items,
            icon: icon.into(),
        }
    }

    pub fn is_download(&self) -> bool {
        self.title == DOWNLOAD_CARD_TITLE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub q: String,
    pub a: String,
}

impl CatalogEntry {
    pub fn download_cards(&self) -> impl Iterator<Item = &ContentCard> {
        self.details.cards.iter().filter(|card| card.is_download())
    }

    pub fn checklist_cards(&self) -> impl Iterator<Item = &ContentCard> {
        self.details
            .cards
            .iter()
            .filter(|card| !card.is_download() && !card.items.is_empty())
    }

    pub fn checklist_item_count(&self) -> usize {
        self.checklist_cards().map(|card| card.items.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedFile {
    pub path: String,
    pub name: String,
    pub file_name: String,
    pub origin: Origin,
    pub sha256: String,
    pub text_status: TextStatus,
    pub normalized_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    Name,
    Content { similarity: f64 },
    Transitive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedundantFile {
    pub path: String,
    pub file_name: String,
    pub origin: Origin,
    pub kept_file_name: String,
    pub kept_origin: Origin,
    pub reason: MatchReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowContentFile {
    pub path: String,
    pub file_name: String,
    pub origin: Origin,
    pub text_status: TextStatus,
    pub normalized_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestThresholds {
    pub similarity_threshold: f64,
    pub min_token_chars: usize,
    pub low_content_chars: usize,
    pub grouping: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub old_dir: String,
    pub new_dir: String,
    pub scanned_count: usize,
    pub group_count: usize,
    pub thresholds: ManifestThresholds,
    pub approved: Vec<ApprovedFile>,
    pub redundant: Vec<RedundantFile>,
    pub low_content: Vec<LowContentFile>,
}
