use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::Strategy;
use crate::model::{
    CatalogEntry, ContentCard, DOWNLOAD_CARD_TITLE, EntryDetails, Faq, SourceDocument, TextStatus,
};
use crate::pdf_text::TextOutcome;
use crate::reconcile::Reconciliation;
use crate::segment::{Segmentation, Segmenter};
use crate::similarity::normalize;
use crate::util::{decode_uri_component, encode_uri_component, ensure_directory};

pub const RESERVED_ID: u32 = 1;
pub const DOCS_URL_PREFIX: &str = "/docs/";

const ANSWER_ITEMS_FOUND: &str =
    "Please refer to the Document Checklist section for a complete list of requirements.";
const ANSWER_DOWNLOAD: &str = "Please download the PDF to view requirements.";
const ANSWER_TIMELINE: &str =
    "Timelines vary based on government processing. Please contact us for an estimate.";

pub fn name_change_entry() -> CatalogEntry {
    let documents = [
        "Affidavit on Non-Judicial Stamp Paper (min. value)",
        "Original Newspaper Advertisement (one English, one Regional)",
        "Performance Proforma (in duplicate)",
        "Passport size photographs (2)",
        "Self-attested copy of ID Proof (Aadhaar/PAN/Passport)",
        "CD containing the soft copy of the application (in MS Word)",
        "Request letter to the Controller of Publications",
        "Demand Draft for the required fee",
    ];

    CatalogEntry {
        id: RESERVED_ID,
        name: "NAME CHANGE".to_string(),
        title: "Name Change Checklist".to_string(),
        description: "Requirements and checklist for Name Change via Gazette.".to_string(),
        image_path: String::new(),
        details: EntryDetails {
            cards: vec![
                ContentCard {
                    title: "Process Overview".to_string(),
                    content: Some(
                        "Changing your name involves three main steps: Affidavit, Newspaper Publication, and Gazette Notification."
                            .to_string(),
                    ),
                    items: Vec::new(),
                    icon: "Info".to_string(),
                },
                ContentCard::list(
                    "Documents Required",
                    documents.iter().map(|item| item.to_string()).collect(),
                    "List",
                ),
            ],
            faqs: vec![Faq {
                q: "How long does it take?".to_string(),
                a: "The Gazette publication usually takes 15-30 days after submission.".to_string(),
            }],
        },
    }
}

pub fn download_card(file_name: &str) -> ContentCard {
    let url = format!("{DOCS_URL_PREFIX}{}", encode_uri_component(file_name));
    ContentCard {
        title: DOWNLOAD_CARD_TITLE.to_string(),
        content: Some(format!(
            "Download the official document here: <a href=\"{url}\" target=\"_blank\" class=\"text-blue-500 underline\">View PDF</a>"
        )),
        items: Vec::new(),
        icon: "Download".to_string(),
    }
}

pub fn linked_file(card: &ContentCard) -> Option<String> {
    let content = card.content.as_deref()?;
    let marker = format!("href=\"{DOCS_URL_PREFIX}");
    let start = content.find(&marker)? + marker.len();
    let end = content[start..].find('"')? + start;
    let encoded = &content[start..end];
    if encoded.is_empty() {
        return None;
    }
    Some(decode_uri_component(encoded))
}

pub fn linked_files(entry: &CatalogEntry) -> Vec<String> {
    entry.download_cards().filter_map(linked_file).collect()
}

pub fn faqs_for(display_name: &str, items_found: bool) -> Vec<Faq> {
    vec![
        Faq {
            q: format!("What is needed for {display_name}?"),
            a: if items_found {
                ANSWER_ITEMS_FOUND
            } else {
                ANSWER_DOWNLOAD
            }
            .to_string(),
        },
        Faq {
            q: "How long does the process take?".to_string(),
            a: ANSWER_TIMELINE.to_string(),
        },
    ]
}

pub fn outcome_of(document: &SourceDocument) -> TextOutcome {
    match document.status {
        TextStatus::Content => TextOutcome::Content(document.text.clone()),
        TextStatus::LowContent => TextOutcome::LowContent {
            text: document.text.clone(),
            normalized_chars: document.normalized_text.len(),
        },
        TextStatus::Unreadable => TextOutcome::Unreadable(String::new()),
    }
}

pub fn build_entry(id: u32, document: &SourceDocument, segmentation: Segmentation) -> CatalogEntry {
    let display = &document.display_name;
    let mut cards = segmentation.cards;
    cards.push(download_card(&document.file_name));

    CatalogEntry {
        id,
        name: display.to_uppercase(),
        title: format!("{display} Checklist"),
        description: format!("Requirements and checklist for {display}."),
        image_path: String::new(),
        details: EntryDetails {
            cards,
            faqs: faqs_for(display, segmentation.items_found),
        },
    }
}

pub fn replace_checklist(entry: &mut CatalogEntry, segmentation: Segmentation) {
    let answer = if segmentation.items_found {
        ANSWER_ITEMS_FOUND
    } else {
        ANSWER_DOWNLOAD
    };

    let downloads = entry
        .details
        .cards
        .drain(..)
        .filter(|card| card.is_download())
        .collect::<Vec<ContentCard>>();
    entry.details.cards = segmentation.cards;
    entry.details.cards.extend(downloads);

    if let Some(faq) = entry.details.faqs.first_mut() {
        faq.a = answer.to_string();
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub entries: Vec<CatalogEntry>,
    pub published: Vec<usize>,
    pub name_collisions: Vec<usize>,
}

pub struct CatalogBuilder {
    entries: Vec<CatalogEntry>,
    names: HashSet<String>,
    next_id: u32,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            entries: Vec::new(),
            names: HashSet::new(),
            next_id: RESERVED_ID,
        };
        builder.push_manual(name_change_entry());
        builder
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(&name_key(name))
    }

    fn push_manual(&mut self, mut entry: CatalogEntry) {
        entry.id = self.next_id;
        self.next_id += 1;
        self.names.insert(name_key(&entry.name));
        self.entries.push(entry);
    }

    pub fn accept(&mut self, document: &SourceDocument, segmentation: Segmentation) -> Option<u32> {
        let name = document.display_name.to_uppercase();
        if self.contains_name(&name) {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.names.insert(name_key(&name));
        self.entries.push(build_entry(id, document, segmentation));
        Some(id)
    }

    pub fn finish(self) -> Vec<CatalogEntry> {
        self.entries
    }
}

// Names without ASCII letters or digits normalize to nothing.
pub fn name_key(name: &str) -> String {
    let key = normalize(name);
    if key.is_empty() {
        name.trim().to_uppercase()
    } else {
        key
    }
}

pub fn assemble(
    documents: &[SourceDocument],
    reconciliation: &Reconciliation,
    segmenter: &Segmenter,
    strategy: Strategy,
) -> Assembly {
    let mut builder = CatalogBuilder::new();
    let mut published = Vec::new();
    let mut name_collisions = Vec::new();

    for index in reconciliation.winners() {
        let document = &documents[index];
        let segmentation = segmenter.segment_outcome(&outcome_of(document), strategy);
        match builder.accept(document, segmentation) {
            Some(id) => {
                info!(
                    id,
                    name = %document.display_name,
                    file = %document.file_name,
                    "catalog entry accepted"
                );
                published.push(index);
            }
            None => {
                warn!(
                    name = %document.display_name,
                    file = %document.file_name,
                    "name already in catalog, skipping"
                );
                name_collisions.push(index);
            }
        }
    }

    Assembly {
        entries: builder.finish(),
        published,
        name_collisions,
    }
}

pub fn publish_documents(
    documents: &[SourceDocument],
    published: &[usize],
    docs_dir: &Path,
) -> Result<usize> {
    ensure_directory(docs_dir)?;

    let mut copied = 0usize;
    for &index in published {
        let document = &documents[index];
        let destination = docs_dir.join(&document.file_name);
        fs::copy(&document.path, &destination).with_context(|| {
            format!(
                "failed to copy {} to {}",
                document.path.display(),
                destination.display()
            )
        })?;
        copied += 1;
    }

    info!(docs_dir = %docs_dir.display(), copied, "published documents");
    Ok(copied)
}

pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    crate::util::read_json(path)
}
