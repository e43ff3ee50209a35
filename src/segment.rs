use anyhow::{Context, Result};
use regex::Regex;

use crate::cli::Strategy;
use crate::model::{CHECKLIST_CARD_TITLE, ContentCard};
use crate::pdf_text::TextOutcome;

pub const DEFAULT_HEADER_MAX_CHARS: usize = 80;
pub const DEFAULT_MIN_LINE_CHARS: usize = 3;
pub const DEFAULT_MIN_ITEM_CHARS: usize = 2;

pub const FALLBACK_TITLE: &str = "Details";
pub const FALLBACK_ITEM: &str = "Please refer to the document.";
pub const UNREADABLE_TITLE: &str = "Error";
pub const UNREADABLE_ITEM: &str = "Failed to parse document.";
const LINE_DUMP_TITLE: &str = "Document Requirements";
const LINE_DUMP_MIN_CHARS: usize = 6;
const NAIVE_MIN_CHARS: usize = 3;

const ICON_LIST: &str = "List";
const ICON_SECTION: &str = "Folder";
const ICON_FALLBACK: &str = "AlertCircle";
const ICON_ERROR: &str = "AlertTriangle";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    pub header_max_chars: usize,
    pub min_line_chars: usize,
    pub min_item_chars: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            header_max_chars: DEFAULT_HEADER_MAX_CHARS,
            min_line_chars: DEFAULT_MIN_LINE_CHARS,
            min_item_chars: DEFAULT_MIN_ITEM_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Discard,
    Header(String),
    Item(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub cards: Vec<ContentCard>,
    pub items_found: bool,
}

pub struct Segmenter {
    options: SegmentOptions,
    page_footer: Regex,
    bullet_prefix: Regex,
    numeric_only: Regex,
}

impl Segmenter {
    pub fn new(options: SegmentOptions) -> Result<Self> {
        Ok(Self {
            options,
            page_footer: Regex::new(r"(?i)--\s*\d+\s*of\s*\d+\s*--|page\s*\d+")
                .context("failed to compile page footer regex")?,
            bullet_prefix: Regex::new(r"^(?:\d+[.)]|[•\-*\x{F0D8}])\s*")
                .context("failed to compile bullet prefix regex")?,
            numeric_only: Regex::new(r"^\d+$").context("failed to compile numeric regex")?,
        })
    }

    pub fn classify_line(&self, raw_line: &str) -> LineClass {
        let line = raw_line.trim();
        if line.is_empty()
            || line.chars().count() < self.options.min_line_chars
            || self.page_footer.is_match(line)
            || self.numeric_only.is_match(line)
        {
            return LineClass::Discard;
        }

        let has_bullet = self.bullet_prefix.is_match(line);
        let is_header = line.ends_with(':')
            || (is_upper_case(line)
                && line.chars().count() < self.options.header_max_chars
                && !has_bullet);

        if is_header {
            let title = title_case(line.trim_end_matches(':').trim());
            if title.is_empty() {
                return LineClass::Discard;
            }
            return LineClass::Header(title);
        }

        let item = self.bullet_prefix.replace(line, "").trim().to_string();
        if item.chars().count() < self.options.min_item_chars {
            return LineClass::Discard;
        }
        LineClass::Item(item)
    }

    pub fn sections(&self, text: &str) -> Vec<ContentCard> {
        let mut sections = Vec::new();
        let mut current = ContentCard::list(CHECKLIST_CARD_TITLE, Vec::new(), ICON_LIST);

        for line in text.lines() {
            match self.classify_line(line) {
                LineClass::Discard => {}
                LineClass::Header(title) => {
                    let finished = std::mem::replace(
                        &mut current,
                        ContentCard::list(title, Vec::new(), ICON_SECTION),
                    );
                    if !finished.items.is_empty() {
                        sections.push(finished);
                    }
                }
                LineClass::Item(item) => current.items.push(item),
            }
        }

        if !current.items.is_empty() {
            sections.push(current);
        }
        sections
    }

    pub fn segment(&self, text: &str, strategy: Strategy) -> Segmentation {
        let cards = match strategy {
            Strategy::Naive => self.naive_cards(text),
            Strategy::Sectioned => self.sections(text),
            Strategy::SmartMerge => {
                let sections = self.sections(text);
                if sections.is_empty() {
                    self.line_dump(text)
                } else {
                    sections
                }
            }
        };

        if cards.is_empty() {
            return fallback();
        }
        Segmentation {
            cards,
            items_found: true,
        }
    }

    pub fn segment_outcome(&self, outcome: &TextOutcome, strategy: Strategy) -> Segmentation {
        match outcome {
            TextOutcome::Content(text) => self.segment(text, strategy),
            TextOutcome::LowContent { .. } => fallback(),
            TextOutcome::Unreadable(_) => Segmentation {
                cards: vec![ContentCard::list(
                    UNREADABLE_TITLE,
                    vec![UNREADABLE_ITEM.to_string()],
                    ICON_ERROR,
                )],
                items_found: false,
            },
        }
    }

    fn naive_cards(&self, text: &str) -> Vec<ContentCard> {
        let items = text
            .lines()
            .map(str::trim)
            .filter(|line| {
                line.chars().count() >= NAIVE_MIN_CHARS
                    && !line.to_lowercase().contains("page")
                    && !self.numeric_only.is_match(line)
            })
            .map(ToOwned::to_owned)
            .collect::<Vec<String>>();

        if items.is_empty() {
            return Vec::new();
        }
        vec![ContentCard::list(CHECKLIST_CARD_TITLE, items, ICON_LIST)]
    }

    fn line_dump(&self, text: &str) -> Vec<ContentCard> {
        let cleaned = self.page_footer.replace_all(text, "");
        let lines = cleaned
            .lines()
            .map(str::trim)
            .filter(|line| line.chars().count() >= LINE_DUMP_MIN_CHARS)
            .map(ToOwned::to_owned)
            .collect::<Vec<String>>();

        if lines.is_empty() {
            return Vec::new();
        }
        vec![ContentCard::list(LINE_DUMP_TITLE, lines, ICON_LIST)]
    }
}

pub fn fallback() -> Segmentation {
    Segmentation {
        cards: vec![ContentCard::list(
            FALLBACK_TITLE,
            vec![FALLBACK_ITEM.to_string()],
            ICON_FALLBACK,
        )],
        items_found: false,
    }
}

pub fn is_thin(cards: &[ContentCard]) -> bool {
    let Some(first) = cards.iter().find(|card| !card.is_download()) else {
        return true;
    };
    let placeholder = first
        .items
        .first()
        .map(|item| item == FALLBACK_ITEM || item == UNREADABLE_ITEM)
        .unwrap_or(true);
    placeholder || first.items.len() < 2
}

fn is_upper_case(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
