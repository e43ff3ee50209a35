use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::reconcile::MatchOptions;
use crate::segment::SegmentOptions;

#[derive(Parser, Debug)]
#[command(
    name = "checklist-catalog",
    version,
    about = "Service checklist catalog extraction, reconciliation and verification tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Analyze(AnalyzeArgs),
    Generate(GenerateArgs),
    Verify(VerifyArgs),
    Repair(RepairArgs),
    SyncDb(SyncDbArgs),
    AuditDb(AuditDbArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long)]
    pub old_dir: Option<PathBuf>,

    #[arg(long)]
    pub new_dir: Option<PathBuf>,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long)]
    pub docs_dir: Option<PathBuf>,

    #[arg(long)]
    pub cache_root: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ThresholdArgs {
    #[arg(long, default_value_t = crate::reconcile::DEFAULT_SIMILARITY_THRESHOLD)]
    pub similarity_threshold: f64,

    #[arg(long, default_value_t = crate::segment::DEFAULT_HEADER_MAX_CHARS)]
    pub header_max_chars: usize,

    #[arg(long, default_value_t = crate::segment::DEFAULT_MIN_LINE_CHARS)]
    pub min_line_chars: usize,

    #[arg(long, default_value_t = crate::segment::DEFAULT_MIN_ITEM_CHARS)]
    pub min_item_chars: usize,

    #[arg(long, default_value_t = crate::pdf_text::DEFAULT_LOW_CONTENT_CHARS)]
    pub low_content_chars: usize,

    #[arg(long, default_value_t = crate::similarity::DEFAULT_MIN_TOKEN_CHARS)]
    pub min_token_chars: usize,
}

impl ThresholdArgs {
    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            header_max_chars: self.header_max_chars,
            min_line_chars: self.min_line_chars,
            min_item_chars: self.min_item_chars,
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            similarity_threshold: self.similarity_threshold,
            min_token_chars: self.min_token_chars,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Strategy {
    Naive,
    Sectioned,
    SmartMerge,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::Sectioned => "sectioned",
            Self::SmartMerge => "smart-merge",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum GroupingMode {
    UnionFind,
    Greedy,
}

impl GroupingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnionFind => "union-find",
            Self::Greedy => "greedy",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long, value_enum, default_value_t = Strategy::Sectioned)]
    pub strategy: Strategy,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GroupingMode::UnionFind)]
    pub grouping: GroupingMode,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Strategy::Sectioned)]
    pub strategy: Strategy,

    #[arg(long, value_enum, default_value_t = GroupingMode::UnionFind)]
    pub grouping: GroupingMode,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = crate::commands::verify::DEFAULT_FAIL_BELOW)]
    pub fail_below: f64,

    #[arg(long, default_value_t = crate::commands::verify::DEFAULT_WARN_BELOW)]
    pub warn_below: f64,

    #[arg(long, default_value_t = crate::pdf_text::DEFAULT_LOW_CONTENT_CHARS)]
    pub low_content_chars: usize,
}

#[derive(Args, Debug, Clone)]
pub struct RepairArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(long)]
    pub report: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SyncDbArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AuditDbArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
}
