use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::info;

use crate::cli::GroupingMode;
use crate::model::{
    ApprovedFile, LowContentFile, ManifestThresholds, MatchReason, Origin, ReconciliationManifest,
    RedundantFile, SourceDocument, TextStatus,
};
use crate::similarity::{DEFAULT_MIN_TOKEN_CHARS, jaccard, normalize, word_set};
use crate::util::now_utc_string;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub similarity_threshold: f64,
    pub min_token_chars: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub members: Vec<usize>,
    pub representative: usize,
}

impl DuplicateGroup {
    pub fn redundant(&self) -> impl Iterator<Item = usize> + '_ {
        self.members
            .iter()
            .copied()
            .filter(move |member| *member != self.representative)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub groups: Vec<DuplicateGroup>,
}

impl Reconciliation {
    pub fn winners(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.iter().map(|group| group.representative)
    }

    pub fn redundant_count(&self) -> usize {
        self.groups.iter().map(|group| group.members.len() - 1).sum()
    }
}

struct Matcher<'a> {
    documents: &'a [SourceDocument],
    names: Vec<String>,
    word_sets: Vec<HashSet<String>>,
    options: MatchOptions,
}

impl<'a> Matcher<'a> {
    fn new(documents: &'a [SourceDocument], options: MatchOptions) -> Self {
        Self {
            names: documents
                .iter()
                .map(|document| normalize(&document.display_name))
                .collect(),
            word_sets: documents
                .iter()
                .map(|document| word_set(&document.text, options.min_token_chars))
                .collect(),
            documents,
            options,
        }
    }

    fn similarity(&self, left: usize, right: usize) -> f64 {
        jaccard(&self.word_sets[left], &self.word_sets[right])
    }

    fn match_reason(&self, left: usize, right: usize) -> Option<MatchReason> {
        if !self.names[left].is_empty() && self.names[left] == self.names[right] {
            return Some(MatchReason::Name);
        }

        let similarity = self.similarity(left, right);
        if similarity >= self.options.similarity_threshold {
            return Some(MatchReason::Content { similarity });
        }
        None
    }

    fn log_match(&self, left: usize, right: usize, reason: &MatchReason) {
        info!(
            left = %self.documents[left].file_name,
            right = %self.documents[right].file_name,
            reason = ?reason,
            "duplicate match"
        );
    }
}

pub fn reconcile(
    documents: &[SourceDocument],
    options: MatchOptions,
    mode: GroupingMode,
) -> Reconciliation {
    let matcher = Matcher::new(documents, options);
    let member_sets = match mode {
        GroupingMode::UnionFind => group_union_find(&matcher),
        GroupingMode::Greedy => group_greedy(&matcher),
    };

    let groups = member_sets
        .into_iter()
        .map(|members| DuplicateGroup {
            representative: select_representative(documents, &members),
            members,
        })
        .collect::<Vec<DuplicateGroup>>();

    let reconciliation = Reconciliation { groups };
    info!(
        documents = documents.len(),
        groups = reconciliation.groups.len(),
        redundant = reconciliation.redundant_count(),
        grouping = mode.as_str(),
        "reconciliation complete"
    );
    reconciliation
}

fn group_greedy(matcher: &Matcher<'_>) -> Vec<Vec<usize>> {
    let count = matcher.documents.len();
    let mut used = vec![false; count];
    let mut groups = Vec::new();

    for seed in 0..count {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut members = vec![seed];

        for other in (seed + 1)..count {
            if used[other] {
                continue;
            }
            if let Some(reason) = matcher.match_reason(seed, other) {
                matcher.log_match(seed, other, &reason);
                used[other] = true;
                members.push(other);
            }
        }
        groups.push(members);
    }

    groups
}

fn group_union_find(matcher: &Matcher<'_>) -> Vec<Vec<usize>> {
    let count = matcher.documents.len();
    let mut sets = DisjointSet::new(count);

    for left in 0..count {
        for right in (left + 1)..count {
            if let Some(reason) = matcher.match_reason(left, right) {
                matcher.log_match(left, right, &reason);
                sets.union(left, right);
            }
        }
    }

    let mut by_root = BTreeMap::<usize, Vec<usize>>::new();
    for index in 0..count {
        by_root.entry(sets.find(index)).or_default().push(index);
    }

    let mut groups = by_root.into_values().collect::<Vec<Vec<usize>>>();
    groups.sort_by_key(|members| members[0]);
    groups
}

pub fn select_representative(documents: &[SourceDocument], members: &[usize]) -> usize {
    let mut best = members[0];
    for &candidate in &members[1..] {
        if outranks(&documents[candidate], &documents[best]) {
            best = candidate;
        }
    }
    best
}

fn outranks(candidate: &SourceDocument, incumbent: &SourceDocument) -> bool {
    if candidate.origin != incumbent.origin {
        return candidate.origin == Origin::New;
    }
    candidate.normalized_text.len() > incumbent.normalized_text.len()
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut current = index;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) {
        let left_root = self.find(left);
        let right_root = self.find(right);
        if left_root == right_root {
            return;
        }

        match self.rank[left_root].cmp(&self.rank[right_root]) {
            std::cmp::Ordering::Less => self.parent[left_root] = right_root,
            std::cmp::Ordering::Greater => self.parent[right_root] = left_root,
            std::cmp::Ordering::Equal => {
                self.parent[right_root] = left_root;
                self.rank[left_root] += 1;
            }
        }
    }
}

pub fn build_manifest(
    documents: &[SourceDocument],
    reconciliation: &Reconciliation,
    old_dir: &Path,
    new_dir: &Path,
    options: MatchOptions,
    mode: GroupingMode,
    low_content_chars: usize,
) -> ReconciliationManifest {
    let matcher = Matcher::new(documents, options);

    let approved = reconciliation
        .winners()
        .map(|index| {
            let document = &documents[index];
            ApprovedFile {
                path: document.path.display().to_string(),
                name: document.display_name.clone(),
                file_name: document.file_name.clone(),
                origin: document.origin,
                sha256: document.sha256.clone(),
                text_status: document.status,
                normalized_chars: document.normalized_text.len(),
            }
        })
        .collect();

    let mut redundant = Vec::new();
    for group in &reconciliation.groups {
        let kept = &documents[group.representative];
        for member in group.redundant() {
            let document = &documents[member];
            redundant.push(RedundantFile {
                path: document.path.display().to_string(),
                file_name: document.file_name.clone(),
                origin: document.origin,
                kept_file_name: kept.file_name.clone(),
                kept_origin: kept.origin,
                reason: matcher
                    .match_reason(group.representative, member)
                    .unwrap_or(MatchReason::Transitive),
            });
        }
    }

    let low_content = documents
        .iter()
        .filter(|document| document.status != TextStatus::Content)
        .map(|document| LowContentFile {
            path: document.path.display().to_string(),
            file_name: document.file_name.clone(),
            origin: document.origin,
            text_status: document.status,
            normalized_chars: document.normalized_text.len(),
        })
        .collect();

    ReconciliationManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        old_dir: old_dir.display().to_string(),
        new_dir: new_dir.display().to_string(),
        scanned_count: documents.len(),
        group_count: reconciliation.groups.len(),
        thresholds: ManifestThresholds {
            similarity_threshold: options.similarity_threshold,
            min_token_chars: options.min_token_chars,
            low_content_chars,
            grouping: mode.as_str().to_string(),
        },
        approved,
        redundant,
        low_content,
    }
}
