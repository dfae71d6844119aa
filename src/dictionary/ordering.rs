use std::{
    collections::HashMap,
    fs,
    path::Path,
};

use log::{
    info,
    warn,
};

use super::denylist::Denylist;
use crate::core::{
    TankyuError,
    Token,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedWord {
    pub spec: String,
    pub tokens: Vec<Token>,
}

/// Vocabulary ranked from common to rare. A word's rank is its index.
#[derive(Debug, Default)]
pub struct VocabularyOrdering {
    words: Vec<OrderedWord>,
    rank_by_spec: HashMap<String, usize>,
}

impl VocabularyOrdering {
    pub fn new(entries: impl IntoIterator<Item = OrderedWord>, denylist: &Denylist) -> Self {
        let mut ordering = Self::default();
        for entry in entries {
            if denylist.contains(&entry.spec) || ordering.rank_by_spec.contains_key(&entry.spec) {
                continue;
            }
            ordering.rank_by_spec.insert(entry.spec.clone(), ordering.words.len());
            ordering.words.push(entry);
        }
        ordering
    }

    pub fn load(path: &Path, denylist: &Denylist) -> Result<Self, TankyuError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TankyuError::Custom(format!("Failed to read ordering {}: {}", path.display(), e))
        })?;
        let ordering = Self::parse(&content, denylist);
        info!("Loaded {} ranked words from {}", ordering.len(), path.display());
        Ok(ordering)
    }

    /// One entry per line: `spec`, or `spec<TAB>tok|tok|...` for phrases whose
    /// tokens differ from the spec. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str, denylist: &Denylist) -> Self {
        let entries = content.lines().enumerate().filter_map(|(line_no, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }

            let (spec, tokens) = match line.split_once('\t') {
                Some((spec, tokens)) => {
                    let tokens: Vec<Token> = tokens
                        .split('|')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect();
                    (spec.trim(), tokens)
                }
                None => (line, vec![line.to_string()]),
            };

            if spec.is_empty() || tokens.is_empty() {
                warn!("Skipping malformed ordering line {}: {:?}", line_no + 1, line);
                return None;
            }
            Some(OrderedWord { spec: spec.to_string(), tokens })
        });

        Self::new(entries, denylist)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, rank: usize) -> Option<&OrderedWord> {
        self.words.get(rank)
    }

    pub fn rank_of(&self, spec: &str) -> Option<usize> {
        self.rank_by_spec.get(spec).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &OrderedWord)> {
        self.words.iter().enumerate()
    }
}
