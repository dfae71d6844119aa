use std::collections::HashMap;

use crate::core::{
    ContigTokenization,
    Token,
};

struct TrieNode<W> {
    words: Vec<W>,
    children: HashMap<Token, TrieNode<W>>,
}

impl<W> Default for TrieNode<W> {
    fn default() -> Self {
        Self { words: Vec::new(), children: HashMap::new() }
    }
}

/// Prefix tree over token sequences. Every node on a path can carry words, so
/// a single-token word and a longer phrase starting with it coexist.
pub struct WordTrie<W> {
    root: TrieNode<W>,
    len: usize,
}

impl<W> Default for WordTrie<W> {
    fn default() -> Self {
        Self { root: TrieNode::default(), len: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmatchedToken<'t> {
    pub run: usize,
    pub position: usize,
    pub token: &'t str,
}

#[derive(Debug)]
pub struct FindResult<'a, 't, W> {
    /// In the order their last token was reached; a word found twice is listed twice.
    pub matched: Vec<&'a W>,
    pub unmatched: Vec<UnmatchedToken<'t>>,
}

impl<W> WordTrie<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(words: impl IntoIterator<Item = (Vec<Token>, W)>) -> Self {
        let mut trie = Self::new();
        for (tokens, word) in words {
            trie.insert(&tokens, word);
        }
        trie
    }

    /// Words with no tokens can never match and are dropped.
    pub fn insert(&mut self, tokens: &[Token], word: W) {
        if tokens.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for token in tokens {
            node = node.children.entry(token.clone()).or_default();
        }
        node.words.push(word);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Matches each run on its own; no phrase spans two runs.
    pub fn find<'a, 't>(&'a self, runs: &'t [ContigTokenization]) -> FindResult<'a, 't, W> {
        let mut result = FindResult { matched: Vec::new(), unmatched: Vec::new() };
        for (run, tokens) in runs.iter().enumerate() {
            self.find_in_run(run, tokens, &mut result);
        }
        result
    }

    fn find_in_run<'a, 't>(
        &'a self,
        run: usize,
        tokens: &'t [Token],
        result: &mut FindResult<'a, 't, W>,
    ) {
        let mut covered = vec![false; tokens.len()];
        // (node reached, position of the first token on the path)
        let mut partials: Vec<(&TrieNode<W>, usize)> = vec![(&self.root, 0)];

        for (position, token) in tokens.iter().enumerate() {
            let mut advanced = Vec::with_capacity(partials.len() + 1);

            for (node, start) in partials {
                if let Some(child) = node.children.get(token.as_str()) {
                    if !child.words.is_empty() {
                        result.matched.extend(child.words.iter());
                        covered[start..=position].iter_mut().for_each(|c| *c = true);
                    }
                    advanced.push((child, start));
                }
            }

            advanced.push((&self.root, position + 1));
            partials = advanced;
        }

        result.unmatched.extend(
            tokens
                .iter()
                .enumerate()
                .filter(|(position, _)| !covered[*position])
                .map(|(position, token)| UnmatchedToken { run, position, token: token.as_str() }),
        );
    }
}
