pub mod trie;

pub use trie::{
    FindResult,
    UnmatchedToken,
    WordTrie,
};

#[cfg(test)]
mod trie_tests;
