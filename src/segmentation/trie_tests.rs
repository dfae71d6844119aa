#[cfg(test)]
mod tests {
    use crate::{
        core::Token,
        segmentation::trie::{
            UnmatchedToken,
            WordTrie,
        },
    };

    fn toks(s: &str) -> Vec<Token> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn dictionary() -> WordTrie<&'static str> {
        let words = [
            ("は", "は"),
            ("これ", "此れ"),
            ("この", "此の"),
            ("その", "其の"),
            ("カメラ", "カメラ"),
            ("通じる", "通ずる"),
            ("を通じて", "を 通ずる て"),
        ];
        WordTrie::build(words.into_iter().map(|(spec, tokens)| (toks(tokens), spec)))
    }

    fn unmatched(run: usize, position: usize, token: &str) -> UnmatchedToken<'_> {
        UnmatchedToken { run, position, token }
    }

    #[test]
    fn test_phrase_and_its_inner_word_both_match() {
        let trie = dictionary();
        let runs = vec![toks("千尋 は 此の 黒い カメラ を 通ずる て")];
        let found = trie.find(&runs);

        let matched: Vec<&str> = found.matched.iter().map(|w| **w).collect();
        assert_eq!(matched, vec!["は", "この", "カメラ", "通じる", "を通じて"]);
        assert_eq!(found.unmatched, vec![unmatched(0, 0, "千尋"), unmatched(0, 3, "黒い")]);
    }

    #[test]
    fn test_incomplete_phrase_leaves_tokens_unmatched() {
        let trie = dictionary();
        let runs = vec![toks("千尋 は 此の 黒い カメラ を 食べる")];
        let found = trie.find(&runs);

        let matched: Vec<&str> = found.matched.iter().map(|w| **w).collect();
        assert_eq!(matched, vec!["は", "この", "カメラ"]);
        assert_eq!(
            found.unmatched,
            vec![
                unmatched(0, 0, "千尋"),
                unmatched(0, 3, "黒い"),
                unmatched(0, 5, "を"),
                unmatched(0, 6, "食べる"),
            ]
        );
    }

    #[test]
    fn test_shorter_word_survives_longer_insert_in_either_order() {
        for reversed in [false, true] {
            let mut entries = vec![(toks("を"), "を"), (toks("を 通ずる て"), "を通じて")];
            if reversed {
                entries.reverse();
            }
            let trie = WordTrie::build(entries);
            assert_eq!(trie.len(), 2);

            let runs = vec![toks("を 通ずる て")];
            let mut matched: Vec<&str> = trie.find(&runs).matched.iter().map(|w| **w).collect();
            matched.sort_unstable();
            assert_eq!(matched, vec!["を", "を通じて"]);
        }
    }

    #[test]
    fn test_no_match_across_runs() {
        let trie = dictionary();
        let runs = vec![toks("を"), toks("通ずる て")];
        let found = trie.find(&runs);

        let matched: Vec<&str> = found.matched.iter().map(|w| **w).collect();
        assert_eq!(matched, vec!["通じる"]);
        assert_eq!(found.unmatched, vec![unmatched(0, 0, "を"), unmatched(1, 1, "て")]);
    }

    #[test]
    fn test_empty_trie_matches_nothing() {
        let trie: WordTrie<u64> = WordTrie::build(Vec::new());
        assert!(trie.is_empty());

        let runs = vec![toks("猫 が いる"), Vec::new()];
        let found = trie.find(&runs);
        assert!(found.matched.is_empty());
        assert_eq!(found.unmatched.len(), 3);
    }

    #[test]
    fn test_repeated_word_is_reported_each_time() {
        let trie = dictionary();
        let runs = vec![toks("カメラ と カメラ")];
        let found = trie.find(&runs);

        assert_eq!(found.matched.len(), 2);
        assert_eq!(found.unmatched, vec![unmatched(0, 1, "と")]);
    }
}
