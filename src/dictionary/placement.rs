use rand::{
    seq::IndexedRandom,
    Rng,
};

use super::ordering::VocabularyOrdering;

const FIRST_LEVEL_SPAN: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementLevel {
    pub begin_rank: usize,
    pub end_rank: usize,
    pub words: Vec<String>,
}

/// Level begin ranks: 0, 250, 500, 1000, 2000, ... below `len`.
pub fn level_begin_ranks(len: usize) -> Vec<usize> {
    let mut begins = Vec::new();
    if len == 0 {
        return begins;
    }
    begins.push(0);
    let mut begin = FIRST_LEVEL_SPAN;
    while begin < len {
        begins.push(begin);
        begin *= 2;
    }
    begins
}

/// Samples up to `words_per_level` distinct words from each level's rank range.
pub fn placement_test<R: Rng + ?Sized>(
    ordering: &VocabularyOrdering,
    rng: &mut R,
    words_per_level: usize,
) -> Vec<PlacementLevel> {
    let begins = level_begin_ranks(ordering.len());

    begins
        .iter()
        .enumerate()
        .map(|(i, &begin_rank)| {
            let end_rank = begins.get(i + 1).copied().unwrap_or(ordering.len());
            let ranks: Vec<usize> = (begin_rank..end_rank).collect();
            let mut picked: Vec<usize> =
                ranks.choose_multiple(rng, words_per_level).copied().collect();
            picked.sort_unstable();

            let words = picked
                .into_iter()
                .filter_map(|rank| ordering.get(rank).map(|w| w.spec.clone()))
                .collect();
            PlacementLevel { begin_rank, end_rank, words }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{
        rngs::StdRng,
        SeedableRng,
    };

    use super::*;
    use crate::dictionary::{
        denylist::Denylist,
        ordering::OrderedWord,
    };

    fn ordering(len: usize) -> VocabularyOrdering {
        let words = (0..len).map(|i| OrderedWord { spec: format!("w{}", i), tokens: vec![format!("w{}", i)] });
        VocabularyOrdering::new(words, &Denylist::from_terms(vec![]))
    }

    #[test]
    fn test_level_begins_double() {
        assert_eq!(level_begin_ranks(0), Vec::<usize>::new());
        assert_eq!(level_begin_ranks(100), vec![0]);
        assert_eq!(level_begin_ranks(1001), vec![0, 250, 500, 1000]);
        assert_eq!(level_begin_ranks(4000), vec![0, 250, 500, 1000, 2000]);
    }

    #[test]
    fn test_placement_words_come_from_their_level() {
        let ordering = ordering(1200);
        let mut rng = StdRng::seed_from_u64(7);
        let levels = placement_test(&ordering, &mut rng, 8);

        assert_eq!(levels.len(), 4);
        assert_eq!(levels[3].end_rank, 1200);
        for level in &levels {
            assert_eq!(level.words.len(), 8);
            for word in &level.words {
                let rank = ordering.rank_of(word).unwrap();
                assert!(rank >= level.begin_rank && rank < level.end_rank);
            }
        }
    }

    #[test]
    fn test_short_level_returns_what_it_has() {
        let levels = placement_test(&ordering(3), &mut StdRng::seed_from_u64(1), 10);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].words, vec!["w0", "w1", "w2"]);
    }
}
